//! HTML page handler, serves the live map.
//!
//! The page body is embedded at compile time via `include_str!` and wrapped
//! in a minimal document with the Leaflet stylesheet.

use axum::response::Html;

const BASE_CSS: &str = r#"* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: Arial, sans-serif; background-color: #2f2f2f; color: #ffffff; height: 100vh; }
#map { height: 100vh; }
.info-panel { position: absolute; top: 20px; right: 20px; background: rgba(0, 0, 0, 0.6); color: white; padding: 20px; z-index: 1000; border-radius: 8px; box-shadow: 0 0 15px rgba(0, 0, 0, 0.7); }
h3 { font-size: 20px; margin-bottom: 10px; }
#sat-info, #coord-info { font-size: 16px; }
#coord-info { margin-top: 5px; }"#;

fn render_page(title: &str, body: &str) -> Html<String> {
    let mut s = String::with_capacity(body.len() + BASE_CSS.len() + 512);
    s.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    s.push_str("<meta charset=\"UTF-8\">\n");
    s.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    s.push_str("<title>");
    s.push_str(title);
    s.push_str("</title>\n");
    s.push_str("<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\" />\n");
    s.push_str("<style>\n");
    s.push_str(BASE_CSS);
    s.push_str("\n</style>\n");
    s.push_str("</head>\n<body>\n");
    s.push_str(body);
    s.push_str("\n</body>\n</html>");
    Html(s)
}

/// GET /: live map page, polls `/get_coords`.
pub async fn page_map() -> Html<String> {
    render_page("Live GPS Tracker", include_str!("../../templates/map.html"))
}
