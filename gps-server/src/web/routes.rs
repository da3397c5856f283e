//! JSON route handlers.
//!
//! `/get_coords` is the map's poll target; its body shape is fixed by the
//! page script (see `gps_core::snapshot`).

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::listener::IngestCounters;
use crate::web::AppState;

#[derive(Serialize)]
struct StatsBody {
    #[serde(flatten)]
    counters: IngestCounters,
    history_len: usize,
    history_capacity: usize,
}

/// GET /get_coords: latest fix plus trail, oldest first.
pub async fn get_coords(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.get_snapshot())
}

/// GET /api/stats: ingest counters and history fill.
pub async fn api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatsBody {
        counters: state.stats.counters(),
        history_len: state.history.len(),
        history_capacity: state.history.capacity(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use gps_core::{Fix, HistoryStore};

    use crate::listener::IngestStats;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(HistoryStore::new()),
            Arc::new(IngestStats::default()),
        ))
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> Value {
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_get_coords_empty() {
        let json = get_json(test_state(), "/get_coords").await;
        assert_eq!(json, json!({"lat": 0, "lng": 0, "sats": 0}));
    }

    #[tokio::test]
    async fn test_get_coords_with_history() {
        let state = test_state();
        state.history.push(Fix::new(37.422, -122.084, 8));
        state.history.push(Fix::new(37.423, -122.085, 9));

        let json = get_json(state, "/get_coords").await;
        assert_eq!(
            json,
            json!({
                "lat": 37.423,
                "lng": -122.085,
                "sats": 9,
                "history": [
                    {"lat": 37.422, "lng": -122.084},
                    {"lat": 37.423, "lng": -122.085},
                ],
            })
        );
    }

    #[tokio::test]
    async fn test_get_coords_history_bounded() {
        let state = test_state();
        for i in 0..60 {
            state.history.push(Fix::new(i as f64, i as f64, i));
        }

        let json = get_json(state, "/get_coords").await;
        let history = json["history"].as_array().unwrap();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0]["lat"], 10.0);
        assert_eq!(json["sats"], 59);
    }

    #[tokio::test]
    async fn test_get_coords_is_read_only() {
        let state = test_state();
        state.history.push(Fix::new(1.0, 2.0, 3));
        get_json(Arc::clone(&state), "/get_coords").await;
        get_json(Arc::clone(&state), "/get_coords").await;
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_api_stats() {
        let state = test_state();
        state.history.push(Fix::new(1.0, 2.0, 3));

        let json = get_json(state, "/api/stats").await;
        assert_eq!(
            json,
            json!({
                "connections_accepted": 0,
                "connections_open": 0,
                "messages": 0,
                "fixes": 0,
                "malformed": 0,
                "history_len": 1,
                "history_capacity": 50,
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = crate::web::build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
