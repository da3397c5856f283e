//! Synthetic telemetry sources.
//!
//! - `clean_line`: filter a replay file down to sendable messages
//! - `circle_track`: fixes evenly spaced on a circle around a center point

use gps_core::Fix;

/// Meters per degree of latitude (spherical Earth).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Extract a sendable message from a replay file line.
///
/// Skips blank lines and `#` comments; does not validate the message, so
/// malformed lines can be replayed deliberately.
pub fn clean_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line)
}

/// `count` fixes walking once around a circle of `radius_m` meters.
pub fn circle_track(center: Fix, radius_m: f64, count: usize) -> Vec<Fix> {
    let lat_rad = center.latitude.to_radians();
    let meters_per_deg_lng = (METERS_PER_DEG_LAT * lat_rad.cos()).max(1e-6);

    (0..count)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / count.max(1) as f64;
            Fix {
                latitude: center.latitude + radius_m * theta.cos() / METERS_PER_DEG_LAT,
                longitude: center.longitude + radius_m * theta.sin() / meters_per_deg_lng,
                satellite_count: center.satellite_count,
            }
        })
        .collect()
}
