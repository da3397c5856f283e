//! Point-in-time view of the fix history, shaped for the map poller.
//!
//! Serialized form:
//! - with history: `{"lat": f64, "lng": f64, "sats": int, "history": [{"lat", "lng"}, ...]}`
//! - empty:        `{"lat": 0, "lng": 0, "sats": 0}` (integer zeros, no `history` key)

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::Fix;

/// Latest fix plus the full history (oldest first) at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub latest: Fix,
    pub history: Vec<Fix>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[derive(serde::Serialize)]
struct TrailPoint {
    lat: f64,
    lng: f64,
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            let mut map = serializer.serialize_map(Some(3))?;
            map.serialize_entry("lat", &0)?;
            map.serialize_entry("lng", &0)?;
            map.serialize_entry("sats", &0)?;
            return map.end();
        }

        let trail: Vec<TrailPoint> = self
            .history
            .iter()
            .map(|f| TrailPoint {
                lat: f.latitude,
                lng: f.longitude,
            })
            .collect();

        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("lat", &self.latest.latitude)?;
        map.serialize_entry("lng", &self.latest.longitude)?;
        map.serialize_entry("sats", &self.latest.satellite_count)?;
        map.serialize_entry("history", &trail)?;
        map.end()
    }
}
