//! Shared types and error enums for gps-core.

use thiserror::Error;

/// Why a telemetry message was rejected.
///
/// Rejected messages are dropped by the caller; they never mutate history
/// and never close the device connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("telemetry is not valid UTF-8")]
    Encoding,
    #[error("malformed telemetry: {0}")]
    Malformed(String),
}

/// Errors produced outside the per-message path (config, startup).
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

// ---------------------------------------------------------------------------
// Fix
// ---------------------------------------------------------------------------

/// One GPS reading as reported by the device.
///
/// Coordinates are decimal degrees and are not range-checked. The satellite
/// count is passed through as parsed, negative values included.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub satellite_count: i64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, satellite_count: i64) -> Self {
        Fix {
            latitude,
            longitude,
            satellite_count,
        }
    }

    /// The all-zero fix reported before any telemetry has arrived.
    pub const fn zero() -> Self {
        Fix {
            latitude: 0.0,
            longitude: 0.0,
            satellite_count: 0,
        }
    }
}
