//! gps-core: Pure telemetry parsing + fix history for a single GPS device.
//!
//! No async, no sockets, just the data path. This crate is the shared core
//! used by both `gps-server` (device listener + web server) and `gps-feeder`
//! (device stand-in).

pub mod config;
pub mod framing;
pub mod history;
pub mod snapshot;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use framing::{Framing, LineFramer};
pub use history::{HistoryStore, DEFAULT_CAPACITY};
pub use snapshot::Snapshot;
pub use telemetry::{format_fix, parse};
pub use types::*;
