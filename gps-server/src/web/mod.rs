//! Web server: axum HTTP service for the live map.
//!
//! Shared state is the fix history (written by the device listener, read
//! here) and the listener's ingest counters. Handlers only read.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gps_core::{HistoryStore, Snapshot};

use crate::listener::IngestStats;
use crate::shutdown::Shutdown;

pub mod pages;
pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub history: Arc<HistoryStore>,
    pub stats: Arc<IngestStats>,
}

impl AppState {
    pub fn new(history: Arc<HistoryStore>, stats: Arc<IngestStats>) -> Self {
        AppState { history, stats }
    }

    /// Latest fix + trail for the presentation layer. Never blocks on the
    /// device; returns the zero fix until telemetry arrives.
    pub fn get_snapshot(&self) -> Snapshot {
        self.history.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(pages::page_map))
        .route("/get_coords", get(routes::get_coords))
        .route("/api/stats", get(routes::api_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve HTTP on an already-bound listener until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: Shutdown,
) -> std::io::Result<()> {
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("GPS map listening on http://{addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}
