//! Device listener: accepts GPS device connections on the telemetry port.
//!
//! One task per connection. Each task reads the byte stream, splits it into
//! messages (see `gps_core::framing`), parses them, and pushes fixes into
//! the shared `HistoryStore`. Malformed messages are logged and dropped; I/O
//! errors end only the connection they occur on.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use gps_core::config::DeviceConfig;
use gps_core::framing::{Frame, Framing, LineFramer};
use gps_core::{telemetry, HistoryStore};

use crate::error::{self, Result};
use crate::shutdown::Shutdown;

/// Bytes requested per read, matching the device's message buffer.
const READ_BUFFER: usize = 1024;

/// Pause after a failed accept (e.g. fd exhaustion) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Options + counters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ListenerOptions {
    pub framing: Framing,
    pub flush_after: Duration,
    pub max_line: usize,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        ListenerOptions {
            framing: Framing::Lines,
            flush_after: Duration::from_millis(100),
            max_line: READ_BUFFER,
        }
    }
}

impl From<&DeviceConfig> for ListenerOptions {
    fn from(config: &DeviceConfig) -> Self {
        ListenerOptions {
            framing: config.framing,
            flush_after: Duration::from_millis(config.flush_ms),
            max_line: config.max_line,
        }
    }
}

/// Ingest counters, updated lock-free from every connection task.
#[derive(Debug, Default)]
pub struct IngestStats {
    connections_accepted: AtomicU64,
    connections_open: AtomicU64,
    messages: AtomicU64,
    fixes: AtomicU64,
    malformed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestCounters {
    pub connections_accepted: u64,
    pub connections_open: u64,
    pub messages: u64,
    pub fixes: u64,
    pub malformed: u64,
}

impl IngestStats {
    pub fn counters(&self) -> IngestCounters {
        IngestCounters {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_open: self.connections_open.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            fixes: self.fixes.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// Keeps `connections_open` accurate however the connection task ends.
struct OpenConnection {
    stats: Arc<IngestStats>,
}

impl OpenConnection {
    fn new(stats: Arc<IngestStats>) -> Self {
        stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
        stats.connections_open.fetch_add(1, Ordering::Relaxed);
        OpenConnection { stats }
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        self.stats.connections_open.fetch_sub(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Ingest sink
// ---------------------------------------------------------------------------

/// Everything a connection task needs, shared across all of them.
struct Ingest {
    history: Arc<HistoryStore>,
    stats: Arc<IngestStats>,
    options: ListenerOptions,
}

impl Ingest {
    /// Parse one message and push the fix. Never fails the connection.
    fn message(&self, peer: SocketAddr, raw: &[u8]) {
        self.stats.messages.fetch_add(1, Ordering::Relaxed);
        match telemetry::parse(raw) {
            Ok(fix) => {
                self.history.push(fix);
                self.stats.fixes.fetch_add(1, Ordering::Relaxed);
                info!(
                    %peer,
                    lat = fix.latitude,
                    lng = fix.longitude,
                    sats = fix.satellite_count,
                    "received fix"
                );
            }
            Err(e) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(%peer, error = %e, raw = %String::from_utf8_lossy(raw), "dropping telemetry");
            }
        }
    }

    fn frame(&self, peer: SocketAddr, frame: Frame) {
        match frame {
            Frame::Line(line) => self.message(peer, &line),
            Frame::Overflow(len) => {
                self.stats.messages.fetch_add(1, Ordering::Relaxed);
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(%peer, len, max = self.options.max_line, "dropping oversized telemetry");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

pub struct DeviceListener {
    listener: TcpListener,
    ingest: Arc<Ingest>,
}

impl DeviceListener {
    /// Bind the telemetry port. Failure here is fatal to the caller.
    pub async fn bind(
        addr: &str,
        options: ListenerOptions,
        history: Arc<HistoryStore>,
        stats: Arc<IngestStats>,
    ) -> Result<Self> {
        let listener = error::bind(addr).await?;
        Ok(DeviceListener {
            listener,
            ingest: Arc::new(Ingest {
                history,
                stats,
                options,
            }),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept device connections until shutdown, then wait for every
    /// connection task to close.
    pub async fn run(self, shutdown: Shutdown) {
        let mut connections = JoinSet::new();
        let mut stop = shutdown.clone();

        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, framing = %self.ingest.options.framing, "device listener waiting for connections");
        }

        loop {
            tokio::select! {
                _ = stop.wait() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "device connected");
                        let ingest = Arc::clone(&self.ingest);
                        let shutdown = shutdown.clone();
                        connections.spawn(async move {
                            let _open = OpenConnection::new(Arc::clone(&ingest.stats));
                            match handle_connection(stream, peer, &ingest, shutdown).await {
                                Ok(()) => info!(%peer, "device disconnected"),
                                Err(e) => warn!(%peer, error = %e, "device connection failed"),
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "connection task aborted");
                    }
                }
            }
        }

        info!(open = connections.len(), "device listener shutting down");
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "connection task aborted");
            }
        }
    }
}

/// Read one device connection until EOF, I/O error, or shutdown.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    ingest: &Ingest,
    mut shutdown: Shutdown,
) -> std::io::Result<()> {
    let options = ingest.options;
    let mut framer = LineFramer::new(options.max_line);
    let mut buf = [0u8; READ_BUFFER];

    loop {
        let flush_pending = options.framing == Framing::Lines && framer.has_partial();

        // None: idle with a partial line buffered.
        let read = tokio::select! {
            _ = shutdown.wait() => {
                debug!(%peer, "closing on shutdown");
                return Ok(());
            }
            read = async {
                if flush_pending {
                    tokio::time::timeout(options.flush_after, stream.read(&mut buf)).await.ok()
                } else {
                    Some(stream.read(&mut buf).await)
                }
            } => read,
        };

        match read {
            None => {
                debug!(%peer, "delivering unterminated message after idle");
                if let Some(line) = framer.flush() {
                    ingest.message(peer, &line);
                }
            }
            Some(Ok(0)) => {
                if let Some(line) = framer.flush() {
                    ingest.message(peer, &line);
                }
                return Ok(());
            }
            Some(Ok(n)) => match options.framing {
                Framing::PerRead => ingest.message(peer, &buf[..n]),
                Framing::Lines => {
                    for frame in framer.push(&buf[..n]) {
                        ingest.frame(peer, frame);
                    }
                }
            },
            Some(Err(e)) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
