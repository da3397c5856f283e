//! gps-tracker: device listener + live map server for a single GPS device.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gps_core::config::{self, Config};
use gps_core::framing::Framing;
use gps_core::{telemetry, HistoryStore};

mod error;
mod listener;
mod shutdown;
mod web;

use crate::listener::{DeviceListener, IngestStats, ListenerOptions};

#[derive(Parser)]
#[command(name = "gps-tracker", version, about = "Live GPS device tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept device telemetry and serve the live map
    Serve {
        /// Config file (default: ~/.gps-tracker/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address for both the device port and the web server
        #[arg(long, env = "GPS_HOST")]
        host: Option<String>,

        /// Device telemetry port
        #[arg(long, env = "GPS_DEVICE_PORT")]
        device_port: Option<u16>,

        /// HTTP port for the map and /get_coords
        #[arg(long, env = "GPS_HTTP_PORT")]
        http_port: Option<u16>,

        /// Number of fixes kept in the trail
        #[arg(long)]
        capacity: Option<usize>,

        /// Message framing: "lines" or "per-read"
        #[arg(long)]
        framing: Option<Framing>,
    },

    /// Parse a file of telemetry lines and print the fixes
    Parse {
        /// Path to telemetry file (one message per line), or - for stdin
        file: PathBuf,
    },

    /// Show or initialise the config file
    Config {
        /// Write the default config to ~/.gps-tracker/config.yaml
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gps_tracker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config: config_path,
            host,
            device_port,
            http_port,
            capacity,
            framing,
        } => {
            let mut cfg = match config_path {
                Some(path) => config::read_config(&path).unwrap_or_else(|e| {
                    tracing::error!(error = %e, "cannot load config");
                    std::process::exit(1);
                }),
                None => config::load_config(),
            };
            if let Some(host) = host {
                cfg.device.host = host.clone();
                cfg.dashboard.host = host;
            }
            if let Some(port) = device_port {
                cfg.device.port = port;
            }
            if let Some(port) = http_port {
                cfg.dashboard.port = port;
            }
            if let Some(capacity) = capacity {
                cfg.history.capacity = capacity.max(1);
            }
            if let Some(framing) = framing {
                cfg.device.framing = framing;
            }

            if let Err(e) = cmd_serve(cfg).await {
                tracing::error!(error = %e, "gps-tracker cannot start");
                std::process::exit(1);
            }
        }
        Commands::Parse { file } => cmd_parse(file),
        Commands::Config { init, force } => cmd_config(init, force),
    }
}

async fn cmd_serve(cfg: Config) -> error::Result<()> {
    let history = Arc::new(HistoryStore::with_capacity(cfg.history.capacity));
    let stats = Arc::new(IngestStats::default());

    let device = DeviceListener::bind(
        &cfg.device.addr(),
        ListenerOptions::from(&cfg.device),
        Arc::clone(&history),
        Arc::clone(&stats),
    )
    .await?;
    let http = error::bind(&cfg.dashboard.addr()).await?;

    let (trigger, shutdown) = shutdown::channel();
    let trigger = Arc::new(trigger);

    tokio::spawn({
        let trigger = Arc::clone(&trigger);
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown requested");
                    trigger.trigger();
                }
                Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
            }
        }
    });

    let state = Arc::new(web::AppState::new(history, stats));
    let serving = {
        let shutdown = shutdown.clone();
        async move {
            let result = web::serve(http, state, shutdown).await;
            // Web server gone: stop taking device data too.
            trigger.trigger();
            result
        }
    };

    let ((), served) = tokio::join!(device.run(shutdown), serving);
    served?;

    info!("gps-tracker stopped");
    Ok(())
}

fn cmd_parse(file: PathBuf) {
    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(&file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    };

    let summary = parse_reader(reader).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", file.display());
        std::process::exit(1);
    });

    println!();
    println!(
        "Messages: {} parsed, {} malformed",
        summary.parsed, summary.malformed
    );
    if summary.parsed > 0 {
        println!();
        println!("{}", summary.table);
    }
}

struct ParseSummary {
    table: Table,
    parsed: u64,
    malformed: u64,
}

/// Parse newline-separated telemetry. Lines that are not UTF-8 count as
/// malformed; a read error ends the run.
fn parse_reader<R: BufRead>(reader: R) -> io::Result<ParseSummary> {
    let mut table = Table::new();
    table.set_header(vec!["Line", "Lat", "Lng", "Sats"]);

    let mut parsed = 0u64;
    let mut malformed = 0u64;

    for (i, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match telemetry::parse(&line) {
            Ok(fix) => {
                parsed += 1;
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(format!("{:.6}", fix.latitude)),
                    Cell::new(format!("{:.6}", fix.longitude)),
                    Cell::new(fix.satellite_count),
                ]);
            }
            Err(e) => {
                malformed += 1;
                eprintln!("  line {}: {e}", i + 1);
            }
        }
    }

    Ok(ParseSummary {
        table,
        parsed,
        malformed,
    })
}

fn cmd_config(init: bool, force: bool) {
    let path = config::config_file();

    if init {
        if path.exists() && !force {
            eprintln!("{} already exists (use --force to overwrite)", path.display());
            std::process::exit(1);
        }
        match config::save_config(&Config::default()) {
            Ok(path) => println!("Wrote {}", path.display()),
            Err(e) => {
                eprintln!("Error writing config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let cfg = config::load_config();
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "defaults".to_string()
    };
    println!("# source: {source}");
    print!("{}", config::serialize_config(&cfg));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
