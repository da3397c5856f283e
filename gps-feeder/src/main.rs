//! gps-feeder: Stand-in for the GPS device.
//!
//! Supports:
//! - Replaying a file of telemetry lines to a tracker's device port
//! - Generating a synthetic circular track around a point

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};

use gps_core::{format_fix, Fix};

mod sender;
mod track;

use crate::sender::TelemetrySender;

#[derive(Parser)]
#[command(
    name = "gps-feeder",
    version,
    about = "Send GPS telemetry to a gps-tracker device port"
)]
struct Cli {
    /// Tracker host
    #[arg(long, global = true, env = "GPS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Tracker device port
    #[arg(long, global = true, env = "GPS_DEVICE_PORT", default_value = "1234")]
    port: u16,

    /// Delay between messages in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    interval_ms: u64,

    /// Send messages without a trailing newline, like a bare device print
    #[arg(long, global = true)]
    no_newline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay telemetry lines from a file (one message per line)
    Replay {
        /// Path to telemetry file
        file: PathBuf,
    },

    /// Send a synthetic circular track
    Simulate {
        /// Center latitude
        #[arg(long, default_value = "37.422", allow_hyphen_values = true)]
        lat: f64,

        /// Center longitude
        #[arg(long, default_value = "-122.084", allow_hyphen_values = true)]
        lng: f64,

        /// Reported satellite count
        #[arg(long, default_value = "8")]
        sats: i64,

        /// Circle radius in meters
        #[arg(long, default_value = "50.0")]
        radius_m: f64,

        /// Number of fixes to send
        #[arg(long, default_value = "60")]
        count: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);
    let interval = Duration::from_millis(cli.interval_ms);

    let messages: Vec<String> = match &cli.command {
        Commands::Replay { file } => {
            let content = std::fs::read_to_string(file).unwrap_or_else(|e| {
                eprintln!("Error opening {}: {e}", file.display());
                std::process::exit(1);
            });
            content
                .lines()
                .filter_map(track::clean_line)
                .map(str::to_string)
                .collect()
        }
        Commands::Simulate {
            lat,
            lng,
            sats,
            radius_m,
            count,
        } => track::circle_track(Fix::new(*lat, *lng, *sats), *radius_m, *count)
            .iter()
            .map(format_fix)
            .collect(),
    };

    let mut sender = TelemetrySender::connect(&addr, !cli.no_newline).unwrap_or_else(|e| {
        eprintln!("Error connecting to {addr}: {e}");
        std::process::exit(1);
    });

    eprintln!("Sending {} messages to {addr}", messages.len());

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            thread::sleep(interval);
        }
        if let Err(e) = sender.send(message) {
            eprintln!("Send failed after {} messages: {e}", sender.sent);
            std::process::exit(1);
        }
        println!("{message}");
    }

    eprintln!("{} messages sent", sender.sent);
}
