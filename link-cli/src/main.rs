//! # wled-link
//!
//! CLI tool for probing and streaming to WLED controllers.
//!
//! ## Commands
//!
//! - `probe`: Show what the controller reports, without changing it
//! - `stream`: Negotiate, then stream a test pattern
//! - `modes`: List supported sync modes and their defaults
//!
//! ## Example
//!
//! ```bash
//! # Inspect the controller named in wled-link.toml
//! wled-link probe
//!
//! # Stream a rainbow over DDP for ten seconds
//! wled-link stream --mode ddp --pattern rainbow --duration 10
//!
//! # Solid red, skipping negotiation
//! wled-link -c desk.toml stream --pattern ff0000 --no-negotiate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wled_link_client::HttpConnector;
use wled_link_types::SyncMode;

mod commands;
mod config;

use commands::stream::{Pattern, StreamOptions};
use commands::{modes, probe, stream};
use config::{AppConfig, DEFAULT_CONFIG_FILE};

/// CLI tool for probing and streaming to WLED controllers.
#[derive(Parser, Debug)]
#[command(name = "wled-link")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Port of the controller's JSON API
    #[arg(long, global = true, default_value_t = wled_link_client::control::DEFAULT_CONTROL_PORT)]
    control_port: u16,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show what the controller reports, without changing it
    Probe,

    /// Stream a test pattern
    Stream {
        /// Sync mode (UDP, DDP, E131); defaults to the configured mode
        #[arg(long, short)]
        mode: Option<SyncMode>,

        /// 'rainbow' or an RRGGBB color
        #[arg(long, short, default_value = "rainbow")]
        pattern: Pattern,

        /// Frames per second
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Seconds to stream
        #[arg(long, short, default_value_t = 5)]
        duration: u64,

        /// Skip capability negotiation
        #[arg(long)]
        no_negotiate: bool,
    },

    /// List supported sync modes
    Modes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Modes => {
            modes::run();
        }
        Commands::Probe => {
            let config = load_config(&cli.config)?;
            let connector = connector(&config, cli.control_port);
            probe::run(&config, &connector).await?;
        }
        Commands::Stream {
            mode,
            pattern,
            fps,
            duration,
            no_negotiate,
        } => {
            let config = load_config(&cli.config)?;
            let connector = connector(&config, cli.control_port);
            let options = StreamOptions {
                mode,
                pattern,
                fps,
                duration: Duration::from_secs(duration),
                negotiate: !no_negotiate,
            };
            stream::run(&config, &connector, &options).await?;
        }
    }

    Ok(())
}

fn load_config(path: &std::path::Path) -> Result<AppConfig> {
    AppConfig::from_file(path).context("Failed to load configuration")
}

fn connector(config: &AppConfig, port: u16) -> HttpConnector {
    HttpConnector::new(config.request_timeout()).with_port(port)
}
