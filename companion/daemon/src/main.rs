//! Companion Daemon - Headless Runner for the Desktop Companion
//!
//! Runs the character, bubble and weather surfaces without a desktop. Frames
//! are written to the log and the surfaces are driven by line commands on
//! stdin (`help` lists them).
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! companion-daemon
//!
//! # Offline content and a throwaway state file
//! companion-daemon --items fixtures/news.json --state /tmp/companion.toml
//!
//! # Verbose logging
//! RUST_LOG=debug companion-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown

mod commands;
mod headless;
mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use companion_core::{
    load_config_from_path, CompanionConfig, ConfigSource, FileStore, KeyValueStore, MemoryStore,
    SurfaceContext,
};

use headless::{FixtureFetcher, QueuedPicker};
use runner::DaemonRunner;

/// Companion Daemon - Headless runner for the desktop companion surfaces
#[derive(Parser, Debug)]
#[command(name = "companion-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "COMPANION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// State store path (settings, sprite, window positions)
    #[arg(short = 's', long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// JSON file of content items served for every fetch
    #[arg(short = 'i', long, env = "COMPANION_ITEMS", value_name = "FILE")]
    items: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "COMPANION_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "companion_daemon={level},companion_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply command-line overrides on top of file and environment values
fn apply_cli_overrides(config: &mut CompanionConfig, state: Option<PathBuf>) {
    if let Some(state) = state {
        config.state_path = Some(state);
        config.set_source(ConfigSource::Cli);
    }
}

fn open_store(path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    match path {
        Some(path) => {
            let store = FileStore::open(&path)
                .with_context(|| format!("Failed to open state store: {path:?}"))?;
            info!(path = ?path, "State store");
            Ok(Arc::new(store))
        }
        None => {
            info!("No state path available, settings will not persist");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level);

    info!("Companion Daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.or_else(companion_core::default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, args.state);
    info!(source = ?config.source(), "Configuration loaded");

    let store = open_store(config.state_path.clone())?;
    let fetcher = match args.items {
        Some(ref path) => FixtureFetcher::from_file(path)?,
        None => FixtureFetcher::empty(),
    };
    let picker = Arc::new(QueuedPicker::default());
    let ctx = SurfaceContext::new(config, store, headless::collaborators(fetcher, picker.clone()));

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
        }
        signal_ctx.request_shutdown();
    });

    let runner = DaemonRunner::start(ctx, picker);
    let result = runner.run(BufReader::new(tokio::io::stdin())).await;

    match result {
        Ok(()) => {
            info!("Companion daemon stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daemon stopped with error");
            Err(e)
        }
    }
}
