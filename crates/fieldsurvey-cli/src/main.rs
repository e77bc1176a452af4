//! fieldsurvey - record, deduplicate, sync and export field survey entries.
//!
//! This binary is the caller side of the record store: it narrows JSON form
//! payloads, runs duplicate detection before committing, and drives sync and
//! spreadsheet exports.

mod cli;
mod commands;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fieldsurvey_core::Config;

use cli::Cli;

/// Log file prefix inside the data directory's `logs/` folder.
const LOG_FILE_PREFIX: &str = "fieldsurvey.log";

/// Initialize tracing: stderr plus a daily log file. The returned guard
/// flushes the file writer when dropped.
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(data_dir.join("logs"), LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_result = Config::load();
    let mut config = config_result.as_ref().cloned().unwrap_or_default();
    config.apply_env();
    if let Some(ref collector) = cli.collector {
        config.collector_id = Some(collector.clone());
    }
    if cli.offline {
        config.offline_mode = true;
    }

    let data_dir = config.data_dir()?;
    let _log_guard = init_tracing(&data_dir);
    if let Err(e) = config_result {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(collector = config.collector(), offline = config.offline_mode, "fieldsurvey starting");

    let result = commands::run(cli.command, config, data_dir).await;
    if let Err(ref e) = result {
        warn!(error = %e, "Command failed");
    }
    result
}
