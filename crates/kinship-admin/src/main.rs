//! Operator binary for the Kinship event log.
//!
//! Runs one operation per invocation and prints its result as JSON on
//! stdout. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line arguments
//! 2. Load configuration from `kinship.yaml` (defaults if missing)
//! 3. Initialize structured logging (tracing)
//! 4. Open the event log, running migrations for `PostgreSQL`
//! 5. Run the command and print the result

mod cli;
mod commands;
mod error;

use std::path::Path;

use clap::Parser;
use kinship_core::{KinshipConfig, LogFormat, StorageBackend};
use kinship_log::{EventLog, PostgresPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::error::AdminError;

/// Application entry point for the admin binary.
///
/// # Errors
///
/// Returns an error if configuration, the event log, or the command fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse arguments.
    let args = Args::parse();

    // 2. Load configuration.
    let config = load_config(&args.config)?;

    // 3. Initialize structured logging.
    init_tracing(&config);
    info!(
        backend = ?config.storage.backend,
        max_clone_depth = config.resolver.max_clone_depth,
        "kinship-admin starting"
    );

    // 4. Open the event log.
    let log = open_log(&config).await?;

    // 5. Run the command.
    let output = commands::run(args.command, &log, config.resolver.max_clone_depth).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Load configuration from `path`, falling back to defaults (with
/// environment overrides) when the file does not exist.
fn load_config(path: &Path) -> Result<KinshipConfig, AdminError> {
    if path.exists() {
        Ok(KinshipConfig::from_file(path)?)
    } else {
        Ok(KinshipConfig::parse("")?)
    }
}

fn init_tracing(config: &KinshipConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn open_log(config: &KinshipConfig) -> Result<EventLog, AdminError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory event log; events are discarded on exit");
            Ok(EventLog::in_memory())
        }
        StorageBackend::Postgres => {
            let pool = PostgresPool::connect(&config.storage.postgres_config()).await?;
            pool.run_migrations().await?;
            Ok(EventLog::postgres(&pool))
        }
    }
}
