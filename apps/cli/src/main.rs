//! # Emporium CLI
//!
//! Entry point for the `emporium` binary.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           CLI Startup                                   │
//! │                                                                         │
//! │  1. Parse arguments (clap) ───────────────────────────────────────────► │
//! │     • --help / bad usage exit here with clap's own status               │
//! │                                                                         │
//! │  2. Initialize tracing ───────────────────────────────────────────────► │
//! │     • Logs go to stderr, stdout carries only command output            │
//! │                                                                         │
//! │  3. Resolve database path ────────────────────────────────────────────► │
//! │     • --database or EMPORIUM_DB_PATH                                    │
//! │     • Otherwise the platform data directory                            │
//! │                                                                         │
//! │  4. Open database (runs migrations) ──────────────────────────────────► │
//! │                                                                         │
//! │  5. Dispatch command, print result ───────────────────────────────────► │
//! │     • Errors printed to stderr, exit code from CliError::exit_code     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod args;
mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::Cli;
use emporium_db::{Database, DbConfig};
use error::{CliError, CliResult};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    match run(cli).await {
        Ok(output) => println!("{}", output.render(json)),
        Err(err) => {
            if json {
                let body = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
                eprintln!("{body}");
            } else {
                eprintln!("error{err}");
            }
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<output::Output> {
    let db_path = database_path(cli.database)?;
    info!(?db_path, "Opening database");

    let db = Database::new(DbConfig::new(db_path)).await?;
    debug!("Database ready");

    let result = commands::dispatch(&db, cli.command).await;
    db.close().await;
    result
}

/// Initializes the tracing subscriber, writing to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=emporium=trace` - Show trace for emporium crates only
/// - Default: warnings, plus INFO from emporium crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,emporium=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.emporium.emporium/emporium.db`
/// - **Windows**: `%APPDATA%\emporium\emporium\data\emporium.db`
/// - **Linux**: `~/.local/share/emporium/emporium.db`
///
/// ## Override
/// `--database <PATH>` or the `EMPORIUM_DB_PATH` environment variable.
fn database_path(explicit: Option<PathBuf>) -> CliResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let proj_dirs = ProjectDirs::from("com", "emporium", "emporium")
        .ok_or_else(|| CliError::internal("Could not determine app data directory"))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(|e| {
        CliError::internal(format!("Could not create {}: {e}", data_dir.display()))
    })?;

    Ok(data_dir.join("emporium.db"))
}
