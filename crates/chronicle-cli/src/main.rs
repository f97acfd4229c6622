//! `chronicle`: enable, inspect and upgrade SQLite change tracking.
//!
//! # Usage
//!
//! ```text
//! chronicle --database data.db enable dogs
//! chronicle --database data.db since dogs 42
//! chronicle --config chronicle.toml status
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chronicle_sqlite::SqliteChronicle;
use clap::Parser;
use commands::Command;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "chronicle", version, about = "Row-level change tracking for SQLite tables")]
struct Cli {
  /// Path to a TOML configuration file (default: ./chronicle.toml if present).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite database file; overrides the configured `database`.
  #[arg(short, long, value_name = "FILE", env = "CHRONICLE_DATABASE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(cli.config.as_deref())?;
  let database = cli
    .database
    .or(settings.database)
    .context("no database given; pass --database or set `database` in the config")?;

  let chronicle = SqliteChronicle::open(&database)
    .await
    .with_context(|| format!("failed to open database at {database:?}"))?;

  // Bring legacy shadow tables up to date once, before anything reads them.
  if settings.auto_upgrade
    && cli.command.wants_auto_upgrade()
    && let Err(e) = chronicle.ensure_upgraded().await
  {
    tracing::warn!(error = %e, "automatic upgrade failed; run `chronicle upgrade` for details");
  }

  commands::run(&chronicle, cli.command).await
}
