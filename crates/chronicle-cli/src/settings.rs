//! Layered configuration: optional TOML file, then `CHRONICLE_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file.
  #[serde(default)]
  pub database:     Option<PathBuf>,
  /// Upgrade legacy shadow tables once at startup.
  #[serde(default = "default_auto_upgrade")]
  pub auto_upgrade: bool,
}

fn default_auto_upgrade() -> bool { true }

impl Settings {
  pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let file = match path {
      Some(path) => config::File::from(path).required(true),
      None => config::File::with_name("chronicle").required(false),
    };

    config::Config::builder()
      .add_source(file)
      .add_source(config::Environment::with_prefix("CHRONICLE"))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}
