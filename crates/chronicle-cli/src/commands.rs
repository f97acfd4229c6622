//! Subcommands. Each prints JSON to stdout; logs go to stderr.

use anyhow::{bail, Context as _};
use chrono::{DateTime, Utc};
use chronicle_core::{
  ChangeTracker, Revision, ShadowRow, SinceFilter, UpgradeOutcome, Version,
};
use chronicle_sqlite::SqliteChronicle;
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand)]
pub enum Command {
  /// Start tracking a table. Keys default to the table's primary key.
  Enable {
    table: String,
    /// Primary-key column; repeat for composite keys, in key order.
    #[arg(long = "pk", value_name = "COLUMN")]
    primary_keys: Vec<String>,
  },

  /// Stop tracking a table and drop its history.
  Disable {
    table: String,
    /// Confirm that all recorded versions for the table may be dropped.
    #[arg(long)]
    yes: bool,
  },

  /// Migrate shadow tables to the current revision (all when no table is
  /// given).
  Upgrade { table: Option<String> },

  /// Show revision and latest version (all tracked tables when no table is
  /// given).
  Status { table: Option<String> },

  /// List rows changed after VERSION, tombstones included, one JSON object
  /// per line.
  Since { table: String, version: Version },

  /// Print the SQL predicate selecting rows changed after VERSION.
  Filter {
    table: String,
    #[arg(default_value_t = 0)]
    version: Version,
  },
}

impl Command {
  /// Commands that manage revisions themselves skip the startup upgrade.
  pub fn wants_auto_upgrade(&self) -> bool {
    !matches!(self, Command::Upgrade { .. } | Command::Status { .. })
  }
}

#[derive(Serialize)]
struct TableStatus {
  table:       String,
  revision:    Revision,
  /// Absent when the shadow table cannot be read.
  max_version: Option<Version>,
}

#[derive(Serialize)]
struct Upgraded {
  table: String,
  #[serde(flatten)]
  outcome: UpgradeOutcome,
}

/// A shadow row with its timestamps also rendered as RFC 3339.
#[derive(Serialize)]
struct Change {
  #[serde(flatten)]
  row:        ShadowRow,
  added_at:   Option<DateTime<Utc>>,
  updated_at: Option<DateTime<Utc>>,
}

impl From<ShadowRow> for Change {
  fn from(row: ShadowRow) -> Self {
    Self {
      added_at: row.added_at(),
      updated_at: row.updated_at(),
      row,
    }
  }
}

#[derive(Serialize)]
struct Filter {
  where_clause: String,
  params:       serde_json::Value,
  description:  String,
}

fn emit(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string(value)?);
  Ok(())
}

async fn status(chronicle: &SqliteChronicle, table: String) -> anyhow::Result<TableStatus> {
  let revision = chronicle.detect_revision(&table).await?;
  let max_version = match revision {
    Revision::Unknown => None,
    _ => Some(chronicle.max_version(&table).await?),
  };
  Ok(TableStatus { table, revision, max_version })
}

pub async fn run(chronicle: &SqliteChronicle, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Enable { table, primary_keys } => {
      let primary_keys = if primary_keys.is_empty() {
        chronicle
          .primary_keys(&table)
          .await
          .with_context(|| format!("failed to read primary key of {table:?}"))?
      } else {
        primary_keys
      };
      chronicle
        .enable(&table, &primary_keys)
        .await
        .with_context(|| format!("failed to enable tracking for {table:?}"))?;
      emit(&status(chronicle, table).await?)
    }

    Command::Disable { table, yes } => {
      if !yes {
        bail!("disabling drops every recorded version for {table:?}; pass --yes to confirm");
      }
      chronicle
        .disable(&table)
        .await
        .with_context(|| format!("failed to disable tracking for {table:?}"))?;
      emit(&serde_json::json!({ "table": table, "tracked": false }))
    }

    Command::Upgrade { table: Some(table) } => {
      let outcome = chronicle.upgrade(&table).await?;
      emit(&Upgraded { table, outcome })
    }

    Command::Upgrade { table: None } => {
      for (table, outcome) in chronicle.upgrade_all().await? {
        emit(&Upgraded { table, outcome })?;
      }
      Ok(())
    }

    Command::Status { table: Some(table) } => emit(&status(chronicle, table).await?),

    Command::Status { table: None } => {
      for table in chronicle.tracked_tables().await? {
        emit(&status(chronicle, table).await?)?;
      }
      Ok(())
    }

    Command::Since { table, version } => {
      for row in chronicle.changed_since(&table, version).await? {
        emit(&Change::from(row))?;
      }
      Ok(())
    }

    Command::Filter { table, version } => {
      let filter = chronicle.since_filter(&table).await?;
      let param = SinceFilter::PARAM;
      emit(&Filter {
        description:  filter.human_description(version),
        params:       serde_json::json!({ param: version }),
        where_clause: filter.where_clause,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Harness {
    #[command(subcommand)]
    command: Command,
  }

  fn parse(args: &[&str]) -> Command {
    Harness::try_parse_from(std::iter::once("chronicle").chain(args.iter().copied()))
      .expect("valid arguments")
      .command
  }

  #[test]
  fn enable_collects_repeated_keys() {
    match parse(&["enable", "pets", "--pk", "owner", "--pk", "name"]) {
      Command::Enable { table, primary_keys } => {
        assert_eq!(table, "pets");
        assert_eq!(primary_keys, ["owner", "name"]);
      }
      _ => panic!("expected enable"),
    }
  }

  #[test]
  fn upgrade_and_status_skip_the_startup_upgrade() {
    assert!(!parse(&["upgrade"]).wants_auto_upgrade());
    assert!(!parse(&["status", "dogs"]).wants_auto_upgrade());
    assert!(parse(&["since", "dogs", "3"]).wants_auto_upgrade());
  }

  #[test]
  fn changes_carry_readable_timestamps() {
    let change = Change::from(ShadowRow {
      key:        chronicle_core::PrimaryKey::single(7),
      added_ms:   1_700_000_000_000,
      updated_ms: 1_700_000_000_500,
      version:    4,
      deleted:    false,
    });
    let json = serde_json::to_value(&change).unwrap();

    assert_eq!(json["version"], 4);
    assert_eq!(json["key"], serde_json::json!([7]));
    assert!(json["added_at"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    assert!(json["updated_at"].as_str().unwrap().starts_with("2023-11-14T22:13:20.5"));
  }

  #[tokio::test]
  async fn disable_requires_confirmation() {
    let chronicle = SqliteChronicle::open_in_memory().await.unwrap();
    let err = run(&chronicle, parse(&["disable", "dogs"])).await.unwrap_err();
    assert!(err.to_string().contains("--yes"));
  }

  #[tokio::test]
  async fn status_reports_revision_and_version() {
    let chronicle = SqliteChronicle::open_in_memory().await.unwrap();
    chronicle
      .connection()
      .call(|conn| {
        conn.execute_batch(
          "CREATE TABLE dogs (id INTEGER PRIMARY KEY); INSERT INTO dogs VALUES (1), (2);",
        )?;
        Ok(())
      })
      .await
      .unwrap();
    chronicle.enable("dogs", &["id".to_owned()]).await.unwrap();

    let report = status(&chronicle, "dogs".to_owned()).await.unwrap();
    assert_eq!(report.revision, Revision::V2);
    assert_eq!(report.max_version, Some(2));
  }
}
