//! Trigger generation and installation.
//!
//! Trigger SQL is a pure function of the tracked table's name, its key
//! columns and the target revision's engine columns. Triggers are never
//! patched: a revision change drops and regenerates all three.
//!
//! Every trigger allocates its version as
//! `COALESCE((SELECT MAX(version) FROM shadow), 0) + 1`, evaluated per
//! affected row. A statement touching N rows therefore consumes N
//! consecutive versions, assigned in whatever order SQLite visits the rows.
//!
//! Rows removed by an `OR REPLACE` conflict only reach the delete trigger
//! when `recursive_triggers` is on (see
//! [`engine::prepare_connection`](crate::engine::prepare_connection)). On a
//! connection without it, such a row keeps its live shadow entry; a
//! same-key replace is still recorded through the insert trigger's upsert.

use chronicle_core::{
  naming::{self, TriggerKind},
  revision::EngineColumns,
};
use rusqlite::Connection;

use crate::{
  sql::{column_list, key_match, pseudo_row_list, quote_ident},
  Result,
};

/// Milliseconds since the Unix epoch, computed by SQLite itself so the
/// triggers work for every client writing to the table.
pub const NOW_MS: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

/// A generated `CREATE TRIGGER` statement.
#[derive(Debug, Clone)]
pub struct TriggerSql {
  pub kind: TriggerKind,
  pub name: String,
  pub sql:  String,
}

fn next_version(shadow: &str, columns: &EngineColumns) -> String {
  format!(
    "COALESCE((SELECT MAX({version}) FROM {shadow}), 0) + 1",
    version = quote_ident(columns.version),
  )
}

/// Body of the trigger for `kind`, without the `CREATE TRIGGER` header.
fn body(kind: TriggerKind, shadow: &str, keys: &[String], columns: &EngineColumns) -> String {
  let next    = next_version(shadow, columns);
  let added   = quote_ident(columns.added);
  let updated = quote_ident(columns.updated);
  let version = quote_ident(columns.version);
  let deleted = quote_ident(columns.deleted);
  let key_list = column_list(keys);

  match kind {
    // Fresh keys get a new row; a tombstoned (or replaced) key reuses its row
    // and takes the new spelling of a key its collation considers equal.
    TriggerKind::Insert => format!(
      "  INSERT INTO {shadow} ({key_list}, {added}, {updated}, {version}, {deleted})
  VALUES ({new_keys}, {NOW_MS}, {NOW_MS}, {next}, 0)
  ON CONFLICT ({key_list}) DO UPDATE SET{assign_keys}
    {updated} = excluded.{updated},
    {version} = excluded.{version},
    {deleted} = 0;",
      new_keys = pseudo_row_list("NEW", keys),
      assign_keys = keys
        .iter()
        .map(|k| {
          let col = quote_ident(k);
          format!("\n    {col} = excluded.{col},")
        })
        .collect::<String>(),
    ),

    // The shadow row follows a key change. OR REPLACE lets it take over a
    // tombstone already holding the new key; the version subquery is
    // evaluated before that tombstone goes, so the sequence never steps back.
    TriggerKind::Update => {
      let assign_keys = keys
        .iter()
        .map(|k| {
          let col = quote_ident(k);
          format!(",\n    {col} = NEW.{col}")
        })
        .collect::<String>();

      format!(
        "  UPDATE OR REPLACE {shadow} SET
    {updated} = {NOW_MS},
    {version} = {next}{assign_keys}
  WHERE {match_old};",
        match_old = key_match("OLD", keys),
      )
    }

    TriggerKind::Delete => format!(
      "  UPDATE {shadow} SET
    {updated} = {NOW_MS},
    {version} = {next},
    {deleted} = 1
  WHERE {match_old};",
      match_old = key_match("OLD", keys),
    ),
  }
}

/// The three triggers for `table`, in insert/update/delete order.
pub fn trigger_sql(table: &str, keys: &[String], columns: &EngineColumns) -> [TriggerSql; 3] {
  let shadow = quote_ident(&naming::shadow_table_name(table));
  let target = quote_ident(table);

  TriggerKind::ALL.map(|kind| {
    let name = naming::trigger_name(table, kind);
    let sql = format!(
      "CREATE TRIGGER {trigger} AFTER {event} ON {target} FOR EACH ROW\nBEGIN\n{body}\nEND",
      trigger = quote_ident(&name),
      event = kind.event(),
      body = body(kind, &shadow, keys, columns),
    );
    TriggerSql { kind, name, sql }
  })
}

pub fn install(
  conn: &Connection,
  table: &str,
  keys: &[String],
  columns: &EngineColumns,
) -> Result<()> {
  for trigger in trigger_sql(table, keys, columns) {
    tracing::debug!(table, trigger = %trigger.name, sql = %trigger.sql, "installing trigger");
    conn.execute_batch(&trigger.sql)?;
  }
  Ok(())
}

/// Drop whichever of the three triggers exist.
pub fn remove(conn: &Connection, table: &str) -> Result<()> {
  for kind in TriggerKind::ALL {
    conn.execute_batch(&format!(
      "DROP TRIGGER IF EXISTS {}",
      quote_ident(&naming::trigger_name(table, kind))
    ))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chronicle_core::revision::{current_columns, Revision};

  use super::*;

  fn keys(names: &[&str]) -> Vec<String> { names.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn one_trigger_per_event() {
    let [insert, update, delete] = trigger_sql("dogs", &keys(&["id"]), current_columns());

    assert_eq!(insert.name, "_chronicle_dogs_ai");
    assert!(insert.sql.starts_with(
      "CREATE TRIGGER \"_chronicle_dogs_ai\" AFTER INSERT ON \"dogs\" FOR EACH ROW"
    ));
    assert_eq!(update.kind, TriggerKind::Update);
    assert!(update.sql.contains("AFTER UPDATE ON \"dogs\""));
    assert_eq!(delete.name, "_chronicle_dogs_ad");
    assert!(delete.sql.contains("\"__deleted\" = 1\n  WHERE \"id\" IS OLD.\"id\";"));
  }

  #[test]
  fn every_trigger_allocates_from_the_shadow_max() {
    let next = "COALESCE((SELECT MAX(\"__version\") FROM \"_chronicle_dogs\"), 0) + 1";
    for trigger in trigger_sql("dogs", &keys(&["id"]), current_columns()) {
      assert!(trigger.sql.contains(next), "{}", trigger.sql);
    }
  }

  #[test]
  fn insert_upserts_on_the_full_key() {
    let [insert, ..] = trigger_sql("pets", &keys(&["owner", "name"]), current_columns());
    assert!(insert.sql.contains("VALUES (NEW.\"owner\", NEW.\"name\","));
    assert!(insert.sql.contains("ON CONFLICT (\"owner\", \"name\") DO UPDATE SET"));
    assert!(insert.sql.contains("\"owner\" = excluded.\"owner\","));
    assert!(insert.sql.contains("\"__deleted\" = 0;"));
  }

  #[test]
  fn update_moves_the_key_and_matches_old_tuple() {
    let [_, update, _] = trigger_sql("pets", &keys(&["owner", "name"]), current_columns());
    assert!(update.sql.contains("\"owner\" = NEW.\"owner\""));
    assert!(update.sql.contains("\"name\" = NEW.\"name\""));
    assert!(
      update
        .sql
        .contains("WHERE \"owner\" IS OLD.\"owner\" AND \"name\" IS OLD.\"name\";")
    );
    assert!(update.sql.contains("UPDATE OR REPLACE \"_chronicle_pets\" SET"));
  }

  #[test]
  fn legacy_revision_uses_legacy_columns() {
    let legacy = Revision::V1.columns().unwrap();
    let [insert, ..] = trigger_sql("dogs", &keys(&["id"]), legacy);
    assert!(insert.sql.contains("\"added_ms\", \"updated_ms\", \"version\", \"deleted\""));
    assert!(!insert.sql.contains("__version"));
  }
}
