//! Shadow-table DDL: creation, backfill, revision detection and removal.
//!
//! A shadow table's key columns are copied from the tracked table's primary
//! key (name, declared type and collation) and form the shadow table's own
//! composite primary key. They are `NOT NULL`: a write that would record a
//! NULL key fails instead. The engine columns come from the requested
//! revision.

use chronicle_core::{
  naming,
  revision::{EngineColumns, Revision},
};
use rusqlite::Connection;

use crate::{
  introspect::{self, ColumnInfo},
  sql::{column_list, quote_ident},
  Result,
};

// ─── SQL text ────────────────────────────────────────────────────────────────

pub fn create_table_sql(table: &str, keys: &[ColumnInfo], columns: &EngineColumns) -> String {
  let mut defs: Vec<String> = keys
    .iter()
    .map(|k| {
      let mut def = quote_ident(&k.name);
      if !k.decl_type.is_empty() {
        def.push(' ');
        def.push_str(&k.decl_type);
      }
      def.push_str(" NOT NULL");
      if let Some(collation) = &k.collation {
        def.push_str(" COLLATE ");
        def.push_str(&quote_ident(collation));
      }
      def
    })
    .collect();

  defs.push(format!("{} INTEGER NOT NULL", quote_ident(columns.added)));
  defs.push(format!("{} INTEGER NOT NULL", quote_ident(columns.updated)));
  defs.push(format!("{} INTEGER NOT NULL", quote_ident(columns.version)));
  defs.push(format!("{} INTEGER NOT NULL DEFAULT 0", quote_ident(columns.deleted)));

  let key_names: Vec<&str> = keys.iter().map(|k| k.name.as_str()).collect();
  defs.push(format!("PRIMARY KEY ({})", column_list(&key_names)));

  format!(
    "CREATE TABLE {} (\n  {}\n)",
    quote_ident(&naming::shadow_table_name(table)),
    defs.join(",\n  ")
  )
}

pub fn create_index_sql(table: &str, columns: &EngineColumns) -> String {
  format!(
    "CREATE INDEX {} ON {} ({})",
    quote_ident(&naming::version_index_name(table)),
    quote_ident(&naming::shadow_table_name(table)),
    quote_ident(columns.version),
  )
}

/// One shadow row per tracked row; versions 1..N follow primary-key order.
/// `?1` is the enable timestamp.
pub fn backfill_sql(table: &str, keys: &[String], columns: &EngineColumns) -> String {
  let key_list = column_list(keys);
  format!(
    "INSERT INTO {shadow} ({key_list}, {added}, {updated}, {version}, {deleted})
     SELECT {key_list}, ?1, ?1, ROW_NUMBER() OVER (ORDER BY {key_list}), 0
     FROM {table}",
    shadow  = quote_ident(&naming::shadow_table_name(table)),
    added   = quote_ident(columns.added),
    updated = quote_ident(columns.updated),
    version = quote_ident(columns.version),
    deleted = quote_ident(columns.deleted),
    table   = quote_ident(table),
  )
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Create the shadow table and its version index.
pub fn create(
  conn: &Connection,
  table: &str,
  keys: &[ColumnInfo],
  columns: &EngineColumns,
) -> Result<()> {
  let ddl = create_table_sql(table, keys, columns);
  tracing::debug!(table, sql = %ddl, "creating shadow table");
  conn.execute_batch(&ddl)?;
  conn.execute_batch(&create_index_sql(table, columns))?;
  Ok(())
}

/// Record every existing row of `table`; returns how many were recorded.
pub fn backfill(
  conn: &Connection,
  table: &str,
  keys: &[String],
  columns: &EngineColumns,
  now_ms: i64,
) -> Result<usize> {
  Ok(conn.execute(&backfill_sql(table, keys, columns), [now_ms])?)
}

/// Drop the shadow table; its index goes with it.
pub fn drop_table(conn: &Connection, table: &str) -> Result<()> {
  conn.execute_batch(&format!(
    "DROP TABLE {}",
    quote_ident(&naming::shadow_table_name(table))
  ))?;
  Ok(())
}

/// Key column names of the shadow table for `table`, in key order. These are
/// the tracked table's key columns as they were when tracking was enabled.
pub fn key_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
  Ok(
    introspect::primary_key_columns(conn, &naming::shadow_table_name(table))?
      .into_iter()
      .map(|c| c.name)
      .collect(),
  )
}

/// Classify the shadow table for `table` by its non-key columns. The caller
/// ensures the shadow table exists.
pub fn detect_revision(conn: &Connection, table: &str) -> Result<Revision> {
  let columns = introspect::table_columns(conn, &naming::shadow_table_name(table))?;
  let has_key = columns.iter().any(|c| c.pk > 0);
  if !has_key {
    return Ok(Revision::Unknown);
  }
  Ok(Revision::detect(
    columns.iter().filter(|c| c.pk == 0).map(|c| c.name.as_str()),
  ))
}
