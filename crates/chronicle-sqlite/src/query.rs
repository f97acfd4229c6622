//! Read side: "what changed since version V" and the latest version.
//!
//! Queries use the engine columns of whichever revision the shadow table is
//! at, so callers can still read a table that has not been upgraded yet.

use chronicle_core::{naming, revision::EngineColumns, ShadowRow, SinceFilter, Version};
use rusqlite::{types::Value, Connection};

use crate::{
  encode::RawShadowRow,
  schema,
  sql::{column_list, quote_ident},
  Result,
};

pub fn changed_since(
  conn: &Connection,
  table: &str,
  columns: &EngineColumns,
  since: Version,
) -> Result<Vec<ShadowRow>> {
  let keys = schema::key_names(conn, table)?;
  let width = keys.len();

  let sql = format!(
    "SELECT {key_list}, {added}, {updated}, {version}, {deleted}
     FROM {shadow}
     WHERE {version} > ?1
     ORDER BY {version}",
    key_list = column_list(&keys),
    added    = quote_ident(columns.added),
    updated  = quote_ident(columns.updated),
    version  = quote_ident(columns.version),
    deleted  = quote_ident(columns.deleted),
    shadow   = quote_ident(&naming::shadow_table_name(table)),
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map([since], |row| {
      Ok(RawShadowRow {
        key:        (0..width)
          .map(|i| row.get::<_, Value>(i))
          .collect::<rusqlite::Result<Vec<_>>>()?,
        added_ms:   row.get(width)?,
        updated_ms: row.get(width + 1)?,
        version:    row.get(width + 2)?,
        deleted:    row.get(width + 3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(raws.into_iter().map(RawShadowRow::into_shadow_row).collect())
}

/// `0` when the shadow table is empty.
pub fn max_version(conn: &Connection, table: &str, columns: &EngineColumns) -> Result<Version> {
  let sql = format!(
    "SELECT COALESCE(MAX({}), 0) FROM {}",
    quote_ident(columns.version),
    quote_ident(&naming::shadow_table_name(table)),
  );
  Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

/// Predicate over the tracked table's key columns, bound through
/// `:chronicle_since`.
pub fn since_filter(conn: &Connection, table: &str, columns: &EngineColumns) -> Result<SinceFilter> {
  let keys = schema::key_names(conn, table)?;
  let shadow = naming::shadow_table_name(table);
  let key_list = column_list(&keys);

  let where_clause = format!(
    "({key_list}) IN (SELECT {key_list} FROM {} WHERE {} > :{})",
    quote_ident(&shadow),
    quote_ident(columns.version),
    SinceFilter::PARAM,
  );

  Ok(SinceFilter { shadow_table: shadow, primary_keys: keys, where_clause })
}
