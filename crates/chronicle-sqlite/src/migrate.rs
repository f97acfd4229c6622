//! In-place migration of shadow tables between revisions.
//!
//! Upgrading renames the engine columns from the detected revision's names to
//! the current ones, rebuilds the version index and regenerates the
//! triggers. Key columns, timestamps and version numbers are untouched.

use chronicle_core::{
  naming,
  revision::{EngineColumns, Revision},
  Error as CoreError, UpgradeOutcome,
};
use rusqlite::Connection;

use crate::{introspect, schema, sql::quote_ident, triggers, Result};

/// `ALTER TABLE ... RENAME COLUMN` statements taking `from` to `to`.
pub fn rename_sql(table: &str, from: &EngineColumns, to: &EngineColumns) -> Vec<String> {
  let shadow = quote_ident(&naming::shadow_table_name(table));
  from
    .all()
    .into_iter()
    .zip(to.all())
    .filter(|(old, new)| old != new)
    .map(|(old, new)| {
      format!(
        "ALTER TABLE {shadow} RENAME COLUMN {} TO {}",
        quote_ident(old),
        quote_ident(new)
      )
    })
    .collect()
}

/// Bring the shadow table for `table` to [`Revision::CURRENT`]. Runs inside
/// the caller's transaction; the caller has checked the shadow table exists.
pub fn upgrade(conn: &Connection, table: &str) -> Result<UpgradeOutcome> {
  let shadow = naming::shadow_table_name(table);

  let from = schema::detect_revision(conn, table)?;
  let from_columns = match from {
    Revision::Unknown => return Err(CoreError::UnknownRevision(shadow).into()),
    r if r.is_current() => return Ok(UpgradeOutcome::AlreadyCurrent),
    r => r.columns().ok_or(CoreError::UnknownRevision(shadow.clone()))?,
  };
  let to_columns = Revision::CURRENT
    .columns()
    .ok_or(CoreError::UnknownRevision(shadow.clone()))?;

  // Triggers are reinstalled on the tracked table, so it has to be there.
  if !introspect::table_exists(conn, table)? {
    return Err(CoreError::TableNotFound(table.to_owned()).into());
  }

  let keys = schema::key_names(conn, table)?;
  if let Some(clash) = keys.iter().find(|k| to_columns.contains(k)) {
    return Err(
      CoreError::NamingConflict(format!(
        "key column {clash:?} of {table:?} collides with a {} engine column",
        Revision::CURRENT
      ))
      .into(),
    );
  }

  triggers::remove(conn, table)?;
  conn.execute_batch(&format!(
    "DROP INDEX IF EXISTS {}",
    quote_ident(&naming::version_index_name(table))
  ))?;
  for statement in rename_sql(table, from_columns, to_columns) {
    conn.execute_batch(&statement)?;
  }
  conn.execute_batch(&schema::create_index_sql(table, to_columns))?;
  triggers::install(conn, table, &keys, to_columns)?;

  Ok(UpgradeOutcome::Upgraded { from })
}
