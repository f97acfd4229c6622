//! Synchronous chronicle operations over a [`rusqlite::Connection`].
//!
//! Schema-changing operations (`enable`, `disable`, `upgrade`,
//! `upgrade_all`) each run in one `BEGIN IMMEDIATE` transaction, so the
//! write lock is held from the first check to the commit and any failure
//! leaves the database as it was.

use chronicle_core::{
  naming::{self, TriggerKind},
  revision::{current_columns, EngineColumns, Revision},
  Error as CoreError, ShadowRow, SinceFilter, UpgradeOutcome, Version,
};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{introspect, migrate, query, schema, triggers, Result};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
  Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn ensure_tracked(conn: &Connection, table: &str) -> Result<()> {
  if introspect::table_exists(conn, &naming::shadow_table_name(table))? {
    Ok(())
  } else {
    Err(CoreError::NotTracked(table.to_owned()).into())
  }
}

/// Engine columns of the shadow table for `table` at its detected revision.
fn tracked_columns(conn: &Connection, table: &str) -> Result<&'static EngineColumns> {
  ensure_tracked(conn, table)?;
  schema::detect_revision(conn, table)?
    .columns()
    .ok_or_else(|| CoreError::UnknownRevision(naming::shadow_table_name(table)).into())
}

fn conflict(message: String) -> crate::Error { CoreError::NamingConflict(message).into() }

// ─── Connection setup ────────────────────────────────────────────────────────

/// Per-connection settings the triggers rely on.
///
/// With `recursive_triggers` on, rows that `INSERT OR REPLACE` (or an
/// `OR REPLACE` update) removes fire the delete trigger and are recorded as
/// tombstones. Connections that skip this still record every plain insert,
/// update and delete, but miss those implicit deletions.
pub fn prepare_connection(conn: &Connection) -> Result<()> {
  conn.execute_batch("PRAGMA recursive_triggers = ON;")?;
  Ok(())
}

// ─── Schema management ───────────────────────────────────────────────────────

/// Start tracking `table`, keyed by `primary_keys` (in key order).
///
/// `now_ms` stamps the backfilled rows. Returns the maximum version after
/// backfill: one version per pre-existing row, assigned in primary-key order.
pub fn enable(
  conn: &mut Connection,
  table: &str,
  primary_keys: &[String],
  now_ms: i64,
) -> Result<Version> {
  if primary_keys.is_empty() {
    return Err(CoreError::NoPrimaryKey(table.to_owned()).into());
  }

  let tx = begin(conn)?;
  let backfilled = enable_in(&tx, table, primary_keys, now_ms)?;
  tx.commit()?;

  tracing::info!(table, rows = backfilled, "chronicle tracking enabled");
  Ok(backfilled as Version)
}

fn enable_in(
  conn: &Connection,
  table: &str,
  primary_keys: &[String],
  now_ms: i64,
) -> Result<usize> {
  if naming::is_shadow_table(table) {
    return Err(conflict(format!(
      "{table:?} is itself a chronicle table and cannot be tracked"
    )));
  }
  match introspect::object_type(conn, table)?.as_deref() {
    Some("table") => {}
    Some(_) => return Err(CoreError::NotATable(table.to_owned()).into()),
    None => return Err(CoreError::TableNotFound(table.to_owned()).into()),
  }

  let shadow = naming::shadow_table_name(table);
  match introspect::object_type(conn, &shadow)?.as_deref() {
    None => {}
    Some("table") => {
      return Err(match schema::detect_revision(conn, table)? {
        Revision::Unknown => conflict(format!(
          "{shadow:?} already exists and is not a chronicle table"
        )),
        _ => CoreError::AlreadyTracked(table.to_owned()).into(),
      });
    }
    Some(kind) => return Err(conflict(format!("{shadow:?} already exists as a {kind}"))),
  }

  let index = naming::version_index_name(table);
  if let Some(kind) = introspect::object_type(conn, &index)? {
    return Err(conflict(format!("{index:?} already exists as a {kind}")));
  }
  for kind in TriggerKind::ALL {
    let trigger = naming::trigger_name(table, kind);
    if let Some(owner) = introspect::trigger_table(conn, &trigger)? {
      return Err(conflict(format!(
        "trigger {trigger:?} already exists on {owner:?}"
      )));
    }
  }

  // Resolve the requested keys against the table, keeping declared types.
  let columns = introspect::table_columns(conn, table)?;
  let engine = current_columns();
  let mut keys = Vec::with_capacity(primary_keys.len());
  for (position, requested) in primary_keys.iter().enumerate() {
    let mut column = columns
      .iter()
      .find(|c| c.name.eq_ignore_ascii_case(requested))
      .cloned()
      .ok_or_else(|| CoreError::UnknownColumn {
        table:  table.to_owned(),
        column: requested.clone(),
      })?;
    if engine.contains(&column.name) {
      return Err(conflict(format!(
        "key column {:?} of {table:?} collides with a chronicle column",
        column.name
      )));
    }
    if introspect::has_nulls(conn, table, &column.name)? {
      return Err(
        CoreError::NullKey {
          table:  table.to_owned(),
          column: column.name,
        }
        .into(),
      );
    }
    column.pk = position as i64 + 1;
    column.collation = introspect::key_collation(conn, table, &column.name)?;
    keys.push(column);
  }
  let key_names: Vec<String> = keys.iter().map(|k| k.name.clone()).collect();

  schema::create(conn, table, &keys, engine)?;
  let backfilled = schema::backfill(conn, table, &key_names, engine, now_ms)?;
  triggers::install(conn, table, &key_names, engine)?;
  Ok(backfilled)
}

/// Stop tracking `table`: drop its triggers and shadow table. History is
/// lost.
///
/// A shadow-named table that matches no known revision is left alone and
/// reported as [`CoreError::UnknownRevision`].
pub fn disable(conn: &mut Connection, table: &str) -> Result<()> {
  let tx = begin(conn)?;
  tracked_columns(&tx, table)?;
  triggers::remove(&tx, table)?;
  schema::drop_table(&tx, table)?;
  tx.commit()?;

  tracing::info!(table, "chronicle tracking disabled");
  Ok(())
}

pub fn detect_revision(conn: &Connection, table: &str) -> Result<Revision> {
  ensure_tracked(conn, table)?;
  schema::detect_revision(conn, table)
}

/// Migrate the shadow table for `table` to [`Revision::CURRENT`]. A table
/// already at the current revision is left untouched.
pub fn upgrade(conn: &mut Connection, table: &str) -> Result<UpgradeOutcome> {
  let tx = begin(conn)?;
  ensure_tracked(&tx, table)?;
  let outcome = migrate::upgrade(&tx, table)?;
  tx.commit()?;

  if let UpgradeOutcome::Upgraded { from } = outcome {
    tracing::info!(table, %from, to = %Revision::CURRENT, "chronicle table upgraded");
  }
  Ok(outcome)
}

/// Upgrade every tracked table in one transaction. Any failure (e.g. a
/// table at an unknown revision) rolls back all of them.
pub fn upgrade_all(conn: &mut Connection) -> Result<Vec<(String, UpgradeOutcome)>> {
  let tx = begin(conn)?;
  let mut outcomes = Vec::new();
  for table in tracked_tables(&tx)? {
    let outcome = migrate::upgrade(&tx, &table)?;
    outcomes.push((table, outcome));
  }
  tx.commit()?;

  for (table, outcome) in &outcomes {
    if let UpgradeOutcome::Upgraded { from } = outcome {
      tracing::info!(table = %table, %from, to = %Revision::CURRENT, "chronicle table upgraded");
    }
  }
  Ok(outcomes)
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Shadow rows of `table` with a version above `since`, in version order.
/// Tombstones are included.
pub fn changed_since(conn: &Connection, table: &str, since: Version) -> Result<Vec<ShadowRow>> {
  let columns = tracked_columns(conn, table)?;
  query::changed_since(conn, table, columns, since)
}

pub fn max_version(conn: &Connection, table: &str) -> Result<Version> {
  let columns = tracked_columns(conn, table)?;
  query::max_version(conn, table, columns)
}

pub fn since_filter(conn: &Connection, table: &str) -> Result<SinceFilter> {
  let columns = tracked_columns(conn, table)?;
  query::since_filter(conn, table, columns)
}

// ─── Discovery ───────────────────────────────────────────────────────────────

/// Primary-key columns of `table` in key order; empty for rowid tables.
pub fn primary_keys(conn: &Connection, table: &str) -> Result<Vec<String>> {
  match introspect::object_type(conn, table)?.as_deref() {
    Some("table") => {}
    Some(_) => return Err(CoreError::NotATable(table.to_owned()).into()),
    None => return Err(CoreError::TableNotFound(table.to_owned()).into()),
  }
  Ok(
    introspect::primary_key_columns(conn, table)?
      .into_iter()
      .map(|c| c.name)
      .collect(),
  )
}

pub fn is_tracked(conn: &Connection, table: &str) -> Result<bool> {
  introspect::table_exists(conn, &naming::shadow_table_name(table))
}

/// Tables that have a shadow table and still exist themselves, sorted.
pub fn tracked_tables(conn: &Connection) -> Result<Vec<String>> {
  let names = introspect::table_names(conn)?;
  Ok(
    names
      .iter()
      .filter_map(|name| naming::tracked_table_name(name))
      .filter(|tracked| {
        names
          .iter()
          .any(|other| other.eq_ignore_ascii_case(tracked))
      })
      .map(str::to_owned)
      .collect(),
  )
}
