//! Read-only schema introspection over `sqlite_master` and
//! `pragma_table_info`.

use rusqlite::{Connection, OptionalExtension as _};

use crate::{sql::quote_ident, Result};

/// One column as reported by `pragma_table_info`.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
  pub name:      String,
  /// Declared type, empty when the column has none.
  pub decl_type: String,
  /// 1-based position within the primary key, 0 for non-key columns.
  pub pk:        i64,
  /// Collating sequence, when it is not `BINARY`. Only filled in by
  /// [`key_collation`].
  pub collation: Option<String>,
}

/// Kind of the table, view or index named `name`. Triggers live in their own
/// namespace and are ignored here.
pub fn object_type(conn: &Connection, name: &str) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT type FROM sqlite_master
         WHERE type IN ('table', 'view', 'index') AND name = ?1 COLLATE NOCASE",
        [name],
        |row| row.get(0),
      )
      .optional()?,
  )
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
  Ok(object_type(conn, name)?.as_deref() == Some("table"))
}

/// The table a trigger named `trigger` is attached to, if it exists.
pub fn trigger_table(conn: &Connection, trigger: &str) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT tbl_name FROM sqlite_master
         WHERE type = 'trigger' AND name = ?1 COLLATE NOCASE",
        [trigger],
        |row| row.get(0),
      )
      .optional()?,
  )
}

pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
  let mut stmt =
    conn.prepare("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")?;
  let columns = stmt
    .query_map([table], |row| {
      Ok(ColumnInfo {
        name:      row.get(0)?,
        decl_type: row.get(1)?,
        pk:        row.get(2)?,
        collation: None,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(columns)
}

/// Primary-key columns of `table` in key order. Empty for tables keyed only
/// by rowid.
pub fn primary_key_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
  let mut keys: Vec<ColumnInfo> = table_columns(conn, table)?
    .into_iter()
    .filter(|c| c.pk > 0)
    .collect();
  keys.sort_by_key(|c| c.pk);
  Ok(keys)
}

/// Collating sequence `column` of `table` compares with, read from the index
/// that enforces its uniqueness (the primary key first). `None` means
/// `BINARY`, which is also what an unindexed or `INTEGER PRIMARY KEY` column
/// reports.
pub fn key_collation(conn: &Connection, table: &str, column: &str) -> Result<Option<String>> {
  let collation: Option<String> = conn
    .query_row(
      "SELECT x.coll
       FROM pragma_index_list(?1) AS l, pragma_index_xinfo(l.name) AS x
       WHERE x.name = ?2 COLLATE NOCASE AND x.key = 1
       ORDER BY CASE l.origin WHEN 'pk' THEN 0 WHEN 'u' THEN 1 ELSE 2 END
       LIMIT 1",
      [table, column],
      |row| row.get(0),
    )
    .optional()?;
  Ok(collation.filter(|c| !c.eq_ignore_ascii_case("BINARY")))
}

/// Whether any row of `table` has NULL in `column`.
pub fn has_nulls(conn: &Connection, table: &str, column: &str) -> Result<bool> {
  Ok(conn.query_row(
    &format!(
      "SELECT EXISTS (SELECT 1 FROM {} WHERE {} IS NULL)",
      quote_ident(table),
      quote_ident(column)
    ),
    [],
    |row| row.get(0),
  )?)
}

/// Names of every ordinary table, sorted.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt =
    conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
  let names = stmt
    .query_map([], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}
