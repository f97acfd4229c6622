//! [`SqliteChronicle`] is the async SQLite implementation of
//! [`ChangeTracker`].

use std::{path::Path, sync::Arc};

use chronicle_core::{
  ChangeTracker, Clock, Revision, ShadowRow, SinceFilter, SystemClock, UpgradeOutcome, Version,
};
use tokio::sync::Mutex;

use crate::{engine, Error, Result};

// ─── Handle ──────────────────────────────────────────────────────────────────

/// A chronicle handle over one SQLite database.
///
/// Cloning is cheap; clones share the connection, the clock and the
/// "upgrade check done" flag.
#[derive(Clone)]
pub struct SqliteChronicle {
  conn:     tokio_rusqlite::Connection,
  clock:    Arc<dyn Clock>,
  upgraded: Arc<Mutex<bool>>,
}

impl SqliteChronicle {
  /// Open (or create) the database at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::prepared(conn).await
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::prepared(conn).await
  }

  async fn prepared(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| Ok(engine::prepare_connection(conn)))
      .await??;
    Ok(Self::from_connection(conn))
  }

  /// Wrap a connection opened elsewhere. It is used as is; see
  /// [`engine::prepare_connection`] for the settings the triggers expect.
  pub fn from_connection(conn: tokio_rusqlite::Connection) -> Self {
    Self {
      conn,
      clock: Arc::new(SystemClock),
      upgraded: Arc::new(Mutex::new(false)),
    }
  }

  /// Replace the clock used to stamp backfilled rows.
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  /// The underlying connection, for the caller's own reads and writes to
  /// tracked tables.
  pub fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Upgrade every tracked table in one transaction.
  pub async fn upgrade_all(&self) -> Result<Vec<(String, UpgradeOutcome)>> {
    self
      .conn
      .call(|conn| Ok(engine::upgrade_all(conn)))
      .await?
  }

  /// Run [`upgrade_all`](Self::upgrade_all) at most once per handle.
  ///
  /// Later calls return an empty list without touching the database. A
  /// failed attempt does not count, so the next call retries.
  pub async fn ensure_upgraded(&self) -> Result<Vec<(String, UpgradeOutcome)>> {
    let mut done = self.upgraded.lock().await;
    if *done {
      return Ok(Vec::new());
    }
    let outcomes = self.upgrade_all().await?;
    *done = true;
    Ok(outcomes)
  }
}

// ─── ChangeTracker impl ──────────────────────────────────────────────────────

impl ChangeTracker for SqliteChronicle {
  type Error = Error;

  // ── Schema management ─────────────────────────────────────────────────────

  async fn enable(&self, table: &str, primary_keys: &[String]) -> Result<Version> {
    let table = table.to_owned();
    let primary_keys = primary_keys.to_vec();
    let now_ms = self.clock.now_ms();

    self
      .conn
      .call(move |conn| Ok(engine::enable(conn, &table, &primary_keys, now_ms)))
      .await?
  }

  async fn disable(&self, table: &str) -> Result<()> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::disable(conn, &table)))
      .await?
  }

  async fn detect_revision(&self, table: &str) -> Result<Revision> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::detect_revision(conn, &table)))
      .await?
  }

  async fn upgrade(&self, table: &str) -> Result<UpgradeOutcome> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::upgrade(conn, &table)))
      .await?
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn changed_since(&self, table: &str, since: Version) -> Result<Vec<ShadowRow>> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::changed_since(conn, &table, since)))
      .await?
  }

  async fn max_version(&self, table: &str) -> Result<Version> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::max_version(conn, &table)))
      .await?
  }

  async fn since_filter(&self, table: &str) -> Result<SinceFilter> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::since_filter(conn, &table)))
      .await?
  }

  // ── Discovery ─────────────────────────────────────────────────────────────

  async fn primary_keys(&self, table: &str) -> Result<Vec<String>> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::primary_keys(conn, &table)))
      .await?
  }

  async fn is_tracked(&self, table: &str) -> Result<bool> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(engine::is_tracked(conn, &table)))
      .await?
  }

  async fn tracked_tables(&self) -> Result<Vec<String>> {
    self
      .conn
      .call(|conn| Ok(engine::tracked_tables(conn)))
      .await?
  }
}
