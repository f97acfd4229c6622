//! Shadow-row and query result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{key::PrimaryKey, revision::Revision};

/// Position in a shadow table's change sequence. `0` means "no changes".
pub type Version = i64;

/// One row of a shadow table: the change metadata for one primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowRow {
  pub key:        PrimaryKey,
  /// Milliseconds since the epoch when the key was first seen.
  pub added_ms:   i64,
  /// Milliseconds since the epoch of the latest insert, update or delete.
  pub updated_ms: i64,
  pub version:    Version,
  /// Tombstone flag; the tracked row is gone but its history is kept.
  pub deleted:    bool,
}

impl ShadowRow {
  pub fn added_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(self.added_ms)
  }

  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(self.updated_ms)
  }
}

/// A ready-to-splice "changed since version V" predicate over a tracked
/// table.
///
/// The threshold is left as the named parameter [`SinceFilter::PARAM`] so
/// callers bind it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinceFilter {
  pub shadow_table: String,
  pub primary_keys: Vec<String>,
  /// SQL boolean expression over the tracked table's key columns.
  pub where_clause: String,
}

impl SinceFilter {
  /// Parameter name (without sigil) the predicate expects.
  pub const PARAM: &'static str = "chronicle_since";

  pub fn human_description(&self, since: Version) -> String {
    format!("modified since version {since}")
  }
}

/// What [`upgrade`](crate::ChangeTracker::upgrade) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpgradeOutcome {
  AlreadyCurrent,
  Upgraded { from: Revision },
}
