//! Shadow-table schema revisions.
//!
//! The key columns of a shadow table mirror the tracked table; the remaining
//! four "engine" columns are what distinguishes one revision from another.
//! Revision `v1` used bare names that could collide with user key columns;
//! `v2` marks every engine column with a `__` prefix.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Names of the engine-owned columns for one revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineColumns {
  pub added:   &'static str,
  pub updated: &'static str,
  pub version: &'static str,
  pub deleted: &'static str,
}

impl EngineColumns {
  /// All four columns, in a fixed order shared by every revision.
  pub fn all(&self) -> [&'static str; 4] {
    [self.added, self.updated, self.version, self.deleted]
  }

  /// Whether `column` is one of these engine columns (case-insensitive, as
  /// SQLite column names are).
  pub fn contains(&self, column: &str) -> bool {
    self.all().iter().any(|c| c.eq_ignore_ascii_case(column))
  }
}

const V1_COLUMNS: EngineColumns = EngineColumns {
  added:   "added_ms",
  updated: "updated_ms",
  version: "version",
  deleted: "deleted",
};

const V2_COLUMNS: EngineColumns = EngineColumns {
  added:   "__added_ms",
  updated: "__updated_ms",
  version: "__version",
  deleted: "__deleted",
};

/// A shadow-table layout generation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Revision {
  V1,
  V2,
  /// The table exists but matches no known layout.
  Unknown,
}

impl Revision {
  /// The revision `enable` creates and `upgrade` migrates to.
  pub const CURRENT: Revision = Revision::V2;

  /// Every revision with a defined layout, oldest first.
  pub const KNOWN: [Revision; 2] = [Revision::V1, Revision::V2];

  /// Engine column names, or `None` for [`Revision::Unknown`].
  pub fn columns(self) -> Option<&'static EngineColumns> {
    match self {
      Revision::V1 => Some(&V1_COLUMNS),
      Revision::V2 => Some(&V2_COLUMNS),
      Revision::Unknown => None,
    }
  }

  pub fn is_current(self) -> bool { self == Self::CURRENT }

  /// Classify a shadow table by its non-key column names.
  ///
  /// The match is exact: extra or missing columns yield
  /// [`Revision::Unknown`].
  pub fn detect<'a>(non_key_columns: impl IntoIterator<Item = &'a str>) -> Revision {
    let mut found: Vec<&str> = non_key_columns.into_iter().collect();
    found.sort_unstable();

    Self::KNOWN
      .into_iter()
      .find(|revision| {
        let mut expected = revision.columns().map(EngineColumns::all).unwrap_or_default();
        expected.sort_unstable();
        found == expected
      })
      .unwrap_or(Revision::Unknown)
  }
}

/// The engine columns every newly created shadow table carries.
pub fn current_columns() -> &'static EngineColumns { &V2_COLUMNS }
