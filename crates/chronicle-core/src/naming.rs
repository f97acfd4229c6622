//! Deterministic names for the objects chronicle owns.
//!
//! Every name is derived from the tracked table's name alone, so a table's
//! shadow table, version index and triggers can always be located without
//! any bookkeeping table.

/// Prefix shared by every shadow table.
pub const SHADOW_PREFIX: &str = "_chronicle_";

/// The shadow table for `table`.
pub fn shadow_table_name(table: &str) -> String { format!("{SHADOW_PREFIX}{table}") }

/// The index over the shadow table's version column.
pub fn version_index_name(table: &str) -> String {
  format!("{SHADOW_PREFIX}{table}_version_idx")
}

/// Whether `name` carries the shadow prefix. SQLite identifiers are
/// case-insensitive, so the comparison is too.
pub fn is_shadow_table(name: &str) -> bool {
  name.len() >= SHADOW_PREFIX.len()
    && name.as_bytes()[..SHADOW_PREFIX.len()]
      .eq_ignore_ascii_case(SHADOW_PREFIX.as_bytes())
}

/// Inverse of [`shadow_table_name`].
pub fn tracked_table_name(shadow: &str) -> Option<&str> {
  is_shadow_table(shadow).then(|| &shadow[SHADOW_PREFIX.len()..])
}

/// The three row-level triggers installed on a tracked table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
  Insert,
  Update,
  Delete,
}

impl TriggerKind {
  pub const ALL: [TriggerKind; 3] =
    [TriggerKind::Insert, TriggerKind::Update, TriggerKind::Delete];

  /// The SQL event keyword the trigger fires on.
  pub fn event(self) -> &'static str {
    match self {
      TriggerKind::Insert => "INSERT",
      TriggerKind::Update => "UPDATE",
      TriggerKind::Delete => "DELETE",
    }
  }

  fn suffix(self) -> &'static str {
    match self {
      TriggerKind::Insert => "ai",
      TriggerKind::Update => "au",
      TriggerKind::Delete => "ad",
    }
  }
}

/// Name of the `kind` trigger on `table`, e.g. `_chronicle_dogs_ai`.
pub fn trigger_name(table: &str, kind: TriggerKind) -> String {
  format!("{SHADOW_PREFIX}{table}_{}", kind.suffix())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derived_names() {
    assert_eq!(shadow_table_name("dogs"), "_chronicle_dogs");
    assert_eq!(version_index_name("dogs"), "_chronicle_dogs_version_idx");
    assert_eq!(trigger_name("dogs", TriggerKind::Insert), "_chronicle_dogs_ai");
    assert_eq!(trigger_name("dogs", TriggerKind::Update), "_chronicle_dogs_au");
    assert_eq!(trigger_name("dogs", TriggerKind::Delete), "_chronicle_dogs_ad");
  }

  #[test]
  fn shadow_prefix_is_case_insensitive() {
    assert!(is_shadow_table("_chronicle_dogs"));
    assert!(is_shadow_table("_CHRONICLE_dogs"));
    assert!(!is_shadow_table("chronicle_dogs"));
    assert!(!is_shadow_table("_chron"));
  }

  #[test]
  fn tracked_name_round_trips() {
    assert_eq!(tracked_table_name(&shadow_table_name("a b")), Some("a b"));
    assert_eq!(tracked_table_name("dogs"), None);
  }
}
