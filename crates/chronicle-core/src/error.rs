//! Error types for `chronicle-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("cannot track {0:?}: it has no primary key")]
  NoPrimaryKey(String),

  #[error("chronicle tracking is already enabled for {0:?}")]
  AlreadyTracked(String),

  #[error("chronicle tracking is not enabled for {0:?}")]
  NotTracked(String),

  #[error("naming conflict: {0}")]
  NamingConflict(String),

  /// A shadow table exists but its columns match no known revision. It is
  /// never migrated automatically.
  #[error("shadow table {0:?} matches no known schema revision")]
  UnknownRevision(String),

  #[error("table not found: {0:?}")]
  TableNotFound(String),

  #[error("{0:?} is not a table")]
  NotATable(String),

  #[error("table {table:?} has no column {column:?}")]
  UnknownColumn { table: String, column: String },

  /// Key columns must identify one row each; NULL keys cannot.
  #[error("cannot track {table:?}: key column {column:?} holds NULL")]
  NullKey { table: String, column: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
