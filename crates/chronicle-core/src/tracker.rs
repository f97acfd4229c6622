//! The `ChangeTracker` trait.
//!
//! Implemented by storage backends (e.g. `chronicle-sqlite`). Calling layers
//! such as the CLI depend on this abstraction, and decide for themselves who
//! may enable or disable tracking.

use std::future::Future;

use crate::{
  revision::Revision,
  shadow::{ShadowRow, SinceFilter, UpgradeOutcome, Version},
};

/// Abstraction over a change-tracking backend.
///
/// Every schema-changing operation is a single transaction: it either fully
/// applies or leaves the database untouched.
pub trait ChangeTracker: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema management ─────────────────────────────────────────────────

  /// Create the shadow table for `table`, backfill it and install triggers.
  ///
  /// Returns the maximum version after backfill, which equals the number of
  /// pre-existing rows.
  fn enable<'a>(
    &'a self,
    table: &'a str,
    primary_keys: &'a [String],
  ) -> impl Future<Output = Result<Version, Self::Error>> + Send + 'a;

  /// Drop the triggers and shadow table. All history is lost.
  fn disable<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Classify the shadow table of `table`.
  fn detect_revision<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + 'a;

  /// Migrate the shadow table of `table` to [`Revision::CURRENT`].
  /// Idempotent.
  fn upgrade<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<UpgradeOutcome, Self::Error>> + Send + 'a;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Shadow rows with a version strictly greater than `since`, tombstones
  /// included, in version order.
  fn changed_since<'a>(
    &'a self,
    table: &'a str,
    since: Version,
  ) -> impl Future<Output = Result<Vec<ShadowRow>, Self::Error>> + Send + 'a;

  /// Latest version of `table`, or `0` when nothing has been recorded.
  fn max_version<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Version, Self::Error>> + Send + 'a;

  /// Predicate selecting tracked rows changed since a bound version.
  fn since_filter<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<SinceFilter, Self::Error>> + Send + 'a;

  // ── Discovery ─────────────────────────────────────────────────────────

  /// The primary-key columns of `table`, in key order.
  fn primary_keys<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  fn is_tracked<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every table with a shadow table, sorted by name.
  fn tracked_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
