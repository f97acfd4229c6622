//! Core types and trait definitions for chronicle change tracking.
//!
//! This crate is deliberately free of database dependencies. It names the
//! objects a tracked table owns, describes the shadow-table schema revisions,
//! and defines the [`ChangeTracker`] abstraction that storage backends
//! implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod key;
pub mod naming;
pub mod revision;
pub mod shadow;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use key::{KeyValue, PrimaryKey};
pub use revision::{EngineColumns, Revision};
pub use shadow::{ShadowRow, SinceFilter, UpgradeOutcome, Version};
pub use tracker::ChangeTracker;
