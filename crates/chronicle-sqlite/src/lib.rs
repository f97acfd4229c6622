//! SQLite backend for chronicle change tracking.
//!
//! [`engine`] exposes the synchronous operations over a plain
//! [`rusqlite::Connection`], for callers that already own one.
//! [`SqliteChronicle`] wraps [`tokio_rusqlite`] so the same operations run on
//! a dedicated thread without blocking the async runtime.

mod encode;
mod introspect;
mod migrate;
mod query;
mod schema;
mod sql;
mod tracker;
mod triggers;

pub mod engine;
pub mod error;

pub use error::{Error, Result};
pub use tracker::SqliteChronicle;
