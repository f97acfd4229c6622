//! Wall-clock source for the timestamps chronicle writes outside triggers.

use chrono::Utc;

/// Supplies "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
  fn now_ms(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_ms(&self) -> i64 { Utc::now().timestamp_millis() }
}

/// A clock frozen at a given instant; handy in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
  fn now_ms(&self) -> i64 { self.0 }
}
