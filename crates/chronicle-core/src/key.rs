//! Primary-key values as they come out of a shadow table.

use serde::{Deserialize, Serialize};

/// A single key column value. Mirrors SQLite's storage classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Blob(Vec<u8>),
}

impl From<i64> for KeyValue {
  fn from(v: i64) -> Self { KeyValue::Integer(v) }
}

impl From<&str> for KeyValue {
  fn from(v: &str) -> Self { KeyValue::Text(v.to_owned()) }
}

impl From<String> for KeyValue {
  fn from(v: String) -> Self { KeyValue::Text(v) }
}

/// A full primary-key tuple, one value per key column in key order.
///
/// Single-column keys are just one-element tuples; nothing in chronicle
/// assumes a scalar key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKey(pub Vec<KeyValue>);

impl PrimaryKey {
  pub fn single(value: impl Into<KeyValue>) -> Self { Self(vec![value.into()]) }
}

impl From<Vec<KeyValue>> for PrimaryKey {
  fn from(values: Vec<KeyValue>) -> Self { Self(values) }
}
