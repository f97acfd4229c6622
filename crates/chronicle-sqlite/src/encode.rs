//! Conversions between SQLite values and chronicle key values.

use chronicle_core::KeyValue;
use rusqlite::types::Value;

pub fn decode_key_value(value: Value) -> KeyValue {
  match value {
    Value::Null => KeyValue::Null,
    Value::Integer(i) => KeyValue::Integer(i),
    Value::Real(f) => KeyValue::Real(f),
    Value::Text(s) => KeyValue::Text(s),
    Value::Blob(b) => KeyValue::Blob(b),
  }
}

/// Raw shadow row as read from SQLite, before key decoding.
pub struct RawShadowRow {
  pub key:        Vec<Value>,
  pub added_ms:   i64,
  pub updated_ms: i64,
  pub version:    i64,
  pub deleted:    i64,
}

impl RawShadowRow {
  pub fn into_shadow_row(self) -> chronicle_core::ShadowRow {
    chronicle_core::ShadowRow {
      key:        self.key.into_iter().map(decode_key_value).collect::<Vec<_>>().into(),
      added_ms:   self.added_ms,
      updated_ms: self.updated_ms,
      version:    self.version,
      deleted:    self.deleted != 0,
    }
  }
}
