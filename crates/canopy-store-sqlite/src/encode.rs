//! Encoding and decoding helpers between Rust types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings.

use chrono::{DateTime, Utc};

use crate::{Error, Result, store::ObjectMeta};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Raw column values for an `objects` row, without the body.
pub struct RawObjectMeta {
  pub object_key:   String,
  pub size:         i64,
  pub content_hash: String,
  pub updated_at:   String,
}

impl RawObjectMeta {
  pub fn into_meta(self) -> Result<ObjectMeta> {
    Ok(ObjectMeta {
      key:          self.object_key,
      size:         self.size.max(0) as u64,
      content_hash: self.content_hash,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
