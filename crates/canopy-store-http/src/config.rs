//! Connection settings for the remote bucket.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Deserializer, de};

use crate::{Error, Result};

fn default_timeout_secs() -> u64 { 30 }

fn default_region() -> String { "us-east-1".to_owned() }

/// Accepts `30` or `"30"`. Environment overrides arrive as strings, and an
/// internally tagged parent enum buffers them before this field sees them.
fn deserialize_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Secs {
    Number(u64),
    Text(String),
  }

  match Secs::deserialize(deserializer)? {
    Secs::Number(secs) => Ok(secs),
    Secs::Text(text) => text.trim().parse().map_err(|_| {
      de::Error::invalid_value(de::Unexpected::Str(&text), &"a whole number of seconds")
    }),
  }
}

/// Everything needed to reach the remote object store.
///
/// Deserialised from the application config and checked with
/// [`RemoteStoreConfig::validate`] before any request is made.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStoreConfig {
  /// Base URL of the S3-compatible service, e.g. `https://s3.example.org`.
  pub endpoint:     String,
  pub bucket:       String,
  /// Signing region. MinIO and most S3-compatible services accept the
  /// default.
  #[serde(default = "default_region")]
  pub region:       String,
  pub credentials:  Credentials,
  #[serde(default = "default_timeout_secs", deserialize_with = "deserialize_secs")]
  pub timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
  pub access_key_id:     String,
  pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("access_key_id", &self.access_key_id)
      .field("secret_access_key", &"<redacted>")
      .finish()
  }
}

impl RemoteStoreConfig {
  pub fn validate(&self) -> Result<()> {
    let endpoint = Url::parse(&self.endpoint).map_err(|e| Error::InvalidConfig {
      field:  "endpoint",
      reason: e.to_string(),
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
      return Err(Error::InvalidConfig {
        field:  "endpoint",
        reason: format!("unsupported scheme {:?}", endpoint.scheme()),
      });
    }
    if endpoint.query().is_some() || endpoint.fragment().is_some() {
      return Err(Error::InvalidConfig {
        field:  "endpoint",
        reason: "must not carry a query or fragment".into(),
      });
    }

    validate_bucket(&self.bucket)?;

    if self.region.trim().is_empty() {
      return Err(Error::InvalidConfig {
        field:  "region",
        reason: "must not be empty".into(),
      });
    }

    if self.credentials.access_key_id.trim().is_empty() {
      return Err(Error::InvalidConfig {
        field:  "credentials.access_key_id",
        reason: "must not be empty".into(),
      });
    }
    if self.credentials.secret_access_key.is_empty() {
      return Err(Error::InvalidConfig {
        field:  "credentials.secret_access_key",
        reason: "must not be empty".into(),
      });
    }
    if self.timeout_secs == 0 {
      return Err(Error::InvalidConfig {
        field:  "timeout_secs",
        reason: "must be at least 1".into(),
      });
    }
    Ok(())
  }
}

/// S3 bucket naming: 3 to 63 characters of lowercase letters, digits, `-`
/// and `.`, starting and ending with a letter or digit.
fn validate_bucket(bucket: &str) -> Result<()> {
  let invalid = |reason: &str| Error::InvalidConfig {
    field:  "bucket",
    reason: format!("{bucket:?} {reason}"),
  };

  if !(3..=63).contains(&bucket.len()) {
    return Err(invalid("must be 3 to 63 characters long"));
  }
  if !bucket
    .bytes()
    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
  {
    return Err(invalid("may only contain lowercase letters, digits, '-' and '.'"));
  }
  let edge_ok = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_alphanumeric());
  if !edge_ok(bucket.bytes().next()) || !edge_ok(bucket.bytes().last()) {
    return Err(invalid("must start and end with a letter or digit"));
  }
  Ok(())
}
