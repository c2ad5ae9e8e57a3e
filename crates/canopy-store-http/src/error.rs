//! Error type for `canopy-store-http`.

use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid remote store config: {field}: {reason}")]
  InvalidConfig { field: &'static str, reason: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {key} returned {status}")]
  Status {
    method: Method,
    key:    String,
    status: StatusCode,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
