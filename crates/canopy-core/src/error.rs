//! Error types for `canopy-core`.
//!
//! Everything here is a contract violation by the caller. Scoring never
//! produces errors; missing inputs surface as absent derived values instead.

use thiserror::Error;

use crate::action::ActionType;

#[derive(Debug, Error)]
pub enum Error {
  #[error("index {index} is out of range for a list of {len} actions")]
  InvalidIndex { index: usize, len: usize },

  #[error("action {action_id} is {found}, expected {expected}")]
  WrongActionType {
    action_id: String,
    expected:  ActionType,
    found:     ActionType,
  },

  #[error("unknown city: {0:?}")]
  UnknownCity(String),

  #[error("malformed location code: {0:?}")]
  InvalidLocode(String),

  #[error("city {0:?} is registered more than once")]
  DuplicateCity(String),

  #[error("location code {0} is registered more than once")]
  DuplicateLocode(String),

  #[error("resilience answer for {question} is {value}, expected 0..=4")]
  AnswerOutOfRange { question: &'static str, value: u8 },

  #[error("cache capacity must be greater than zero")]
  ZeroCapacity,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
