//! Error type for `canopy-ranking`.

use canopy_core::store::StorageKey;
use thiserror::Error;

use crate::Phase;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] canopy_core::Error),

  /// The read succeeded but there is no object at `key`. Callers usually
  /// treat this as an empty ranking.
  ///
  /// This is a storage read failure kept apart from [`Error::StorageRead`]
  /// so it can be matched on its own; [`Error::is_storage_read`] covers
  /// both.
  #[error("no stored ranking at {key}")]
  NotFound { key: StorageKey },

  /// The store failed, or the stored object could not be decoded.
  #[error("failed to read {key}: {source}")]
  StorageRead {
    key:    StorageKey,
    #[source]
    source: BoxError,
  },

  #[error("failed to write {key}: {source}")]
  StorageWrite {
    key:    StorageKey,
    #[source]
    source: BoxError,
  },

  #[error("a save for {key} is already in flight")]
  SaveInFlight { key: StorageKey },

  #[error("cannot {operation} while {phase}")]
  InvalidState {
    operation: &'static str,
    phase:     Phase,
  },

  #[error("no city is selected")]
  NoSelection,

  #[error("result for {key} discarded: the selection changed")]
  Stale { key: StorageKey },
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }

  /// Whether this is any failure to read a stored ranking, including a
  /// missing object.
  pub fn is_storage_read(&self) -> bool {
    matches!(self, Self::NotFound { .. } | Self::StorageRead { .. })
  }

  /// The storage key involved, if the error concerns one.
  pub fn key(&self) -> Option<&StorageKey> {
    match self {
      Self::NotFound { key }
      | Self::StorageRead { key, .. }
      | Self::StorageWrite { key, .. }
      | Self::SaveInFlight { key }
      | Self::Stale { key } => Some(key),
      Self::Core(_) | Self::InvalidState { .. } | Self::NoSelection => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
