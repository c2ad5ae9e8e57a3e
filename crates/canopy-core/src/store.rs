//! The `ObjectStore` trait and storage key derivation.
//!
//! The trait is implemented by storage backends (e.g. `canopy-store-sqlite`,
//! `canopy-store-http`). The ranking coordinator depends on this
//! abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::{action::ActionType, registry::Locode};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// A key in the remote object store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey(String);

impl StorageKey {
  /// `data/{action_type}/{locode}.json`
  pub fn for_ranking(action_type: ActionType, locode: &Locode) -> Self {
    Self(format!("data/{action_type}/{locode}.json"))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for StorageKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Digests ─────────────────────────────────────────────────────────────────

/// Hex SHA-256 of an object body; used to tell whether a stored object has
/// changed since it was last read or written.
pub fn content_digest(body: &[u8]) -> String {
  hex::encode(Sha256::digest(body))
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a keyed object store ("S3-like").
///
/// The store offers no compare-and-swap; callers that need single-writer
/// semantics must enforce them themselves.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the object at `key`. Returns `None` if it does not exist.
  fn get<'a>(
    &'a self,
    key: &'a StorageKey,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + 'a;

  /// Create or replace the object at `key`.
  fn put<'a>(
    &'a self,
    key: &'a StorageKey,
    body: Bytes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// [`content_digest`] of the object at `key`, or `None` if it does not
  /// exist. Backends that keep a stored hash should override this to skip
  /// reading the body.
  fn digest<'a>(
    &'a self,
    key: &'a StorageKey,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a {
    async move { Ok(self.get(key).await?.as_deref().map(content_digest)) }
  }
}
