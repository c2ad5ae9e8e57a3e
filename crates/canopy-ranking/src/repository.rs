//! [`RankingRepository`]: reads and writes stored rankings.

use std::sync::Arc;

use bytes::Bytes;
use canopy_core::{
  action::{ActionType, ClimateAction},
  ranking,
  registry::CityRegistry,
  store::{ObjectStore, StorageKey, content_digest},
};

use crate::{Error, Result};

/// A ranking as read from the store.
#[derive(Debug, Clone)]
pub struct StoredRanking {
  /// Ordered by priority, with priorities re-densified.
  pub actions: Vec<ClimateAction>,
  /// Digest of the stored bytes.
  pub digest:  String,
}

/// Binds an [`ObjectStore`] to the city registry used to derive its keys.
#[derive(Clone)]
pub struct RankingRepository<S> {
  store:    S,
  registry: Arc<CityRegistry>,
}

impl<S: ObjectStore> RankingRepository<S> {
  pub fn new(store: S, registry: Arc<CityRegistry>) -> Self {
    Self { store, registry }
  }

  pub fn registry(&self) -> &CityRegistry { &self.registry }

  /// The storage key for `city`'s ranking of `action_type` actions.
  pub fn key_for(&self, city: &str, action_type: ActionType) -> Result<StorageKey> {
    let locode = self.registry.locode(city)?;
    Ok(StorageKey::for_ranking(action_type, locode))
  }

  /// Read the stored ranking. A missing object is [`Error::NotFound`].
  pub async fn fetch_ranking(
    &self,
    city: &str,
    action_type: ActionType,
  ) -> Result<StoredRanking> {
    let key = self.key_for(city, action_type)?;
    self.fetch(&key, action_type).await
  }

  /// Serialise `list` and write it as `city`'s ranking. Failures are
  /// returned as [`Error::StorageWrite`] and not retried. Returns the digest
  /// of the written bytes.
  pub async fn commit_ranking(
    &self,
    city: &str,
    action_type: ActionType,
    list: &[ClimateAction],
  ) -> Result<String> {
    let key = self.key_for(city, action_type)?;
    self.commit(&key, action_type, list).await
  }

  pub(crate) async fn fetch(
    &self,
    key: &StorageKey,
    action_type: ActionType,
  ) -> Result<StoredRanking> {
    let body = self.read(key).await?.ok_or_else(|| Error::NotFound {
      key: key.clone(),
    })?;

    let actions: Vec<ClimateAction> =
      serde_json::from_slice(&body).map_err(|e| Error::StorageRead {
        key:    key.clone(),
        source: Box::new(e),
      })?;
    ranking::ensure_partition(&actions, action_type)?;

    tracing::debug!(%key, actions = actions.len(), "fetched ranking");
    Ok(StoredRanking {
      actions: ranking::normalize(actions),
      digest:  content_digest(&body),
    })
  }

  pub(crate) async fn commit(
    &self,
    key: &StorageKey,
    action_type: ActionType,
    list: &[ClimateAction],
  ) -> Result<String> {
    ranking::ensure_partition(list, action_type)?;
    let body = Bytes::from(
      serde_json::to_vec_pretty(list).map_err(canopy_core::Error::from)?,
    );
    let digest = content_digest(&body);

    if let Err(e) = self.store.put(key, body).await {
      tracing::warn!(%key, error = %e, "ranking write failed");
      return Err(Error::StorageWrite {
        key:    key.clone(),
        source: Box::new(e),
      });
    }

    tracing::info!(%key, actions = list.len(), "committed ranking");
    Ok(digest)
  }

  /// Digest of the object currently stored at `key`, if any.
  pub(crate) async fn remote_digest(&self, key: &StorageKey) -> Result<Option<String>> {
    self.store.digest(key).await.map_err(|e| {
      tracing::warn!(%key, error = %e, "ranking digest failed");
      Error::StorageRead {
        key:    key.clone(),
        source: Box::new(e),
      }
    })
  }

  async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>> {
    self.store.get(key).await.map_err(|e| {
      tracing::warn!(%key, error = %e, "ranking read failed");
      Error::StorageRead {
        key:    key.clone(),
        source: Box::new(e),
      }
    })
  }
}
