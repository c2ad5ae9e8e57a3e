//! [`SqliteObjectStore`]: the SQLite implementation of [`ObjectStore`].

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use canopy_core::store::{ObjectStore, StorageKey, content_digest};

use crate::{
  Result,
  encode::{RawObjectMeta, encode_dt},
  schema::SCHEMA,
};

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
  pub key:          String,
  pub size:         u64,
  /// Hex SHA-256 of the body.
  pub content_hash: String,
  pub updated_at:   DateTime<Utc>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An object store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteObjectStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteObjectStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Metadata for `key` without reading the body. `None` if absent.
  pub async fn head(&self, key: &StorageKey) -> Result<Option<ObjectMeta>> {
    let key_str = key.as_str().to_owned();

    let raw: Option<RawObjectMeta> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT object_key, length(body), content_hash, updated_at
             FROM objects WHERE object_key = ?1",
            rusqlite::params![key_str],
            |row| {
              Ok(RawObjectMeta {
                object_key:   row.get(0)?,
                size:         row.get(1)?,
                content_hash: row.get(2)?,
                updated_at:   row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawObjectMeta::into_meta).transpose()
  }

  async fn read(&self, key: &StorageKey) -> Result<Option<Bytes>> {
    let key_str = key.as_str().to_owned();

    let body: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT body FROM objects WHERE object_key = ?1",
            rusqlite::params![key_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    tracing::debug!(%key, found = body.is_some(), "sqlite get");
    Ok(body.map(Bytes::from))
  }

  async fn write(&self, key: &StorageKey, body: Bytes) -> Result<()> {
    let key_str      = key.as_str().to_owned();
    let content_hash = content_digest(&body);
    let updated_at   = encode_dt(Utc::now());
    let size         = body.len();
    let body         = body.to_vec();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO objects (object_key, body, content_hash, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (object_key) DO UPDATE SET
             body         = excluded.body,
             content_hash = excluded.content_hash,
             updated_at   = excluded.updated_at",
          rusqlite::params![key_str, body, content_hash, updated_at],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%key, size, "sqlite put");
    Ok(())
  }
}

// ─── ObjectStore impl ────────────────────────────────────────────────────────

impl ObjectStore for SqliteObjectStore {
  type Error = crate::Error;

  async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>> {
    self.read(key).await
  }

  async fn put(&self, key: &StorageKey, body: Bytes) -> Result<()> {
    self.write(key, body).await
  }

  /// Answered from the stored `content_hash` column.
  async fn digest(&self, key: &StorageKey) -> Result<Option<String>> {
    Ok(self.head(key).await?.map(|meta| meta.content_hash))
  }
}
