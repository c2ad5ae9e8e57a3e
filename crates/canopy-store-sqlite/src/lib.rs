//! SQLite backend for the Canopy object store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Useful for single-host deployments and
//! as a durable stand-in for a remote bucket.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{ObjectMeta, SqliteObjectStore};
