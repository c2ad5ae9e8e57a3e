//! HTTP backend for the Canopy object store.
//!
//! Talks to an S3-compatible bucket endpoint with path-style addressing:
//! `GET`/`PUT {endpoint}/{bucket}/{key}`, every request signed with AWS
//! Signature Version 4. All connection settings come from an explicit
//! [`RemoteStoreConfig`] that is validated before a client is built.

mod config;
mod sign;
mod store;

pub mod error;

pub use config::{Credentials, RemoteStoreConfig};
pub use error::{Error, Result};
pub use store::HttpObjectStore;
