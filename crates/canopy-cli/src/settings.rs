//! Application configuration.
//!
//! Read from an optional TOML file layered with `CANOPY_*` environment
//! variables, where `__` separates nested keys (for example
//! `CANOPY_STORE__BUCKET`). Everything is validated before a store is opened.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use canopy_core::registry::{City, CityRegistry};
use canopy_store_http::RemoteStoreConfig;
use serde::Deserialize;

/// Where rankings are persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
  Sqlite { path: PathBuf },
  Http(RemoteStoreConfig),
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self::Sqlite {
      path: PathBuf::from("canopy.db"),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub store:  StoreConfig,
  /// Replaces the built-in city registry when present.
  #[serde(default)]
  pub cities: Option<Vec<City>>,
}

impl AppConfig {
  /// Build the city registry and check the store settings.
  pub fn validate(&self) -> anyhow::Result<CityRegistry> {
    if let StoreConfig::Http(remote) = &self.store {
      remote.validate().context("invalid [store] settings")?;
    }
    let registry = match &self.cities {
      Some(cities) => CityRegistry::new(cities.iter().cloned()),
      None => CityRegistry::builtin(),
    }
    .context("invalid city registry")?;
    Ok(registry)
  }
}

/// `CANOPY_*` variables; `CANOPY_STORE__TIMEOUT_SECS` sets `store.timeout_secs`.
fn environment() -> config::Environment {
  config::Environment::with_prefix("CANOPY")
    .prefix_separator("_")
    .separator("__")
}

pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(environment())
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?;

  settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")
}
