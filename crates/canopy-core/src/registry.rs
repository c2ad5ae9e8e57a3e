//! City registry. Resolves display names to stable location codes.
//!
//! Storage keys are derived from a city's location code (UN/LOCODE style,
//! e.g. `BR RIO`), never from its display name. The registry is static for
//! the lifetime of a process; it is validated once at construction.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Locode ──────────────────────────────────────────────────────────────────

/// A validated location code: two uppercase country letters, a space, and
/// three uppercase letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locode(String);

impl Locode {
  pub fn parse(s: &str) -> Result<Self> {
    let bytes = s.as_bytes();
    let valid = bytes.len() == 6
      && bytes[..2].iter().all(u8::is_ascii_uppercase)
      && bytes[2] == b' '
      && bytes[3..]
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if valid {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidLocode(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Locode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for Locode {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<Locode> for String {
  fn from(value: Locode) -> Self { value.0 }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
  pub name:   String,
  pub locode: Locode,
}

/// Cities shipped with the binary, used when no registry is configured.
const BUILTIN: &[(&str, &str)] = &[
  ("Belo Horizonte", "BR BHZ"),
  ("Brasília", "BR BSB"),
  ("Curitiba", "BR CWB"),
  ("Fortaleza", "BR FOR"),
  ("Manaus", "BR MAO"),
  ("Porto Alegre", "BR POA"),
  ("Recife", "BR REC"),
  ("Rio de Janeiro", "BR RIO"),
  ("Salvador", "BR SSA"),
  ("São Paulo", "BR SAO"),
];

#[derive(Debug, Clone)]
pub struct CityRegistry {
  by_name: BTreeMap<String, Locode>,
}

impl CityRegistry {
  /// Build a registry, rejecting duplicate names or location codes.
  pub fn new(cities: impl IntoIterator<Item = City>) -> Result<Self> {
    let mut by_name = BTreeMap::new();
    for city in cities {
      if by_name.values().any(|l| *l == city.locode) {
        return Err(Error::DuplicateLocode(city.locode.to_string()));
      }
      if by_name.insert(city.name.clone(), city.locode).is_some() {
        return Err(Error::DuplicateCity(city.name));
      }
    }
    Ok(Self { by_name })
  }

  pub fn builtin() -> Result<Self> {
    let cities = BUILTIN
      .iter()
      .map(|(name, code)| {
        Ok(City {
          name:   (*name).to_owned(),
          locode: Locode::parse(code)?,
        })
      })
      .collect::<Result<Vec<_>>>()?;
    Self::new(cities)
  }

  /// Resolve a display name to its location code.
  pub fn locode(&self, city: &str) -> Result<&Locode> {
    self
      .by_name
      .get(city)
      .ok_or_else(|| Error::UnknownCity(city.to_owned()))
  }

  pub fn cities(&self) -> impl Iterator<Item = (&str, &Locode)> + '_ {
    self.by_name.iter().map(|(name, code)| (name.as_str(), code))
  }

  pub fn len(&self) -> usize { self.by_name.len() }

  pub fn is_empty(&self) -> bool { self.by_name.is_empty() }
}
