//! A bounded least-recently-used cache.
//!
//! Caches are plain values owned by whichever component needs them; nothing
//! in this crate keeps a process-wide cache. [`GeocodeCache`] is the instance
//! used for geocoding results keyed by location code.

use std::{
  collections::{BTreeMap, HashMap},
  hash::Hash,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, registry::Locode};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

pub type GeocodeCache = LruCache<Locode, Coordinates>;

/// Fixed-capacity cache that evicts the least recently used entry once full.
///
/// Both [`LruCache::get`] and [`LruCache::insert`] count as a use.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
  capacity: usize,
  tick:     u64,
  entries:  HashMap<K, (V, u64)>,
  /// Last-use tick → key; the first entry is the eviction candidate.
  recency:  BTreeMap<u64, K>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
  pub fn new(capacity: usize) -> Result<Self> {
    if capacity == 0 {
      return Err(Error::ZeroCapacity);
    }
    Ok(Self {
      capacity,
      tick: 0,
      entries: HashMap::with_capacity(capacity),
      recency: BTreeMap::new(),
    })
  }

  pub fn capacity(&self) -> usize { self.capacity }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  fn next_tick(&mut self) -> u64 {
    self.tick += 1;
    self.tick
  }

  /// Look up `key`, marking it as most recently used.
  pub fn get(&mut self, key: &K) -> Option<&V> {
    let tick = self.next_tick();
    let (_, last_used) = self.entries.get_mut(key)?;
    self.recency.remove(&*last_used);
    *last_used = tick;
    self.recency.insert(tick, key.clone());
    self.entries.get(key).map(|(value, _)| value)
  }

  /// Whether `key` is cached, without touching its recency.
  pub fn contains(&self, key: &K) -> bool { self.entries.contains_key(key) }

  /// Insert or replace `key`. Returns the entry evicted to make room, if any.
  pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
    let tick = self.next_tick();
    if let Some((_, previous)) = self.entries.insert(key.clone(), (value, tick))
    {
      self.recency.remove(&previous);
      self.recency.insert(tick, key);
      return None;
    }
    self.recency.insert(tick, key);

    if self.entries.len() <= self.capacity {
      return None;
    }
    let (_, oldest) = self.recency.pop_first()?;
    let (value, _) = self.entries.remove(&oldest)?;
    Some((oldest, value))
  }

  pub fn remove(&mut self, key: &K) -> Option<V> {
    let (value, last_used) = self.entries.remove(key)?;
    self.recency.remove(&last_used);
    Some(value)
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    self.recency.clear();
  }
}
