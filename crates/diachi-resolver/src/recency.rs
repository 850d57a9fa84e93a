//! Recently chosen addresses, persisted through a [`KeyValueStore`].
//!
//! The list is loaded once when the cache is created and rewritten in full
//! after every promotion. Storage problems never reach the caller: a broken
//! or missing entry reads as an empty list, a failed write keeps the
//! in-memory list.

use chrono::{DateTime, Utc};
use diachi_core::{Candidate, KeyValueStore, Result, matching::same_place};
use tracing::{debug, warn};

use crate::popular::popular_places;

/// Storage key holding the JSON array of recent candidates.
pub const RECENT_ADDRESSES_KEY: &str = "mymaid_recent_addresses";
/// How many recents are kept.
pub const RECENT_CAPACITY: usize = 5;
/// How many defaults are shown when there are no recents.
pub const DEFAULTS_CAPACITY: usize = 6;

pub struct RecencyCache<K> {
  store:   K,
  key:     String,
  entries: Vec<Candidate>,
}

impl<K: KeyValueStore> RecencyCache<K> {
  /// Load the persisted list under [`RECENT_ADDRESSES_KEY`].
  pub fn load(store: K) -> Self { Self::load_from(store, RECENT_ADDRESSES_KEY) }

  pub fn load_from(store: K, key: impl Into<String>) -> Self {
    let key = key.into();
    let entries = match read(&store, &key) {
      Ok(entries) => entries,
      Err(e) => {
        warn!(key = %key, error = %e, "discarding unreadable recent addresses");
        Vec::new()
      }
    };
    debug!(key = %key, count = entries.len(), "loaded recent addresses");
    Self { store, key, entries }
  }

  /// Most recent first.
  pub fn entries(&self) -> &[Candidate] { &self.entries }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Move `candidate` to the front, stamped with the current time.
  pub fn promote(&mut self, candidate: &Candidate) {
    self.promote_at(candidate, Utc::now());
  }

  pub fn promote_at(&mut self, candidate: &Candidate, at: DateTime<Utc>) {
    self.entries.retain(|c| c.id != candidate.id);
    self.entries.insert(0, candidate.promoted(at));
    self.entries.truncate(RECENT_CAPACITY);
    if let Err(e) = self.persist() {
      warn!(key = %self.key, error = %e, "failed to persist recent addresses");
    }
  }

  /// Forget every recent, in memory and in storage.
  pub fn clear(&mut self) -> Result<()> {
    self.entries.clear();
    self.store.remove(&self.key)?;
    Ok(())
  }

  /// What to show while the input is empty: the recents if there are any,
  /// otherwise provider suggestions followed by the popular places, with
  /// duplicates removed.
  pub fn list_defaults(&self, suggestions: &[Candidate]) -> Vec<Candidate> {
    if !self.entries.is_empty() {
      return self.entries.clone();
    }
    let mut defaults: Vec<Candidate> = Vec::with_capacity(DEFAULTS_CAPACITY);
    for candidate in suggestions.iter().cloned().chain(popular_places()) {
      if defaults.len() == DEFAULTS_CAPACITY {
        break;
      }
      if !defaults.iter().any(|d| same_place(d, &candidate)) {
        defaults.push(candidate);
      }
    }
    defaults
  }

  fn persist(&self) -> Result<()> {
    let json = serde_json::to_string(&self.entries)?;
    self.store.set(&self.key, &json)?;
    Ok(())
  }
}

fn read<K: KeyValueStore>(store: &K, key: &str) -> Result<Vec<Candidate>> {
  let Some(raw) = store.get(key)? else {
    return Ok(Vec::new());
  };
  let mut entries: Vec<Candidate> = serde_json::from_str(&raw)?;
  let mut seen = Vec::with_capacity(entries.len());
  entries.retain(|c| {
    let fresh = !seen.contains(&c.id);
    seen.push(c.id.clone());
    fresh
  });
  entries.truncate(RECENT_CAPACITY);
  Ok(entries)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::TimeZone;
  use diachi_core::{MemoryStore, Source, StorageError};

  use super::*;
  use crate::testing::candidate;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn missing_key_loads_empty() {
    let cache = RecencyCache::load(MemoryStore::new());
    assert!(cache.is_empty());
  }

  #[test]
  fn malformed_json_loads_empty() {
    let store = MemoryStore::new();
    store.set(RECENT_ADDRESSES_KEY, "{not json").unwrap();
    assert!(RecencyCache::load(store).is_empty());
  }

  #[test]
  fn keeps_the_five_most_recent() {
    let mut cache = RecencyCache::load(MemoryStore::new());
    for i in 0..7 {
      cache.promote_at(&candidate(&format!("c{i}"), &format!("Place {i}"), 0.5), at(i));
    }
    let ids: Vec<_> = cache.entries().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c6", "c5", "c4", "c3", "c2"]);
    assert_eq!(cache.entries()[0].timestamp, Some(at(6)));
  }

  #[test]
  fn re_promoting_moves_to_front_without_duplicating() {
    let mut cache = RecencyCache::load(MemoryStore::new());
    let a = candidate("a", "A", 0.5);
    let b = candidate("b", "B", 0.5);
    cache.promote_at(&a, at(1));
    cache.promote_at(&b, at(2));
    cache.promote_at(&a, at(3));

    let ids: Vec<_> = cache.entries().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(cache.entries()[0].timestamp, Some(at(3)));
  }

  #[test]
  fn promotions_survive_a_reload() {
    let store = Arc::new(MemoryStore::new());
    let mut cache = RecencyCache::load(Arc::clone(&store));
    cache.promote_at(&candidate("a", "A", 0.5), at(1));
    cache.promote_at(&candidate("b", "B", 0.5), at(2));

    let reloaded = RecencyCache::load(store);
    assert_eq!(reloaded.entries(), cache.entries());
  }

  #[test]
  fn loaded_lists_are_deduplicated_and_capped() {
    let list: Vec<_> = ["a", "a", "b", "c", "d", "e", "f"]
      .iter()
      .map(|id| candidate(id, id, 0.1))
      .collect();
    let store = MemoryStore::new();
    store.set(RECENT_ADDRESSES_KEY, &serde_json::to_string(&list).unwrap()).unwrap();

    let cache = RecencyCache::load(store);
    let ids: Vec<_> = cache.entries().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c", "d", "e"]);
  }

  struct ReadOnly;

  impl KeyValueStore for ReadOnly {
    fn get(&self, _: &str) -> std::result::Result<Option<String>, StorageError> { Ok(None) }

    fn set(&self, _: &str, _: &str) -> std::result::Result<(), StorageError> {
      Err(StorageError::Backend("read-only".into()))
    }

    fn remove(&self, _: &str) -> std::result::Result<(), StorageError> {
      Err(StorageError::Backend("read-only".into()))
    }
  }

  #[test]
  fn failed_write_keeps_the_in_memory_list() {
    let mut cache = RecencyCache::load(ReadOnly);
    cache.promote_at(&candidate("a", "A", 0.5), at(1));
    assert_eq!(cache.entries().len(), 1);
    assert!(cache.clear().is_err());
    assert!(cache.is_empty());
  }

  #[test]
  fn clear_removes_the_persisted_list() {
    let store = Arc::new(MemoryStore::new());
    let mut cache = RecencyCache::load(Arc::clone(&store));
    cache.promote_at(&candidate("a", "A", 0.5), at(1));
    cache.clear().unwrap();
    assert_eq!(store.get(RECENT_ADDRESSES_KEY).unwrap(), None);
  }

  #[test]
  fn defaults_prefer_recents() {
    let mut cache = RecencyCache::load(MemoryStore::new());
    cache.promote_at(&candidate("a", "A", 0.5), at(1));
    let defaults = cache.list_defaults(&[candidate("s", "S", 0.0)]);
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, "a");
  }

  #[test]
  fn defaults_without_recents_merge_suggestions_and_popular_places() {
    let cache = RecencyCache::load(MemoryStore::new());
    let suggestion = candidate("directory:9", "quan 1", 0.0);
    let defaults = cache.list_defaults(&[suggestion]);

    assert_eq!(defaults.len(), DEFAULTS_CAPACITY);
    assert_eq!(defaults[0].id, "directory:9");
    // The popular "Quận 1" folds to the same name and is dropped.
    assert!(defaults.iter().all(|c| c.id != "popular:quan-1"));
    assert!(defaults[1..].iter().all(|c| c.source == Source::Popular));
  }
}
