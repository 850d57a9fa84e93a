//! The [`KeyValueStore`] trait and an in-memory implementation.
//!
//! Persisted recents live behind a plain string key-value capability so the
//! resolver does not care whether the bytes end up in SQLite, a file or a
//! browser's local storage.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use crate::error::StorageError;

/// Synchronous get/set/remove over string keys and values.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Arc<K> {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    (**self).get(key)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    (**self).set(key, value)
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    (**self).remove(key)
  }
}

/// A process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
    entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
    entries.remove(key);
    Ok(())
  }
}
