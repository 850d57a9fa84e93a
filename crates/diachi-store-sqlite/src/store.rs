//! [`SqliteKvStore`], the SQLite implementation of [`KeyValueStore`].

use std::{
  path::Path,
  sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;
use diachi_core::{KeyValueStore, StorageError};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::warn;

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A key-value store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteKvStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    Self::init(conn)
  }

  /// Open an in-memory store, mostly for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Arc::new(Mutex::new(conn)) })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| Error::Poisoned)
  }

  pub fn get_value(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;
    let value = conn
      .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |r| {
        r.get(0)
      })
      .optional()?;
    Ok(value)
  }

  pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value      = excluded.value,
         updated_at = excluded.updated_at",
      params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  pub fn remove_value(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
  }
}

impl KeyValueStore for SqliteKvStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    self.get_value(key).map_err(|e| {
      warn!(key, error = %e, "kv read failed");
      e.into()
    })
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.set_value(key, value).map_err(|e| {
      warn!(key, error = %e, "kv write failed");
      e.into()
    })
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.remove_value(key).map_err(Into::into)
  }
}
