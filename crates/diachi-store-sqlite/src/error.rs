//! Error type for `diachi-store-sqlite`.

use diachi_core::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("connection lock poisoned")]
  Poisoned,
}

impl From<Error> for StorageError {
  fn from(e: Error) -> Self {
    match e {
      Error::Poisoned => StorageError::Poisoned,
      other => StorageError::Backend(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
