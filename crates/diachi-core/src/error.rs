//! Error types for `diachi-core`.

use thiserror::Error;

/// Why a single provider call did not produce a result.
///
/// Callers that aggregate over several providers treat every variant the
/// same way ("this source failed"); the split exists for logging and for
/// callers that talk to one provider directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
  /// Network failure, timeout or a non-success HTTP status.
  #[error("transport error: {0}")]
  Transport(String),

  /// Missing or rejected credential, or an unusable endpoint configuration.
  #[error("configuration error: {0}")]
  Config(String),

  /// The upstream answered but the payload could not be understood.
  #[error("malformed payload: {0}")]
  Data(String),
}

/// A failure reported by a [`KeyValueStore`](crate::storage::KeyValueStore)
/// backend.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage backend error: {0}")]
  Backend(String),

  #[error("storage lock poisoned")]
  Poisoned,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error(transparent)]
  Storage(#[from] StorageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
