//! SQLite backend for persisted resolver state.
//!
//! Implements [`diachi_core::KeyValueStore`] over a single `kv` table. Access
//! is synchronous: every call is one short statement on a mutex-guarded
//! connection.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteKvStore;
