//! Core types and trait definitions for the diachi address resolver.
//!
//! This crate is deliberately free of HTTP, timer and database dependencies.
//! Provider adapters, storage backends and the resolver engine all depend on
//! it; it depends on nothing of theirs.

pub mod candidate;
pub mod error;
pub mod matching;
pub mod provider;
pub mod query;
pub mod storage;

pub use candidate::{
  AddressSelection, Candidate, CandidateKind, Components, Coordinates, Source,
};
pub use error::{Error, ProviderError, Result, StorageError};
pub use provider::{AddressProvider, ReverseGeocoder};
pub use query::Query;
pub use storage::{KeyValueStore, MemoryStore};
