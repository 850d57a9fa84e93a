//! Provider traits implemented by geocoding backends.
//!
//! The traits are object-safe: the resolver holds a heterogeneous list of
//! `Arc<dyn AddressProvider>` and fans a query out to all of them, so every
//! method returns a boxed `Send` future.

use futures::future::BoxFuture;

use crate::{
  candidate::{Candidate, Coordinates, Source},
  error::ProviderError,
};

/// Free-text address search against one backend.
///
/// An empty result list is success, not an error. Implementations must not
/// cache; caching belongs to the caller.
pub trait AddressProvider: Send + Sync {
  /// Which backend this is. Stamped on every returned candidate.
  fn source(&self) -> Source;

  /// Search for up to `limit` candidates matching `query`, optionally biased
  /// towards `proximity`.
  fn search<'a>(
    &'a self,
    query: &'a str,
    proximity: Option<Coordinates>,
    limit: usize,
  ) -> BoxFuture<'a, Result<Vec<Candidate>, ProviderError>>;

  /// Default suggestions shown while the input is empty.
  fn suggestions(&self) -> BoxFuture<'_, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(async { Ok(Vec::new()) })
  }
}

/// Coordinates-to-address lookup, used by the map confirmation flow.
pub trait ReverseGeocoder: Send + Sync {
  fn reverse_geocode(
    &self,
    coordinates: Coordinates,
  ) -> BoxFuture<'_, Result<Candidate, ProviderError>>;
}
