//! HTTP provider adapters for the diachi address resolver.
//!
//! Two backends are supported:
//!
//! - [`DirectoryClient`]: the national address directory: a hierarchical
//!   province/district lookup plus a free-text search endpoint.
//! - [`GeocoderClient`]: a Mapbox-places compatible worldwide geocoder with
//!   forward and reverse lookups.
//!
//! Both implement [`diachi_core::AddressProvider`]; the geocoder also
//! implements [`diachi_core::ReverseGeocoder`]. Neither caches anything.

mod http;

pub mod directory;
pub mod geocoder;

pub use directory::{DirectoryClient, DirectoryConfig, District, Province};
pub use geocoder::{GeocoderClient, GeocoderConfig};

#[cfg(test)]
mod tests;
