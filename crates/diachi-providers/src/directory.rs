//! Async client for the national address directory.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/addresses/provinces` | Optional `?search=` |
//! | `GET`  | `/addresses/districts/{provinceId}` | Optional `?search=` |
//! | `GET`  | `/addresses/search` | `?q=&limit=` |
//! | `GET`  | `/addresses/suggestions` | Popular addresses |
//!
//! Every response is wrapped in a `{ "data": ..., "total": n }` envelope.

use std::time::Duration;

use diachi_core::{
  AddressProvider, Candidate, CandidateKind, Components, Coordinates,
  ProviderError, Source,
};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, get_json, join_url, opt_string_or_number, string_or_number};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for the directory API.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
  /// API root, e.g. `http://localhost:5000/api`.
  pub base_url: String,
  pub timeout:  Duration,
}

impl DirectoryConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      timeout:  Duration::from_secs(10),
    }
  }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
  data: T,
}

/// A first-level administrative unit (province or centrally-run city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
  #[serde(deserialize_with = "string_or_number")]
  pub id:   String,
  pub name: String,
  #[serde(default)]
  pub code: Option<String>,
  #[serde(rename = "type", default)]
  pub kind: Option<String>,
}

/// A second-level administrative unit inside a province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
  #[serde(deserialize_with = "string_or_number")]
  pub id:          String,
  pub name:        String,
  #[serde(default, deserialize_with = "opt_string_or_number")]
  pub province_id: Option<String>,
  #[serde(rename = "type", default)]
  pub kind:        Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LatLng {
  lat: f64,
  lng: f64,
}

/// One free-text search hit from `/addresses/search` or `/suggestions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryAddress {
  #[serde(default, deserialize_with = "opt_string_or_number")]
  id:          Option<String>,
  name:        String,
  #[serde(default)]
  full_name:   Option<String>,
  #[serde(rename = "type", default)]
  kind:        Option<String>,
  #[serde(default)]
  ward:        Option<String>,
  #[serde(default)]
  district:    Option<String>,
  #[serde(default)]
  city:        Option<String>,
  #[serde(default)]
  province:    Option<String>,
  #[serde(default)]
  coordinates: Option<LatLng>,
  #[serde(default)]
  relevance:   Option<f32>,
}

impl DirectoryAddress {
  fn into_candidate(self) -> Candidate {
    let coordinates = self
      .coordinates
      .map(|c| Coordinates::new(c.lng, c.lat))
      .filter(Coordinates::is_valid);

    let kind = kind_from_directory_type(self.kind.as_deref());
    // A district entry names its own district.
    let district = match (kind, self.district) {
      (CandidateKind::District, None) => Some(self.name.clone()),
      (_, district) => district,
    };

    let components = Components {
      ward:     self.ward,
      district,
      city:     self.city,
      province: self.province,
      country:  Some("Việt Nam".to_owned()),
    };

    let full_name = match self.full_name.filter(|f| !f.trim().is_empty()) {
      Some(f) => f,
      None => compose_full_name(&self.name, &components),
    };

    let id = match self.id {
      Some(id) => format!("{}:{id}", Source::Directory),
      None => Candidate::synthesize_id(Source::Directory, &self.name, coordinates),
    };

    let mut candidate = Candidate::new(
      id,
      self.name,
      full_name,
      kind,
      Source::Directory,
    )
    .with_components(components)
    .with_relevance(self.relevance.unwrap_or(0.0));
    if let Some(c) = coordinates {
      candidate = candidate.with_coordinates(c);
    }
    candidate
  }
}

/// `name` followed by the component parts it does not already spell out.
fn compose_full_name(name: &str, components: &Components) -> String {
  let mut parts = vec![name.trim().to_owned()];
  for part in components.parts() {
    if !parts.iter().any(|p| p == part) {
      parts.push(part.to_owned());
    }
  }
  parts.join(", ")
}

fn kind_from_directory_type(kind: Option<&str>) -> CandidateKind {
  match kind.map(str::to_ascii_lowercase).as_deref() {
    Some("ward" | "commune" | "phuong" | "xa") => CandidateKind::Neighborhood,
    Some("district" | "quan" | "huyen") => CandidateKind::District,
    Some("province" | "city" | "tinh") => CandidateKind::Region,
    Some("address" | "street") => CandidateKind::Address,
    Some("poi" | "landmark") => CandidateKind::PointOfInterest,
    _ => CandidateKind::Place,
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the address directory.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
  client: Client,
  config: DirectoryConfig,
}

impl DirectoryClient {
  pub fn new(config: DirectoryConfig) -> Result<Self, ProviderError> {
    if config.base_url.trim().is_empty() {
      return Err(ProviderError::Config("directory base_url is empty".into()));
    }
    let client = build_client(config.timeout)?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    join_url(&self.config.base_url, path)
  }

  /// `GET /addresses/provinces[?search=<s>]`
  pub async fn list_provinces(
    &self,
    search: Option<&str>,
  ) -> Result<Vec<Province>, ProviderError> {
    let mut req = self.client.get(self.url("/addresses/provinces"));
    if let Some(s) = search.map(str::trim).filter(|s| !s.is_empty()) {
      req = req.query(&[("search", s)]);
    }
    let envelope: Envelope<Vec<Province>> =
      get_json(req, "GET /addresses/provinces").await?;
    Ok(envelope.data)
  }

  /// `GET /addresses/districts/{province_id}[?search=<s>]`
  pub async fn list_districts(
    &self,
    province_id: &str,
    search: Option<&str>,
  ) -> Result<Vec<District>, ProviderError> {
    let path = format!("/addresses/districts/{}", province_id.trim());
    let mut req = self.client.get(self.url(&path));
    if let Some(s) = search.map(str::trim).filter(|s| !s.is_empty()) {
      req = req.query(&[("search", s)]);
    }
    let envelope: Envelope<Vec<District>> =
      get_json(req, "GET /addresses/districts").await?;
    Ok(envelope.data)
  }

  /// `GET /addresses/search?q=<q>&limit=<n>`
  pub async fn search_addresses(
    &self,
    query: &str,
    limit: usize,
  ) -> Result<Vec<Candidate>, ProviderError> {
    let req = self.client.get(self.url("/addresses/search")).query(&[
      ("q", query.trim().to_owned()),
      ("limit", limit.max(1).to_string()),
    ]);
    let envelope: Envelope<Vec<DirectoryAddress>> =
      get_json(req, "GET /addresses/search").await?;
    Ok(
      envelope
        .data
        .into_iter()
        .map(DirectoryAddress::into_candidate)
        .take(limit.max(1))
        .collect(),
    )
  }

  /// `GET /addresses/suggestions`
  pub async fn list_suggestions(&self) -> Result<Vec<Candidate>, ProviderError> {
    let req = self.client.get(self.url("/addresses/suggestions"));
    let envelope: Envelope<Vec<DirectoryAddress>> =
      get_json(req, "GET /addresses/suggestions").await?;
    Ok(
      envelope
        .data
        .into_iter()
        .map(DirectoryAddress::into_candidate)
        .collect(),
    )
  }
}

impl AddressProvider for DirectoryClient {
  fn source(&self) -> Source { Source::Directory }

  fn search<'a>(
    &'a self,
    query: &'a str,
    _proximity: Option<Coordinates>,
    limit: usize,
  ) -> BoxFuture<'a, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(self.search_addresses(query, limit))
  }

  fn suggestions(&self) -> BoxFuture<'_, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(self.list_suggestions())
  }
}
