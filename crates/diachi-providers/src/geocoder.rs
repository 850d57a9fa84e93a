//! Async client for a Mapbox-places compatible geocoder.
//!
//! Forward: `GET /geocoding/v5/mapbox.places/{query}.json`
//! Reverse: `GET /geocoding/v5/mapbox.places/{lon},{lat}.json`
//!
//! Both are keyed by `access_token`; a client without one refuses to send
//! anything and reports [`ProviderError::Config`].

use std::time::Duration;

use diachi_core::{
  AddressProvider, Candidate, CandidateKind, Components, Coordinates,
  ProviderError, ReverseGeocoder, Source,
};
use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::http::{build_client, get_json};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for the geocoder.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
  pub base_url:     String,
  pub access_token: Option<String>,
  /// ISO 3166 alpha-2 filter, e.g. `vn`.
  pub country:      Option<String>,
  /// Response language, e.g. `vi`.
  pub language:     Option<String>,
  pub timeout:      Duration,
}

impl Default for GeocoderConfig {
  fn default() -> Self {
    Self {
      base_url:     "https://api.mapbox.com".into(),
      access_token: None,
      country:      Some("vn".into()),
      language:     Some("vi".into()),
      timeout:      Duration::from_secs(10),
    }
  }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeatureCollection {
  features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
  #[serde(default)]
  id:         Option<String>,
  #[serde(default)]
  text:       Option<String>,
  /// House number of an `address` feature; `text` is then the street.
  #[serde(default)]
  address:    Option<String>,
  #[serde(default)]
  place_name: Option<String>,
  #[serde(default)]
  place_type: Vec<String>,
  #[serde(default)]
  center:     Option<[f64; 2]>,
  #[serde(default)]
  relevance:  Option<f32>,
  #[serde(default)]
  context:    Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
  id:   String,
  text: String,
}

/// Put `text` into the component slot named by a geocoder layer.
/// Slots that are already filled are left alone.
fn assign_component(components: &mut Components, layer: &str, text: &str) {
  let slot = match layer {
    "neighborhood" => &mut components.ward,
    "locality" | "district" => &mut components.district,
    "place" => &mut components.city,
    "region" => &mut components.province,
    "country" => &mut components.country,
    _ => return,
  };
  if slot.is_none() {
    *slot = Some(text.to_owned());
  }
}

fn kind_from_place_type(place_type: Option<&str>) -> CandidateKind {
  match place_type {
    Some("address") => CandidateKind::Address,
    Some("poi") => CandidateKind::PointOfInterest,
    Some("neighborhood") => CandidateKind::Neighborhood,
    Some("locality" | "district") => CandidateKind::District,
    Some("region") => CandidateKind::Region,
    _ => CandidateKind::Place,
  }
}

impl Feature {
  fn into_candidate(self) -> Candidate {
    let layer = self.place_type.first().map(String::as_str);
    let place_name = self.place_name.unwrap_or_default();
    let street = self
      .text
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| {
        place_name.split(',').next().unwrap_or_default().trim().to_owned()
      });
    let name = match self.address.as_deref().map(str::trim) {
      Some(number) if layer == Some("address") && !number.is_empty() => {
        if street.split_whitespace().next() == Some(number) {
          street
        } else {
          format!("{number} {street}")
        }
      }
      _ => street,
    };

    let mut components = Components::default();
    if let Some(layer) = layer {
      assign_component(&mut components, layer, &name);
    }
    for entry in &self.context {
      let layer = entry.id.split('.').next().unwrap_or_default();
      assign_component(&mut components, layer, &entry.text);
    }

    let coordinates = self
      .center
      .map(Coordinates::from)
      .filter(Coordinates::is_valid);

    let id = match self.id {
      Some(id) => format!("{}:{id}", Source::Geocoder),
      None => Candidate::synthesize_id(Source::Geocoder, &name, coordinates),
    };
    let full_name = if place_name.trim().is_empty() {
      name.clone()
    } else {
      place_name
    };

    let mut candidate =
      Candidate::new(id, name, full_name, kind_from_place_type(layer), Source::Geocoder)
        .with_components(components)
        .with_relevance(self.relevance.unwrap_or(0.0));
    if let Some(c) = coordinates {
      candidate = candidate.with_coordinates(c);
    }
    candidate
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the geocoder.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct GeocoderClient {
  client: Client,
  config: GeocoderConfig,
}

impl GeocoderClient {
  pub fn new(config: GeocoderConfig) -> Result<Self, ProviderError> {
    let client = build_client(config.timeout)?;
    Ok(Self { client, config })
  }

  fn token(&self) -> Result<&str, ProviderError> {
    self
      .config
      .access_token
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| ProviderError::Config("geocoder access token is not set".into()))
  }

  /// `<base>/geocoding/v5/mapbox.places/<term>.json`, with `term`
  /// percent-encoded as a single path segment.
  fn endpoint(&self, term: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(&self.config.base_url)
      .map_err(|e| ProviderError::Config(format!("invalid geocoder base_url: {e}")))?;
    let file = format!("{term}.json");
    url
      .path_segments_mut()
      .map_err(|()| ProviderError::Config("geocoder base_url cannot be a base".into()))?
      .pop_if_empty()
      .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);
    Ok(url)
  }

  fn common_params(&self, token: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![("access_token", token.to_owned())];
    if let Some(lang) = &self.config.language {
      params.push(("language", lang.clone()));
    }
    params
  }

  /// Forward geocode `query`, returning at most `limit` candidates.
  pub async fn forward(
    &self,
    query: &str,
    proximity: Option<Coordinates>,
    limit: usize,
  ) -> Result<Vec<Candidate>, ProviderError> {
    let token = self.token()?;
    let query = query.trim();
    if query.is_empty() {
      return Ok(Vec::new());
    }

    let mut params = self.common_params(token);
    params.push(("limit", limit.clamp(1, 10).to_string()));
    params.push(("autocomplete", "true".into()));
    if let Some(country) = &self.config.country {
      params.push(("country", country.clone()));
    }
    if let Some(p) = proximity.filter(Coordinates::is_valid) {
      params.push(("proximity", format!("{},{}", p.longitude, p.latitude)));
    }

    let req = self.client.get(self.endpoint(query)?).query(&params);
    let collection: FeatureCollection = get_json(req, "GET geocoder forward").await?;
    Ok(
      collection
        .features
        .into_iter()
        .map(Feature::into_candidate)
        .take(limit.max(1))
        .collect(),
    )
  }

  /// Reverse geocode `coordinates` into the best matching address.
  ///
  /// The returned candidate carries the requested coordinates rather than the
  /// feature's centre, so a confirmed pin stays where it was dropped.
  pub async fn reverse(&self, coordinates: Coordinates) -> Result<Candidate, ProviderError> {
    let token = self.token()?;
    if !coordinates.is_valid() {
      return Err(ProviderError::Config(format!("invalid coordinates {coordinates}")));
    }

    let term = format!("{},{}", coordinates.longitude, coordinates.latitude);
    let req = self
      .client
      .get(self.endpoint(&term)?)
      .query(&self.common_params(token));
    let collection: FeatureCollection = get_json(req, "GET geocoder reverse").await?;
    collection
      .features
      .into_iter()
      .next()
      .map(|f| f.into_candidate().with_coordinates(coordinates))
      .ok_or_else(|| ProviderError::Data(format!("no address found at {coordinates}")))
  }
}

impl AddressProvider for GeocoderClient {
  fn source(&self) -> Source { Source::Geocoder }

  fn search<'a>(
    &'a self,
    query: &'a str,
    proximity: Option<Coordinates>,
    limit: usize,
  ) -> BoxFuture<'a, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(self.forward(query, proximity, limit))
  }
}

impl ReverseGeocoder for GeocoderClient {
  fn reverse_geocode(
    &self,
    coordinates: Coordinates,
  ) -> BoxFuture<'_, Result<Candidate, ProviderError>> {
    Box::pin(self.reverse(coordinates))
  }
}

#[cfg(test)]
mod unit {
  use super::*;

  #[test]
  fn feature_context_fills_components() {
    let raw = r#"{
      "id": "poi.42",
      "text": "Chợ Bến Thành",
      "place_name": "Chợ Bến Thành, Lê Lợi, Quận 1, Hồ Chí Minh, Việt Nam",
      "place_type": ["poi"],
      "center": [106.698, 10.7725],
      "relevance": 0.97,
      "context": [
        {"id": "neighborhood.1", "text": "Bến Thành"},
        {"id": "locality.2", "text": "Quận 1"},
        {"id": "place.3", "text": "Hồ Chí Minh"},
        {"id": "country.4", "text": "Việt Nam"}
      ]
    }"#;
    let f: Feature = serde_json::from_str(raw).unwrap();
    let c = f.into_candidate();
    assert_eq!(c.id, "geocoder:poi.42");
    assert_eq!(c.kind, CandidateKind::PointOfInterest);
    let comps = c.components.unwrap();
    assert_eq!(comps.ward.as_deref(), Some("Bến Thành"));
    assert_eq!(comps.district.as_deref(), Some("Quận 1"));
    assert_eq!(comps.city.as_deref(), Some("Hồ Chí Minh"));
    assert_eq!(c.coordinates, Some(Coordinates::new(106.698, 10.7725)));
    assert!((c.relevance - 0.97).abs() < f32::EPSILON);
  }

  #[test]
  fn feature_own_layer_names_its_component() {
    let raw = r#"{"id":"locality.9","text":"Quận 1","place_type":["locality"],"place_name":"Quận 1, Hồ Chí Minh"}"#;
    let c = serde_json::from_str::<Feature>(raw).unwrap().into_candidate();
    assert_eq!(c.kind, CandidateKind::District);
    assert_eq!(
      c.components.and_then(|comp| comp.district).as_deref(),
      Some("Quận 1")
    );
  }

  #[test]
  fn endpoint_encodes_the_query_segment() {
    let client = GeocoderClient::new(GeocoderConfig {
      base_url: "https://geo.example.com/".into(),
      ..GeocoderConfig::default()
    })
    .unwrap();
    let url = client.endpoint("Quận 1/Bến Thành").unwrap();
    assert!(url.as_str().starts_with("https://geo.example.com/geocoding/v5/mapbox.places/"));
    assert!(url.as_str().ends_with(".json"));
    assert!(!url.path().contains("1/B"));
  }
}
