//! Candidate types: the provider-agnostic shape of one search result.
//!
//! Every provider adapter converts its own response items into [`Candidate`]s.
//! A candidate is never mutated after creation; promotion into the recency
//! list produces a new value with its timestamp set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Coordinates ─────────────────────────────────────────────────────────────

/// A WGS84 position. Serialised as `[longitude, latitude]`, the same order
/// geocoders use for `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
  pub longitude: f64,
  pub latitude:  f64,
}

impl Coordinates {
  pub fn new(longitude: f64, latitude: f64) -> Self {
    Self { longitude, latitude }
  }

  /// Whether both axes lie inside their WGS84 ranges.
  pub fn is_valid(&self) -> bool {
    self.longitude.is_finite()
      && self.latitude.is_finite()
      && (-180.0..=180.0).contains(&self.longitude)
      && (-90.0..=90.0).contains(&self.latitude)
  }

  /// True when both axes differ by at most `tolerance` degrees.
  pub fn is_near(&self, other: &Coordinates, tolerance: f64) -> bool {
    (self.longitude - other.longitude).abs() <= tolerance
      && (self.latitude - other.latitude).abs() <= tolerance
  }
}

impl From<[f64; 2]> for Coordinates {
  fn from([longitude, latitude]: [f64; 2]) -> Self {
    Self { longitude, latitude }
  }
}

impl From<Coordinates> for [f64; 2] {
  fn from(c: Coordinates) -> Self { [c.longitude, c.latitude] }
}

impl fmt::Display for Coordinates {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.6},{:.6}", self.longitude, self.latitude)
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// What sort of place a candidate describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
  Address,
  #[serde(rename = "poi")]
  PointOfInterest,
  #[default]
  Place,
  District,
  Region,
  Neighborhood,
}

/// The backend a candidate came from. Used for tie-breaking and UI badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// The national address directory (province/district hierarchy).
  Directory,
  /// The worldwide free-text geocoder.
  Geocoder,
  /// The built-in list of well-known places.
  Popular,
  /// A map tap resolved without a geocoder address.
  Map,
}

impl Source {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Directory => "directory",
      Self::Geocoder => "geocoder",
      Self::Popular => "popular",
      Self::Map => "map",
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Components ──────────────────────────────────────────────────────────────

/// A partial administrative breakdown of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ward:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub district: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub province: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country:  Option<String>,
}

impl Components {
  pub fn is_empty(&self) -> bool {
    self.parts().next().is_none()
  }

  /// Non-empty parts from the most to the least specific.
  pub fn parts(&self) -> impl Iterator<Item = &str> {
    [
      &self.ward,
      &self.district,
      &self.city,
      &self.province,
      &self.country,
    ]
    .into_iter()
    .filter_map(|p| p.as_deref())
    .map(str::trim)
    .filter(|p| !p.is_empty())
  }

  /// `"ward, district, city, province, country"` with empty parts skipped.
  pub fn formatted(&self) -> String {
    self.parts().collect::<Vec<_>>().join(", ")
  }
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// A normalised search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
  /// Provider-qualified identifier, unique within one ranked result set.
  pub id:          String,
  pub name:        String,
  pub full_name:   String,
  #[serde(rename = "type", default)]
  pub kind:        CandidateKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coordinates: Option<Coordinates>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub components:  Option<Components>,
  /// Confidence in `[0, 1]`; `0` when the provider gives none.
  #[serde(default)]
  pub relevance:   f32,
  pub source:      Source,
  /// Set when the candidate is promoted into the recency list.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp:   Option<DateTime<Utc>>,
}

impl Candidate {
  /// A candidate with no coordinates, no components and zero relevance.
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    full_name: impl Into<String>,
    kind: CandidateKind,
    source: Source,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      full_name: full_name.into(),
      kind,
      coordinates: None,
      components: None,
      relevance: 0.0,
      source,
      timestamp: None,
    }
  }

  pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
    self.coordinates = Some(coordinates);
    self
  }

  /// Attach components; an all-empty breakdown is stored as `None`.
  pub fn with_components(mut self, components: Components) -> Self {
    self.components = (!components.is_empty()).then_some(components);
    self
  }

  /// Set relevance, clamped into `[0, 1]`. Non-finite input becomes `0`.
  pub fn with_relevance(mut self, relevance: f32) -> Self {
    self.relevance = if relevance.is_finite() {
      relevance.clamp(0.0, 1.0)
    } else {
      0.0
    };
    self
  }

  /// A copy of this candidate stamped with its promotion time.
  pub fn promoted(&self, at: DateTime<Utc>) -> Self {
    Self { timestamp: Some(at), ..self.clone() }
  }

  /// The string shown in the input field once this candidate is chosen.
  pub fn display(&self) -> &str {
    if self.full_name.trim().is_empty() {
      &self.name
    } else {
      &self.full_name
    }
  }

  /// Deterministic id for upstream items that carry none.
  ///
  /// The same source, name and coordinates always produce the same id, so a
  /// place keeps its identity across searches and in the recency list.
  pub fn synthesize_id(
    source: Source,
    name: &str,
    coordinates: Option<Coordinates>,
  ) -> String {
    let key = match coordinates {
      Some(c) => format!("{source}|{}|{c}", name.trim()),
      None => format!("{source}|{}", name.trim()),
    };
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
    format!("{source}:{uuid}")
  }
}

// ─── Selection event ─────────────────────────────────────────────────────────

/// The normalised "address selected" payload handed to the booking form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSelection {
  pub address:           String,
  pub coordinates:       Option<Coordinates>,
  pub components:        Option<Components>,
  pub formatted_address: String,
  #[serde(rename = "type")]
  pub kind:              CandidateKind,
  pub source:            Source,
  pub relevance:         f32,
}

impl From<&Candidate> for AddressSelection {
  fn from(c: &Candidate) -> Self {
    let formatted_address = c
      .components
      .as_ref()
      .map(Components::formatted)
      .filter(|f| !f.is_empty())
      .unwrap_or_else(|| c.display().to_owned());
    Self {
      address: c.display().to_owned(),
      coordinates: c.coordinates,
      components: c.components.clone(),
      formatted_address,
      kind: c.kind,
      source: c.source,
      relevance: c.relevance,
    }
  }
}
