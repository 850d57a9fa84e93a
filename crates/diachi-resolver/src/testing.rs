//! Scripted providers for resolver tests.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use diachi_core::{
  AddressProvider, Candidate, CandidateKind, Coordinates, ProviderError,
  ReverseGeocoder, Source,
};
use futures::future::BoxFuture;

type Responder =
  Box<dyn Fn(&str, usize) -> Result<Vec<Candidate>, ProviderError> + Send + Sync>;

/// A geocoder-sourced place named `name`, with `full_name` equal to `name`.
pub fn candidate(id: &str, name: &str, relevance: f32) -> Candidate {
  Candidate::new(id, name, name, CandidateKind::Place, Source::Geocoder)
    .with_relevance(relevance)
}

// ─── Forward search ──────────────────────────────────────────────────────────

pub struct FakeProvider {
  source:      Source,
  delay:       Duration,
  /// Per-query delays, checked before `delay`.
  delays:      Vec<(String, Duration)>,
  responder:   Responder,
  suggestions: Vec<Candidate>,
  calls:       Mutex<Vec<(String, usize)>>,
}

impl FakeProvider {
  pub fn scripted(
    source: Source,
    responder: impl Fn(&str, usize) -> Result<Vec<Candidate>, ProviderError>
    + Send
    + Sync
    + 'static,
  ) -> Arc<Self> {
    Arc::new(Self {
      source,
      delay: Duration::ZERO,
      delays: Vec::new(),
      responder: Box::new(responder),
      suggestions: Vec::new(),
      calls: Mutex::default(),
    })
  }

  /// Always answers `results`, truncated to the requested limit.
  pub fn ok(source: Source, results: Vec<Candidate>) -> Arc<Self> {
    Self::scripted(source, move |_, limit| {
      Ok(results.iter().take(limit).cloned().collect())
    })
  }

  pub fn err(source: Source, error: ProviderError) -> Arc<Self> {
    Self::scripted(source, move |_, _| Err(error.clone()))
  }

  /// Sleep for `delay` before answering. Only call before sharing the `Arc`.
  pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
    self.modify(|p| p.delay = delay)
  }

  /// Sleep for `delay` before answering `query` specifically.
  pub fn with_delay_for(self: Arc<Self>, query: &str, delay: Duration) -> Arc<Self> {
    let query = query.to_owned();
    self.modify(move |p| p.delays.push((query, delay)))
  }

  pub fn with_suggestions(self: Arc<Self>, suggestions: Vec<Candidate>) -> Arc<Self> {
    self.modify(|p| p.suggestions = suggestions)
  }

  fn modify(self: Arc<Self>, f: impl FnOnce(&mut Self)) -> Arc<Self> {
    let mut inner = Arc::try_unwrap(self).ok().expect("provider already shared");
    f(&mut inner);
    Arc::new(inner)
  }

  pub fn calls(&self) -> Vec<(String, usize)> { self.calls.lock().unwrap().clone() }

  pub fn queries(&self) -> Vec<String> {
    self.calls().into_iter().map(|(q, _)| q).collect()
  }

  pub fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }

  fn delay_for(&self, query: &str) -> Duration {
    self
      .delays
      .iter()
      .find(|(q, _)| q == query)
      .map(|(_, d)| *d)
      .unwrap_or(self.delay)
  }
}

impl AddressProvider for FakeProvider {
  fn source(&self) -> Source { self.source }

  fn search<'a>(
    &'a self,
    query: &'a str,
    _proximity: Option<Coordinates>,
    limit: usize,
  ) -> BoxFuture<'a, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(async move {
      self.calls.lock().unwrap().push((query.to_owned(), limit));
      let delay = self.delay_for(query);
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      (self.responder)(query, limit)
    })
  }

  fn suggestions(&self) -> BoxFuture<'_, Result<Vec<Candidate>, ProviderError>> {
    Box::pin(async move { Ok(self.suggestions.clone()) })
  }
}

// ─── Reverse ─────────────────────────────────────────────────────────────────

pub struct FakeGeocoder {
  result: Result<Candidate, ProviderError>,
  calls:  Mutex<Vec<Coordinates>>,
}

impl FakeGeocoder {
  /// Answers with `name` at whatever point was tapped.
  pub fn resolving_to(name: &str) -> Arc<Self> {
    Arc::new(Self {
      result: Ok(
        Candidate::new("geocoder:address.1", name, name, CandidateKind::Address, Source::Geocoder)
          .with_relevance(1.0),
      ),
      calls:  Mutex::default(),
    })
  }

  pub fn failing(error: ProviderError) -> Arc<Self> {
    Arc::new(Self { result: Err(error), calls: Mutex::default() })
  }

  pub fn calls(&self) -> Vec<Coordinates> { self.calls.lock().unwrap().clone() }
}

impl ReverseGeocoder for FakeGeocoder {
  fn reverse_geocode(
    &self,
    coordinates: Coordinates,
  ) -> BoxFuture<'_, Result<Candidate, ProviderError>> {
    Box::pin(async move {
      self.calls.lock().unwrap().push(coordinates);
      self.result.clone().map(|c| c.with_coordinates(coordinates))
    })
  }
}
