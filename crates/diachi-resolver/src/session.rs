//! [`SelectorSession`]: one address input field, end to end.
//!
//! The session is driven from two sides. The host reports user actions
//! (`on_input_changed`, `on_candidate_selected`, the `on_map_*` calls) and
//! polls [`SelectorSession::next_update`], which waits for the debouncer and
//! for in-flight resolutions and applies whichever arrives first. Results of
//! a query are applied only while that query is still the latest one.

use std::sync::Arc;

use diachi_core::{
  AddressSelection, Candidate, Coordinates, KeyValueStore, Query, ReverseGeocoder,
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
  aggregator::{Aggregator, Resolution, ResolutionStatus},
  debounce::{DebounceSignal, Debouncer},
  profile::SelectorProfile,
  recency::RecencyCache,
  reverse::{ReverseFlow, ReverseState},
};

// ─── Listener ────────────────────────────────────────────────────────────────

/// Presentation hooks. Every method defaults to doing nothing.
pub trait SelectorListener: Send {
  /// The input text changed, either typed or set by a selection.
  fn on_change(&mut self, _text: &str) {}

  /// The user settled on an address.
  fn on_address_select(&mut self, _selection: &AddressSelection) {}

  /// Every provider failed for the current query.
  fn on_search_unavailable(&mut self) {}

  /// A map confirmation could not be turned into an address.
  fn on_reverse_failed(&mut self, _reason: &str) {}
}

/// A listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SelectorListener for NoopListener {}

// ─── Status and updates ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
  /// Nothing to show: blank input, a selection was just made, or the query
  /// was too short to search.
  #[default]
  Idle,
  /// A query is waiting on the debouncer or on providers.
  Pending,
  /// `results()` holds the answer to the current query.
  Ready,
  /// Every provider failed for the current query.
  Unavailable,
}

/// What [`SelectorSession::next_update`] just did.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
  /// The input became blank and the results were cleared.
  Cleared { sequence: u64 },
  /// A settled query was sent to the providers.
  Searching { sequence: u64 },
  /// The current query's results were applied.
  Results {
    sequence: u64,
    count:    usize,
    status:   ResolutionStatus,
  },
  /// The current query could not be searched at all.
  Unavailable { sequence: u64 },
  /// A resolution finished after a newer query was issued and was dropped.
  Stale { sequence: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
  /// The map is closed, there is no tap, or a confirmation is in flight.
  NothingToConfirm,
  Selected(AddressSelection),
  Failed(String),
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct SelectorSession<K> {
  profile:    SelectorProfile,
  aggregator: Arc<Aggregator>,
  geocoder:   Arc<dyn ReverseGeocoder>,
  recents:    RecencyCache<K>,
  reverse:    ReverseFlow,
  debouncer:  Debouncer,
  listener:   Box<dyn SelectorListener>,
  text:       String,
  sequence:   u64,
  results:    Vec<Candidate>,
  status:     SearchStatus,
  in_flight:  JoinSet<(u64, Resolution)>,
}

impl<K: KeyValueStore> SelectorSession<K> {
  /// Create a session and load the persisted recents from `store`.
  ///
  /// Must be called from within a tokio runtime.
  pub fn new(
    profile: SelectorProfile,
    aggregator: Aggregator,
    geocoder: Arc<dyn ReverseGeocoder>,
    store: K,
  ) -> Self {
    Self {
      profile,
      aggregator: Arc::new(aggregator),
      geocoder,
      recents: RecencyCache::load(store),
      reverse: ReverseFlow::new(),
      debouncer: Debouncer::new(profile.debounce()),
      listener: Box::new(NoopListener),
      text: String::new(),
      sequence: 0,
      results: Vec::new(),
      status: SearchStatus::Idle,
      in_flight: JoinSet::new(),
    }
  }

  pub fn with_listener(mut self, listener: impl SelectorListener + 'static) -> Self {
    self.listener = Box::new(listener);
    self
  }

  pub fn profile(&self) -> SelectorProfile { self.profile }

  pub fn text(&self) -> &str { &self.text }

  pub fn sequence(&self) -> u64 { self.sequence }

  /// The ranked results for the current query.
  pub fn results(&self) -> &[Candidate] { &self.results }

  pub fn status(&self) -> SearchStatus { self.status }

  pub fn recents(&self) -> &[Candidate] { self.recents.entries() }

  pub fn reverse_state(&self) -> &ReverseState { self.reverse.state() }

  // ─── Typing ────────────────────────────────────────────────────────────────

  /// Register new input text. Nothing is searched until the debouncer
  /// settles; see [`SelectorSession::next_update`].
  pub fn on_input_changed(&mut self, text: impl Into<String>) {
    self.text = text.into();
    self.listener.on_change(&self.text);
    self.sequence += 1;

    let query = Query::new(self.text.clone(), self.sequence);
    if !query.is_blank() {
      self.status = SearchStatus::Pending;
    }
    self.debouncer.input_changed(query);
  }

  /// Wait for the next thing to happen. Returns `None` once nothing is
  /// pending: no armed debounce timer and no resolution in flight.
  pub async fn next_update(&mut self) -> Option<SessionUpdate> {
    loop {
      if !self.debouncer.is_armed() && self.in_flight.is_empty() {
        return None;
      }

      tokio::select! {
        Some(signal) = self.debouncer.next(), if self.debouncer.is_armed() => {
          return Some(self.apply_signal(signal));
        }
        Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
          match joined {
            Ok((sequence, resolution)) => return Some(self.apply_resolution(sequence, resolution)),
            Err(e) => {
              warn!(error = %e, "resolution task failed");
              if let Some(update) = self.settle_lost_query() {
                return Some(update);
              }
            }
          }
        }
        else => return None,
      }
    }
  }

  fn apply_signal(&mut self, signal: DebounceSignal) -> SessionUpdate {
    match signal {
      DebounceSignal::Clear { sequence } => {
        self.results.clear();
        self.status = SearchStatus::Idle;
        SessionUpdate::Cleared { sequence }
      }
      DebounceSignal::Settled(query) => {
        let sequence = query.sequence;
        let aggregator = Arc::clone(&self.aggregator);
        let prior = self.results.clone();
        debug!(sequence, text = query.trimmed(), "dispatching query");
        self.in_flight.spawn(async move {
          let resolution = aggregator.resolve(&query, &prior).await;
          (query.sequence, resolution)
        });
        SessionUpdate::Searching { sequence }
      }
    }
  }

  fn apply_resolution(&mut self, sequence: u64, resolution: Resolution) -> SessionUpdate {
    if sequence != self.sequence {
      debug!(sequence, current = self.sequence, "discarding stale results");
      return SessionUpdate::Stale { sequence };
    }

    match resolution.status {
      ResolutionStatus::Unavailable => {
        self.results.clear();
        self.status = SearchStatus::Unavailable;
        self.listener.on_search_unavailable();
        SessionUpdate::Unavailable { sequence }
      }
      status => {
        self.status = if status == ResolutionStatus::Skipped {
          SearchStatus::Idle
        } else {
          SearchStatus::Ready
        };
        self.results = resolution.candidates;
        SessionUpdate::Results { sequence, count: self.results.len(), status }
      }
    }
  }

  /// A resolution task died. If it was the last hope for the current query,
  /// report the query as unavailable instead of leaving it pending forever.
  fn settle_lost_query(&mut self) -> Option<SessionUpdate> {
    let lost = self.status == SearchStatus::Pending
      && self.in_flight.is_empty()
      && !self.debouncer.is_armed();
    let sequence = self.sequence;
    lost.then(|| {
      self.apply_resolution(sequence, Resolution {
        candidates: Vec::new(),
        status:     ResolutionStatus::Unavailable,
      })
    })
  }

  // ─── Selection ─────────────────────────────────────────────────────────────

  /// Finalise `candidate` as the chosen address.
  ///
  /// Cancels any pending search, discards in-flight results, replaces the
  /// input text, promotes the candidate into the recents and notifies the
  /// listener.
  pub fn on_candidate_selected(&mut self, candidate: &Candidate) -> AddressSelection {
    self.debouncer.cancel();
    self.sequence += 1;
    self.text = candidate.display().to_owned();
    self.results.clear();
    self.status = SearchStatus::Idle;
    self.recents.promote(candidate);

    let selection = AddressSelection::from(candidate);
    info!(id = %candidate.id, source = %candidate.source, "address selected");
    self.listener.on_change(&self.text);
    self.listener.on_address_select(&selection);
    selection
  }

  /// Select the `index`th current result, if there is one.
  pub fn select(&mut self, index: usize) -> Option<AddressSelection> {
    let candidate = self.results.get(index)?.clone();
    Some(self.on_candidate_selected(&candidate))
  }

  /// Defaults for an empty input: recents, or provider suggestions and
  /// popular places.
  pub async fn defaults(&self) -> Vec<Candidate> {
    if !self.recents.is_empty() {
      return self.recents.entries().to_vec();
    }
    let suggestions = self.aggregator.suggestions().await;
    self.recents.list_defaults(&suggestions)
  }

  pub fn clear_recents(&mut self) -> diachi_core::Result<()> { self.recents.clear() }

  // ─── Map ───────────────────────────────────────────────────────────────────

  pub fn on_map_opened(&mut self) { self.reverse.open(); }

  /// Returns `false` if the tap was ignored.
  pub fn on_map_tapped(&mut self, coordinates: Coordinates) -> bool {
    self.reverse.tap(coordinates)
  }

  pub fn on_map_closed(&mut self) { self.reverse.close(); }

  /// Reverse-geocode the latest tap. Performs exactly one geocoder call, or
  /// none when there is nothing to confirm.
  pub async fn on_map_confirmed(&mut self) -> ConfirmOutcome {
    let Some(coordinates) = self.reverse.begin_confirm() else {
      return ConfirmOutcome::NothingToConfirm;
    };
    debug!(%coordinates, "confirming map selection");
    let result = self.geocoder.reverse_geocode(coordinates).await;

    match self.reverse.complete(result) {
      Some(ReverseState::Resolved(candidate)) => {
        ConfirmOutcome::Selected(self.on_candidate_selected(&candidate))
      }
      Some(ReverseState::Failed { reason, .. }) => {
        warn!(%coordinates, reason = %reason, "reverse geocoding failed");
        self.listener.on_reverse_failed(&reason);
        ConfirmOutcome::Failed(reason)
      }
      _ => ConfirmOutcome::NothingToConfirm,
    }
  }
}
