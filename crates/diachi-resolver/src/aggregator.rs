//! Aggregator: fan a query out to every provider, merge, dedupe, rank.
//!
//! Providers are queried concurrently and the aggregator waits for all of
//! them. A failing provider only removes its own results. When every provider
//! fails, the ordered fallback list is tried; if that is exhausted too the
//! result is an empty set with [`ResolutionStatus::Unavailable`]. Provider
//! failure never surfaces as an `Err`.

use std::sync::Arc;

use diachi_core::{
  AddressProvider, Candidate, Coordinates, Query, Source, matching::same_place,
};
use futures::future::join_all;
use tracing::{debug, warn};

/// Final cap on a ranked result set.
pub const MAX_RESULTS: usize = 8;
/// Per-provider caps for the standard fan-out. Their sum exceeds
/// [`MAX_RESULTS`] so deduplication still leaves a full list.
pub const DIRECTORY_LIMIT: usize = 4;
pub const GEOCODER_LIMIT: usize = 6;
/// Relaxed cap used when the geocoder is retried alone.
pub const FALLBACK_LIMIT: usize = 10;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
  pub max_results:     usize,
  /// Queries whose trimmed length is below this are not sent anywhere.
  pub min_query_chars: usize,
  /// Bias passed to providers that support proximity ranking.
  pub proximity:       Option<Coordinates>,
}

impl Default for AggregatorConfig {
  fn default() -> Self {
    Self {
      max_results:     MAX_RESULTS,
      min_query_chars: 1,
      proximity:       None,
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionStatus {
  /// Every provider answered.
  Complete,
  /// Some providers failed; the set holds what the rest returned.
  Degraded { failed: Vec<Source> },
  /// The query was too short to send.
  Skipped,
  /// Every provider and every fallback failed. Shown as "couldn't search
  /// right now", not as an error.
  Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
  /// Ranked, deduplicated and capped.
  pub candidates: Vec<Candidate>,
  pub status:     ResolutionStatus,
}

impl Resolution {
  fn empty(status: ResolutionStatus) -> Self {
    Self { candidates: Vec::new(), status }
  }

  pub fn is_unavailable(&self) -> bool {
    self.status == ResolutionStatus::Unavailable
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

struct Slot {
  provider: Arc<dyn AddressProvider>,
  limit:    usize,
}

/// Concurrent multi-provider search.
///
/// Registration order is the base ordering before ranking and decides which
/// duplicate survives, so register the most authoritative provider first.
pub struct Aggregator {
  config:    AggregatorConfig,
  providers: Vec<Slot>,
  fallbacks: Vec<Slot>,
}

impl Aggregator {
  pub fn new(config: AggregatorConfig) -> Self {
    Self {
      config,
      providers: Vec::new(),
      fallbacks: Vec::new(),
    }
  }

  /// Directory first, geocoder second, geocoder alone as the fallback.
  pub fn standard(
    config: AggregatorConfig,
    directory: Arc<dyn AddressProvider>,
    geocoder: Arc<dyn AddressProvider>,
  ) -> Self {
    Self::new(config)
      .with_provider(directory, DIRECTORY_LIMIT)
      .with_provider(Arc::clone(&geocoder), GEOCODER_LIMIT)
      .with_fallback(geocoder, FALLBACK_LIMIT)
  }

  /// Add a provider to the fan-out, asking it for at most `limit` results.
  pub fn with_provider(mut self, provider: Arc<dyn AddressProvider>, limit: usize) -> Self {
    self.providers.push(Slot { provider, limit });
    self
  }

  /// Add a fallback, tried in order only when every provider failed.
  pub fn with_fallback(mut self, provider: Arc<dyn AddressProvider>, limit: usize) -> Self {
    self.fallbacks.push(Slot { provider, limit });
    self
  }

  pub fn config(&self) -> &AggregatorConfig { &self.config }

  /// Resolve `query` into a ranked result set.
  ///
  /// `prior` is the set currently on screen. A new candidate that is the same
  /// place from the same source as a prior one keeps the prior id.
  pub async fn resolve(&self, query: &Query, prior: &[Candidate]) -> Resolution {
    if query.trimmed_len < self.config.min_query_chars.max(1) {
      return Resolution::empty(ResolutionStatus::Skipped);
    }
    let text = query.trimmed();

    let outcomes = join_all(self.providers.iter().map(|slot| async move {
      let source = slot.provider.source();
      let result = slot.provider.search(text, self.config.proximity, slot.limit).await;
      (source, result)
    }))
    .await;

    let mut batches = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();
    for (source, result) in outcomes {
      match result {
        Ok(candidates) => {
          debug!(%source, count = candidates.len(), sequence = query.sequence, "provider answered");
          batches.push(candidates);
        }
        Err(e) => {
          warn!(%source, error = %e, sequence = query.sequence, "provider failed");
          failed.push(source);
        }
      }
    }

    if batches.is_empty() {
      return self.run_fallbacks(text, prior).await;
    }

    let status = if failed.is_empty() {
      ResolutionStatus::Complete
    } else {
      ResolutionStatus::Degraded { failed }
    };
    Resolution {
      candidates: merge(batches, prior, self.config.max_results),
      status,
    }
  }

  async fn run_fallbacks(&self, text: &str, prior: &[Candidate]) -> Resolution {
    for slot in &self.fallbacks {
      let source = slot.provider.source();
      match slot.provider.search(text, self.config.proximity, slot.limit).await {
        Ok(candidates) => {
          debug!(%source, count = candidates.len(), "fallback answered");
          return Resolution {
            candidates: merge(vec![candidates], prior, self.config.max_results),
            status:     ResolutionStatus::Degraded { failed: self.sources() },
          };
        }
        Err(e) => warn!(%source, error = %e, "fallback failed"),
      }
    }
    Resolution::empty(ResolutionStatus::Unavailable)
  }

  fn sources(&self) -> Vec<Source> {
    self.providers.iter().map(|s| s.provider.source()).collect()
  }

  /// Default suggestions from every provider that offers them, in
  /// registration order. Failures are logged and skipped.
  pub async fn suggestions(&self) -> Vec<Candidate> {
    let outcomes = join_all(self.providers.iter().map(|slot| async move {
      (slot.provider.source(), slot.provider.suggestions().await)
    }))
    .await;

    outcomes
      .into_iter()
      .flat_map(|(source, result)| {
        result.unwrap_or_else(|e| {
          warn!(%source, error = %e, "suggestions failed");
          Vec::new()
        })
      })
      .collect()
  }
}

// ─── Merge pipeline ──────────────────────────────────────────────────────────

/// Concatenate `batches` in order, dedupe, rank, truncate to `max`.
pub fn merge(batches: Vec<Vec<Candidate>>, prior: &[Candidate], max: usize) -> Vec<Candidate> {
  let mut merged = dedupe(batches.into_iter().flatten());
  keep_prior_ids(&mut merged, prior);
  rank(&mut merged);
  merged.truncate(max);
  merged
}

/// Drop every candidate that is the same place as one seen earlier.
pub fn dedupe(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
  let mut kept: Vec<Candidate> = Vec::new();
  for candidate in candidates {
    if !kept.iter().any(|k| same_place(k, &candidate)) {
      kept.push(candidate);
    }
  }
  kept
}

/// Stable sort by relevance, highest first. Ties keep their order.
pub fn rank(candidates: &mut [Candidate]) {
  candidates.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

fn keep_prior_ids(merged: &mut [Candidate], prior: &[Candidate]) {
  for i in 0..merged.len() {
    let Some(old) = prior
      .iter()
      .find(|p| p.source == merged[i].source && p.id != merged[i].id && same_place(p, &merged[i]))
    else {
      continue;
    };
    if merged.iter().all(|m| m.id != old.id) {
      merged[i].id = old.id.clone();
    }
  }
}
