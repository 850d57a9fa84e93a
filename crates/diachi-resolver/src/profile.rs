//! Selector presets.

use std::{sync::Arc, time::Duration};

use diachi_core::{AddressProvider, Coordinates};
use serde::{Deserialize, Serialize};

use crate::{
  aggregator::{Aggregator, AggregatorConfig, MAX_RESULTS},
  debounce::DebouncePolicy,
};

/// How eagerly a selector searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorProfile {
  /// Searches from the first character.
  #[default]
  Compact,
  /// Waits for two characters and a longer pause.
  Detailed,
}

impl SelectorProfile {
  pub fn debounce(self) -> DebouncePolicy {
    match self {
      Self::Compact => DebouncePolicy::new(Duration::from_millis(100), Duration::from_millis(200)),
      Self::Detailed => DebouncePolicy::new(Duration::from_millis(100), Duration::from_millis(300)),
    }
  }

  pub fn min_query_chars(self) -> usize {
    match self {
      Self::Compact => 1,
      Self::Detailed => 2,
    }
  }

  pub fn aggregator_config(self) -> AggregatorConfig {
    AggregatorConfig {
      max_results:     MAX_RESULTS,
      min_query_chars: self.min_query_chars(),
      proximity:       None,
    }
  }

  /// The standard directory-plus-geocoder aggregator for this profile.
  pub fn aggregator(
    self,
    proximity: Option<Coordinates>,
    directory: Arc<dyn AddressProvider>,
    geocoder: Arc<dyn AddressProvider>,
  ) -> Aggregator {
    let config = AggregatorConfig { proximity, ..self.aggregator_config() };
    Aggregator::standard(config, directory, geocoder)
  }
}

impl std::str::FromStr for SelectorProfile {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "compact" => Ok(Self::Compact),
      "detailed" => Ok(Self::Detailed),
      other => Err(format!("unknown selector profile: {other:?}")),
    }
  }
}
