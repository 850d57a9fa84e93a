//! Settings: an optional TOML file layered under `DIACHI_*` environment
//! variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `DIACHI_GEOCODER__ACCESS_TOKEN=pk.…` sets `geocoder.access_token`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use diachi_core::Coordinates;
use diachi_providers::{DirectoryConfig, GeocoderConfig};
use diachi_resolver::SelectorProfile;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub directory:  DirectorySettings,
  pub geocoder:   GeocoderSettings,
  pub selector:   SelectorSettings,
  /// SQLite file holding the recent addresses. A leading `~/` is expanded.
  pub store_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
  pub base_url:     String,
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
  pub base_url:     String,
  pub access_token: Option<String>,
  pub country:      Option<String>,
  pub language:     Option<String>,
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
  pub profile:   SelectorProfile,
  /// `[longitude, latitude]` to bias forward searches towards.
  pub proximity: Option<Coordinates>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      directory:  DirectorySettings::default(),
      geocoder:   GeocoderSettings::default(),
      selector:   SelectorSettings::default(),
      store_path: PathBuf::from("~/.local/share/diachi/state.db"),
    }
  }
}

impl Default for DirectorySettings {
  fn default() -> Self {
    Self {
      base_url:     "http://localhost:3000/api".into(),
      timeout_secs: 10,
    }
  }
}

impl Default for GeocoderSettings {
  fn default() -> Self {
    let defaults = GeocoderConfig::default();
    Self {
      base_url:     defaults.base_url,
      access_token: None,
      country:      defaults.country,
      language:     defaults.language,
      timeout_secs: defaults.timeout.as_secs(),
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the `DIACHI_*` environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("DIACHI")
          .prefix_separator("_")
          .separator("__"),
      );
    Self::from_builder(builder)
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn directory_config(&self) -> DirectoryConfig {
    DirectoryConfig {
      base_url: self.directory.base_url.clone(),
      timeout:  Duration::from_secs(self.directory.timeout_secs.max(1)),
    }
  }

  pub fn geocoder_config(&self) -> GeocoderConfig {
    GeocoderConfig {
      base_url:     self.geocoder.base_url.clone(),
      access_token: self.geocoder.access_token.clone().filter(|t| !t.trim().is_empty()),
      country:      self.geocoder.country.clone(),
      language:     self.geocoder.language.clone(),
      timeout:      Duration::from_secs(self.geocoder.timeout_secs.max(1)),
    }
  }

  /// `store_path` with a leading `~/` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
