//! One-shot subcommands and the shared engine wiring.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use diachi_core::{Candidate, Coordinates, Query};
use diachi_providers::{DirectoryClient, GeocoderClient};
use diachi_resolver::{
  Aggregator, RecencyCache, Resolution, ResolutionStatus, SelectorProfile,
  SelectorSession,
};
use diachi_store_sqlite::SqliteKvStore;
use serde::Serialize;

use crate::settings::Settings;

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Everything a command needs, built once from [`Settings`].
///
/// The store is only opened by commands that read or write recents.
pub struct Engine {
  pub profile:    SelectorProfile,
  pub proximity:  Option<Coordinates>,
  pub directory:  Arc<DirectoryClient>,
  pub geocoder:   Arc<GeocoderClient>,
  pub store_path: PathBuf,
}

impl Engine {
  pub fn open(settings: &Settings, profile: Option<SelectorProfile>) -> anyhow::Result<Self> {
    let directory = DirectoryClient::new(settings.directory_config())
      .context("invalid directory settings")?;
    let geocoder = GeocoderClient::new(settings.geocoder_config())
      .context("invalid geocoder settings")?;

    Ok(Self {
      profile:    profile.unwrap_or(settings.selector.profile),
      proximity:  settings.selector.proximity,
      directory:  Arc::new(directory),
      geocoder:   Arc::new(geocoder),
      store_path: settings.store_path(),
    })
  }

  /// Open the recents store, creating its directory if needed.
  pub fn store(&self) -> anyhow::Result<SqliteKvStore> {
    let path = &self.store_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteKvStore::open(path).with_context(|| format!("failed to open store at {path:?}"))
  }

  pub fn aggregator(&self) -> Aggregator {
    self.profile.aggregator(
      self.proximity,
      self.directory.clone(),
      self.geocoder.clone(),
    )
  }

  pub fn session(&self) -> anyhow::Result<SelectorSession<SqliteKvStore>> {
    Ok(SelectorSession::new(
      self.profile,
      self.aggregator(),
      self.geocoder.clone(),
      self.store()?,
    ))
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

pub fn print_candidates(candidates: &[Candidate]) {
  if candidates.is_empty() {
    println!("(no results)");
    return;
  }
  for (i, c) in candidates.iter().enumerate() {
    let at = c.coordinates.map(|at| format!("  @ {at}")).unwrap_or_default();
    println!("{:>2}. {}  [{}, {:.2}]{at}", i + 1, c.display(), c.source, c.relevance);
  }
}

pub fn describe_status(status: &ResolutionStatus) -> Option<String> {
  match status {
    ResolutionStatus::Complete => None,
    ResolutionStatus::Degraded { failed } => {
      let failed: Vec<_> = failed.iter().map(|s| s.as_str()).collect();
      Some(format!("some sources failed: {}", failed.join(", ")))
    }
    ResolutionStatus::Skipped => Some("query too short".into()),
    ResolutionStatus::Unavailable => Some("couldn't search right now".into()),
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

pub async fn search(engine: &Engine, text: &str, json: bool) -> anyhow::Result<()> {
  let Resolution { candidates, status } = engine
    .aggregator()
    .resolve(&Query::new(text, 1), &[])
    .await;

  if json {
    return print_json(&candidates);
  }
  if let Some(note) = describe_status(&status) {
    eprintln!("note: {note}");
  }
  print_candidates(&candidates);
  Ok(())
}

pub async fn reverse(engine: &Engine, at: Coordinates, json: bool) -> anyhow::Result<()> {
  anyhow::ensure!(at.is_valid(), "coordinates out of range: {at}");
  let candidate = engine
    .geocoder
    .reverse(at)
    .await
    .with_context(|| format!("reverse geocoding {at} failed"))?;

  if json {
    return print_json(&candidate);
  }
  println!("{}", candidate.display());
  Ok(())
}

pub async fn provinces(engine: &Engine, search: Option<&str>, json: bool) -> anyhow::Result<()> {
  let provinces = engine
    .directory
    .list_provinces(search)
    .await
    .context("listing provinces failed")?;

  if json {
    return print_json(&provinces);
  }
  for p in &provinces {
    println!("{:>6}  {}", p.id, p.name);
  }
  Ok(())
}

pub async fn districts(
  engine: &Engine,
  province_id: &str,
  search: Option<&str>,
  json: bool,
) -> anyhow::Result<()> {
  let districts = engine
    .directory
    .list_districts(province_id, search)
    .await
    .with_context(|| format!("listing districts of {province_id} failed"))?;

  if json {
    return print_json(&districts);
  }
  for d in &districts {
    println!("{:>6}  {}", d.id, d.name);
  }
  Ok(())
}

pub fn recent(engine: &Engine, clear: bool, json: bool) -> anyhow::Result<()> {
  let mut recents = RecencyCache::load(engine.store()?);
  if clear {
    recents.clear().context("failed to clear recent addresses")?;
    println!("cleared");
    return Ok(());
  }
  if json {
    return print_json(&recents.entries());
  }
  print_candidates(recents.entries());
  Ok(())
}

pub async fn defaults(engine: &Engine, json: bool) -> anyhow::Result<()> {
  let defaults = engine.session()?.defaults().await;
  if json {
    return print_json(&defaults);
  }
  print_candidates(&defaults);
  Ok(())
}
