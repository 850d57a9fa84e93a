//! `diachi`: Vietnamese address search from the terminal.
//!
//! # Usage
//!
//! ```text
//! diachi search "Quận 1"
//! diachi reverse 106.7017 10.7769
//! diachi provinces --search hcm
//! diachi --profile detailed interactive
//! ```
//!
//! Settings come from `diachi.toml` (or `--config FILE`) and `DIACHI_*`
//! environment variables; see [`settings::Settings`].

mod commands;
mod interactive;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::Engine;
use diachi_core::Coordinates;
use diachi_resolver::SelectorProfile;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "diachi", version, about = "Vietnamese address search from the terminal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "diachi.toml")]
  config: PathBuf,

  /// Selector profile: `compact` or `detailed`. Overrides the config file.
  #[arg(long)]
  profile: Option<SelectorProfile>,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run one aggregated search across every provider.
  Search {
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
  },
  /// Turn a point into an address.
  Reverse {
    #[arg(allow_negative_numbers = true)]
    lon: f64,
    #[arg(allow_negative_numbers = true)]
    lat: f64,
  },
  /// List provinces from the address directory.
  Provinces {
    #[arg(long)]
    search: Option<String>,
  },
  /// List the districts of one province.
  Districts {
    province_id: String,
    #[arg(long)]
    search: Option<String>,
  },
  /// Show, or clear, the recently selected addresses.
  Recent {
    #[arg(long)]
    clear: bool,
  },
  /// Show what an empty address field would suggest.
  Defaults,
  /// Drive a selector session line by line.
  Interactive,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = settings::Settings::load(&cli.config)
    .with_context(|| format!("loading {}", cli.config.display()))?;
  let engine = Engine::open(&settings, cli.profile)?;
  debug!(profile = ?engine.profile, "engine ready");

  match cli.command {
    Command::Search { text } => commands::search(&engine, &text.join(" "), cli.json).await,
    Command::Reverse { lon, lat } => {
      commands::reverse(&engine, Coordinates::new(lon, lat), cli.json).await
    }
    Command::Provinces { search } => {
      commands::provinces(&engine, search.as_deref(), cli.json).await
    }
    Command::Districts { province_id, search } => {
      commands::districts(&engine, &province_id, search.as_deref(), cli.json).await
    }
    Command::Recent { clear } => commands::recent(&engine, clear, cli.json),
    Command::Defaults => commands::defaults(&engine, cli.json).await,
    Command::Interactive => interactive::run(engine.session()?).await,
  }
}
