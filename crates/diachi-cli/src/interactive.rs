//! Line-driven selector session.
//!
//! Every line typed is treated as the new content of the address field,
//! except lines starting with `:`, which are commands.

use diachi_core::{AddressSelection, Coordinates};
use diachi_resolver::{
  ConfirmOutcome, SearchStatus, SelectorListener, SelectorSession, SessionUpdate,
};
use diachi_store_sqlite::SqliteKvStore;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{debug, info};

use crate::commands::{describe_status, print_candidates};

const HELP: &str = "\
type to search, or:
  :pick N         select result N
  :map            open the map
  :tap LON LAT    tap the map
  :confirm        resolve the last tap
  :close          close the map
  :recent         show recent addresses
  :defaults       show suggestions for an empty field
  :help           this text
  :quit           exit";

// ─── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Input {
  Text(String),
  Pick(usize),
  Map,
  Tap(Coordinates),
  Confirm,
  Close,
  Recent,
  Defaults,
  Help,
  Quit,
}

fn parse(line: &str) -> Result<Input, String> {
  let Some(command) = line.trim().strip_prefix(':') else {
    return Ok(Input::Text(line.to_owned()));
  };
  let mut words = command.split_whitespace();
  let input = match words.next().unwrap_or_default() {
    "pick" => {
      let n = words
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .ok_or("usage: :pick N (N starts at 1)")?;
      Input::Pick(n)
    }
    "tap" => {
      let mut coord = || words.next().and_then(|w| w.parse::<f64>().ok());
      match (coord(), coord()) {
        (Some(lon), Some(lat)) if Coordinates::new(lon, lat).is_valid() => {
          Input::Tap(Coordinates::new(lon, lat))
        }
        _ => return Err("usage: :tap LON LAT".into()),
      }
    }
    "map" => Input::Map,
    "confirm" => Input::Confirm,
    "close" => Input::Close,
    "recent" => Input::Recent,
    "defaults" => Input::Defaults,
    "help" | "?" => Input::Help,
    "quit" | "q" => Input::Quit,
    other => return Err(format!("unknown command :{other} (try :help)")),
  };
  Ok(input)
}

// ─── Listener ────────────────────────────────────────────────────────────────

struct Console;

impl SelectorListener for Console {
  fn on_address_select(&mut self, selection: &AddressSelection) {
    println!("selected: {}", selection.address);
    if let Some(at) = selection.coordinates {
      println!("      at: {at}");
    }
  }

  fn on_search_unavailable(&mut self) {
    println!("couldn't search right now");
  }

  fn on_reverse_failed(&mut self, reason: &str) {
    println!("no address for that point: {reason}");
  }
}

// ─── Loop ────────────────────────────────────────────────────────────────────

pub async fn run(session: SelectorSession<SqliteKvStore>) -> anyhow::Result<()> {
  let mut session = session.with_listener(Console);
  info!(profile = ?session.profile(), "interactive session started");
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  println!("{HELP}");

  loop {
    tokio::select! {
      line = lines.next_line() => {
        let Some(line) = line? else { break };
        match parse(&line) {
          Ok(Input::Quit) => break,
          Ok(input) => handle(&mut session, input).await,
          Err(usage) => println!("{usage}"),
        }
      }
      Some(update) = session.next_update() => report(&session, &update),
    }
  }
  Ok(())
}

async fn handle(session: &mut SelectorSession<SqliteKvStore>, input: Input) {
  match input {
    Input::Text(text) => session.on_input_changed(text),
    Input::Pick(n) => {
      if session.select(n - 1).is_none() {
        println!("no result {n}");
      }
    }
    Input::Map => {
      session.on_map_opened();
      println!("map open; :tap LON LAT then :confirm");
    }
    Input::Tap(at) => {
      if !session.on_map_tapped(at) {
        println!("tap ignored (is the map open?)");
      }
    }
    Input::Confirm => {
      if session.on_map_confirmed().await == ConfirmOutcome::NothingToConfirm {
        println!("nothing to confirm; tap the map first");
      }
    }
    Input::Close => session.on_map_closed(),
    Input::Recent => print_candidates(session.recents()),
    Input::Defaults => print_candidates(&session.defaults().await),
    Input::Help => println!("{HELP}"),
    Input::Quit => {}
  }
}

fn report(session: &SelectorSession<SqliteKvStore>, update: &SessionUpdate) {
  match update {
    SessionUpdate::Searching { .. } => println!("searching “{}”…", session.text().trim()),
    SessionUpdate::Results { status, .. } => {
      if let Some(note) = describe_status(status) {
        println!("note: {note}");
      }
      if session.status() == SearchStatus::Ready {
        print_candidates(session.results());
      }
    }
    SessionUpdate::Cleared { .. } | SessionUpdate::Unavailable { .. } | SessionUpdate::Stale { .. } => {
      debug!(?update, "session update");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_lines_are_input_text() {
    assert_eq!(parse("Quận 1"), Ok(Input::Text("Quận 1".into())));
    assert_eq!(parse("   "), Ok(Input::Text("   ".into())));
  }

  #[test]
  fn commands_parse() {
    assert_eq!(parse(":pick 2"), Ok(Input::Pick(2)));
    assert_eq!(parse(" :tap 106.7017 10.7769 "), Ok(Input::Tap(Coordinates::new(106.7017, 10.7769))));
    assert_eq!(parse(":confirm"), Ok(Input::Confirm));
    assert_eq!(parse(":q"), Ok(Input::Quit));
  }

  #[test]
  fn malformed_commands_are_rejected() {
    assert!(parse(":pick 0").is_err());
    assert!(parse(":pick x").is_err());
    assert!(parse(":tap 106.7").is_err());
    assert!(parse(":tap 200 10").is_err());
    assert!(parse(":fly").is_err());
  }
}
