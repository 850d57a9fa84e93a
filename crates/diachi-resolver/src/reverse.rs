//! Map confirmation: tap a point, confirm, get an address.
//!
//! The flow itself does no I/O. The session asks it for coordinates with
//! [`ReverseFlow::begin_confirm`], performs the one reverse-geocode call, and
//! hands the outcome back through [`ReverseFlow::complete`].

use diachi_core::{Candidate, Coordinates, ProviderError};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReverseState {
  /// The map is closed.
  #[default]
  Idle,
  /// The map is open; `pending` is the latest tap, if any.
  AwaitingSelection { pending: Option<Coordinates> },
  /// A reverse-geocode call for `coordinates` is in flight.
  Resolving { coordinates: Coordinates },
  /// The last confirmation produced an address.
  Resolved(Candidate),
  /// Reported to the caller when a confirmation fails; the flow itself goes
  /// back to waiting with the coordinates kept.
  Failed { reason: String, coordinates: Coordinates },
}

#[derive(Debug, Default)]
pub struct ReverseFlow {
  state:        ReverseState,
  last_failure: Option<String>,
}

impl ReverseFlow {
  pub fn new() -> Self { Self::default() }

  pub fn state(&self) -> &ReverseState { &self.state }

  pub fn is_open(&self) -> bool { self.state != ReverseState::Idle }

  /// Reason for the most recent failed confirmation since the map opened.
  pub fn last_failure(&self) -> Option<&str> { self.last_failure.as_deref() }

  /// Open the map. Reopening an open map keeps its state.
  pub fn open(&mut self) {
    if self.state == ReverseState::Idle {
      self.state = ReverseState::AwaitingSelection { pending: None };
      self.last_failure = None;
    }
  }

  /// Record a tap. Returns `false` when the tap was ignored: the map is
  /// closed, or a confirmation is in flight.
  pub fn tap(&mut self, coordinates: Coordinates) -> bool {
    match self.state {
      ReverseState::Idle | ReverseState::Resolving { .. } => false,
      ReverseState::AwaitingSelection { .. }
      | ReverseState::Resolved(_)
      | ReverseState::Failed { .. } => {
        self.state = ReverseState::AwaitingSelection { pending: Some(coordinates) };
        true
      }
    }
  }

  /// Start confirming the pending tap and return its coordinates. Without a
  /// pending tap this does nothing and returns `None`.
  pub fn begin_confirm(&mut self) -> Option<Coordinates> {
    match self.state {
      ReverseState::AwaitingSelection { pending: Some(coordinates) } => {
        self.state = ReverseState::Resolving { coordinates };
        Some(coordinates)
      }
      _ => None,
    }
  }

  /// Apply the reverse-geocode outcome. Returns the resulting state, or
  /// `None` when no confirmation was in flight (the map was closed in the
  /// meantime).
  pub fn complete(
    &mut self,
    result: Result<Candidate, ProviderError>,
  ) -> Option<ReverseState> {
    let ReverseState::Resolving { coordinates } = self.state else {
      return None;
    };
    match result {
      Ok(candidate) => {
        self.state = ReverseState::Resolved(candidate);
        Some(self.state.clone())
      }
      Err(e) => {
        let reason = e.to_string();
        self.last_failure = Some(reason.clone());
        self.state = ReverseState::AwaitingSelection { pending: Some(coordinates) };
        Some(ReverseState::Failed { reason, coordinates })
      }
    }
  }

  /// Close the map, discarding any pending tap.
  pub fn close(&mut self) {
    self.state = ReverseState::Idle;
    self.last_failure = None;
  }
}
