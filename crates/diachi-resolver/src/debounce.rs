//! Debounce controller: at most one settled query per settling window.
//!
//! Each input change aborts the pending timer before arming a new one. Blank
//! input skips the timer and yields [`DebounceSignal::Clear`] straight away.
//! Only the most recently armed signal is ever delivered, so a timer that
//! fired just before being cancelled cannot leak a stale settle.

use std::time::Duration;

use diachi_core::Query;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::trace;

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Adaptive settle delay: short for the first character, longer after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
  /// Delay when the trimmed input is exactly one character.
  pub short_delay: Duration,
  /// Delay when the trimmed input is two characters or more.
  pub long_delay:  Duration,
}

impl DebouncePolicy {
  pub const fn new(short_delay: Duration, long_delay: Duration) -> Self {
    Self { short_delay, long_delay }
  }

  /// `None` means "clear now, no timer".
  pub fn delay_for(&self, trimmed_len: usize) -> Option<Duration> {
    match trimmed_len {
      0 => None,
      1 => Some(self.short_delay),
      _ => Some(self.long_delay),
    }
  }
}

impl Default for DebouncePolicy {
  fn default() -> Self {
    Self::new(Duration::from_millis(100), Duration::from_millis(200))
  }
}

// ─── Signals ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceSignal {
  /// The input stopped changing; `Query` is what it settled on.
  Settled(Query),
  /// The input became blank. Carries the sequence of the blank query.
  Clear { sequence: u64 },
}

impl DebounceSignal {
  pub fn sequence(&self) -> u64 {
    match self {
      Self::Settled(q) => q.sequence,
      Self::Clear { sequence } => *sequence,
    }
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Owns the pending settle timer. Dropping the controller aborts it.
///
/// Must be used from within a tokio runtime; timers are spawned tasks.
pub struct Debouncer {
  policy:  DebouncePolicy,
  tx:      mpsc::UnboundedSender<DebounceSignal>,
  rx:      mpsc::UnboundedReceiver<DebounceSignal>,
  pending: Option<JoinHandle<()>>,
  /// Sequence of the one signal that may still be delivered.
  armed:   Option<u64>,
}

impl Debouncer {
  pub fn new(policy: DebouncePolicy) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      policy,
      tx,
      rx,
      pending: None,
      armed: None,
    }
  }

  /// Register a new input value, replacing whatever was pending.
  pub fn input_changed(&mut self, query: Query) {
    self.cancel();
    self.armed = Some(query.sequence);

    match self.policy.delay_for(query.trimmed_len) {
      None => {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.tx.send(DebounceSignal::Clear { sequence: query.sequence });
      }
      Some(delay) => {
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
          tokio::time::sleep(delay).await;
          let _ = tx.send(DebounceSignal::Settled(query));
        }));
      }
    }
  }

  /// Abort the pending timer. Nothing armed before this call is delivered.
  pub fn cancel(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
    self.armed = None;
  }

  /// Whether a signal is still owed to [`Debouncer::next`].
  pub fn is_armed(&self) -> bool { self.armed.is_some() }

  /// Wait for the armed signal. Pends forever when nothing is armed.
  ///
  /// Cancel-safe: dropping the future loses nothing.
  pub async fn next(&mut self) -> Option<DebounceSignal> {
    loop {
      let signal = self.rx.recv().await?;
      if self.armed == Some(signal.sequence()) {
        self.armed = None;
        self.pending = None;
        return Some(signal);
      }
      trace!(sequence = signal.sequence(), "dropping superseded debounce signal");
    }
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) { self.cancel(); }
}
