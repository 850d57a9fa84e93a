//! The address resolution and autocomplete engine.
//!
//! A [`SelectorSession`] drives one address input field. It coalesces
//! keystrokes with a [`Debouncer`], fans settled queries out to every
//! configured provider through the [`Aggregator`], remembers chosen addresses
//! in a [`RecencyCache`], and turns map taps into addresses with a
//! [`ReverseFlow`].
//!
//! ```rust,ignore
//! let profile = SelectorProfile::Compact;
//! let aggregator = Aggregator::standard(profile.aggregator_config(), directory, geocoder.clone());
//! let mut session = SelectorSession::new(profile, aggregator, geocoder, store);
//!
//! session.on_input_changed("Quận 1");
//! while let Some(update) = session.next_update().await {
//!   render(session.results());
//! }
//! ```

pub mod aggregator;
pub mod debounce;
pub mod popular;
pub mod profile;
pub mod recency;
pub mod reverse;
pub mod session;

pub use aggregator::{Aggregator, AggregatorConfig, Resolution, ResolutionStatus};
pub use debounce::{DebouncePolicy, DebounceSignal, Debouncer};
pub use profile::SelectorProfile;
pub use recency::{RECENT_ADDRESSES_KEY, RecencyCache};
pub use reverse::{ReverseFlow, ReverseState};
pub use session::{
  ConfirmOutcome, NoopListener, SearchStatus, SelectorListener, SelectorSession,
  SessionUpdate,
};

#[cfg(test)]
mod testing;
