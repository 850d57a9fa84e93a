//! [`Query`]: one keystroke's worth of search input.

use chrono::{DateTime, Utc};

/// An immutable snapshot of the input field, tagged with the sequence number
/// used to discard responses that arrive after a newer query was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  pub text:        String,
  /// Length of the trimmed text in characters, not bytes.
  pub trimmed_len: usize,
  pub sequence:    u64,
  pub issued_at:   DateTime<Utc>,
}

impl Query {
  pub fn new(text: impl Into<String>, sequence: u64) -> Self {
    let text = text.into();
    let trimmed_len = text.trim().chars().count();
    Self {
      text,
      trimmed_len,
      sequence,
      issued_at: Utc::now(),
    }
  }

  pub fn trimmed(&self) -> &str { self.text.trim() }

  pub fn is_blank(&self) -> bool { self.trimmed_len == 0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trimmed_length_counts_characters() {
    let q = Query::new("  Quận 1 ", 3);
    assert_eq!(q.trimmed(), "Quận 1");
    assert_eq!(q.trimmed_len, 6);
    assert_eq!(q.sequence, 3);
  }

  #[test]
  fn whitespace_only_is_blank() {
    assert!(Query::new(" \t ", 0).is_blank());
    assert!(!Query::new("a", 0).is_blank());
  }
}
