//! Place identity: when two candidates describe the same place.
//!
//! Names are compared on a folded key: diacritics stripped with `deunicode`,
//! lowercased, whitespace collapsed. "Quận 1", "quan 1" and "QUẬN  1" all fold
//! to `"quan 1"`.

use deunicode::deunicode;

use crate::candidate::Candidate;

/// Maximum per-axis distance, in degrees, for two positions to be the same
/// place (about 100 m at the equator).
pub const COORDINATE_TOLERANCE_DEG: f64 = 0.001;

/// Accent-insensitive, case-insensitive comparison key.
pub fn fold_key(s: &str) -> String {
  deunicode(s)
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Folded equality. Two blank names never match.
pub fn names_match(a: &str, b: &str) -> bool {
  let a = fold_key(a);
  !a.is_empty() && a == fold_key(b)
}

/// Whether `a` and `b` collapse into one entry during deduplication.
pub fn same_place(a: &Candidate, b: &Candidate) -> bool {
  if a.id == b.id || names_match(&a.name, &b.name) {
    return true;
  }
  match (&a.coordinates, &b.coordinates) {
    (Some(ca), Some(cb)) => ca.is_near(cb, COORDINATE_TOLERANCE_DEG),
    _ => false,
  }
}
