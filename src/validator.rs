//! Answer checking for word-ordering exercises.
//!
//! Matching is exact and order-sensitive. The only normalization is
//! whitespace trimming and one trailing period.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verdict {
  Correct,
  /// The canonical answer is revealed on a miss.
  Incorrect { expected: String },
}

impl Verdict {
  pub fn is_correct(&self) -> bool {
    matches!(self, Verdict::Correct)
  }
}

pub fn normalize<S: AsRef<str>>(tokens: &[S]) -> String {
  let joined = tokens
    .iter()
    .map(|t| t.as_ref().trim())
    .filter(|t| !t.is_empty())
    .collect::<Vec<_>>()
    .join(" ");
  let trimmed = joined.trim_end();
  trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end().to_string()
}

pub fn validate<A: AsRef<str>, B: AsRef<str>>(submitted: &[A], canonical: &[B]) -> Verdict {
  let expected = normalize(canonical);
  if normalize(submitted) == expected {
    Verdict::Correct
  } else {
    Verdict::Incorrect { expected }
  }
}

/// Fisher-Yates shuffle of the tokens for display.
pub fn shuffled<R: Rng + ?Sized>(tokens: &[String], rng: &mut R) -> Vec<String> {
  let mut out = tokens.to_vec();
  out.shuffle(rng);
  out
}
