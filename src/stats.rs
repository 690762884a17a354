//! Interaction log and per-session statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
  WordSelected,
  AnswerCorrect,
  AnswerIncorrect,
  Retry,
  SessionComplete,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
  pub kind: InteractionKind,
  pub at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
  pub total_interactions: usize,
  pub words_selected: usize,
  pub correct_answers: usize,
  pub incorrect_answers: usize,
  pub retries: usize,
  /// `correct / (correct + incorrect)`; absent before the first answer.
  pub accuracy: Option<f32>,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
}

/// Append-only event log of one exercise session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionLog {
  pub started_at: DateTime<Utc>,
  events: Vec<Interaction>,
}

impl Default for SessionLog {
  fn default() -> Self {
    Self::new()
  }
}

impl SessionLog {
  pub fn new() -> Self {
    Self { started_at: Utc::now(), events: Vec::new() }
  }

  pub fn record(&mut self, kind: InteractionKind, detail: Option<String>) -> &Interaction {
    self.events.push(Interaction { kind, at: Utc::now(), detail });
    &self.events[self.events.len() - 1]
  }

  pub fn stats(&self) -> SessionStats {
    let count = |k: InteractionKind| self.events.iter().filter(|e| e.kind == k).count();
    let correct = count(InteractionKind::AnswerCorrect);
    let incorrect = count(InteractionKind::AnswerIncorrect);
    let answered = correct + incorrect;
    SessionStats {
      total_interactions: self.events.len(),
      words_selected: count(InteractionKind::WordSelected),
      correct_answers: correct,
      incorrect_answers: incorrect,
      retries: count(InteractionKind::Retry),
      accuracy: (answered > 0).then(|| correct as f32 / answered as f32),
      started_at: Some(self.started_at),
      completed_at: self
        .events
        .iter()
        .rev()
        .find(|e| e.kind == InteractionKind::SessionComplete)
        .map(|e| e.at),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_log_has_no_accuracy() {
    let s = SessionLog::new().stats();
    assert_eq!(s.total_interactions, 0);
    assert_eq!(s.accuracy, None);
    assert!(s.completed_at.is_none());
  }

  #[test]
  fn counts_by_kind() {
    let mut log = SessionLog::new();
    log.record(InteractionKind::WordSelected, Some("she".into()));
    log.record(InteractionKind::WordSelected, Some("play".into()));
    log.record(InteractionKind::AnswerIncorrect, None);
    log.record(InteractionKind::Retry, None);
    log.record(InteractionKind::AnswerCorrect, None);
    log.record(InteractionKind::SessionComplete, None);

    let s = log.stats();
    assert_eq!(s.total_interactions, 6);
    assert_eq!(s.words_selected, 2);
    assert_eq!(s.retries, 1);
    assert_eq!(s.accuracy, Some(0.5));
    assert!(s.completed_at.is_some());
  }

  #[test]
  fn log_serializes_with_snake_case_kinds() {
    let mut log = SessionLog::new();
    log.record(InteractionKind::AnswerCorrect, None);
    let json = serde_json::to_string(&log).unwrap();
    assert!(json.contains("\"answer_correct\""));
  }
}
