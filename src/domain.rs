//! Domain models: vocabulary options, builder steps, lessons and exercises.
//!
//! All of this is reference data. It is built at startup (seeds + TOML bank)
//! and never mutated while the server runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single selectable word block.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepOption {
  pub key: String,
  /// English text shown on the block.
  pub label: String,
  /// Spanish base gloss. For verbs this is the infinitive.
  #[serde(default)]
  pub gloss: String,
  /// Alternate gloss used when another selected option has the given key,
  /// e.g. `play` + `the_guitar` => `tocar` instead of `jugar`.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub overrides: BTreeMap<String, String>,
  /// Time options may switch the tense used to conjugate the verb.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tense: Option<String>,
}

impl StepOption {
  pub fn new(key: &str, label: &str, gloss: &str) -> Self {
    Self {
      key: key.into(),
      label: label.into(),
      gloss: gloss.into(),
      overrides: BTreeMap::new(),
      tense: None,
    }
  }

  pub fn with_override(mut self, paired_key: &str, gloss: &str) -> Self {
    self.overrides.insert(paired_key.into(), gloss.into());
    self
  }

  pub fn with_tense(mut self, tense: &str) -> Self {
    self.tense = Some(tense.into());
    self
  }
}

/// What a step contributes to the sentence. The assembler needs to know
/// which step holds the subject and which holds the verb.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
  Subject,
  Verb,
  Extra,
  Time,
  Other,
}

impl Default for StepRole {
  fn default() -> Self { StepRole::Other }
}

/// Where the options of a step come from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionSource {
  /// Same options whatever was chosen before.
  Fixed { options: Vec<StepOption> },
  /// Options computed from the option selected at an earlier step
  /// (e.g. the complements that fit the chosen verb).
  DependsOn {
    step: usize,
    by_key: BTreeMap<String, Vec<StepOption>>,
  },
}

impl OptionSource {
  /// Index of the parent step, if this source is derived.
  pub fn parent(&self) -> Option<usize> {
    match self {
      OptionSource::Fixed { .. } => None,
      OptionSource::DependsOn { step, .. } => Some(*step),
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepDef {
  pub key: String,
  pub title: String,
  #[serde(default)]
  pub role: StepRole,
  pub options: OptionSource,
}

/// Token-ordering exercise: the learner must rebuild `tokens` in order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
  pub id: String,
  pub tokens: Vec<String>,
  #[serde(default)]
  pub gloss: String,
}

/// tense -> subject key -> infinitive -> conjugated form
pub type ConjugationTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

/// One grammar-topic page of the curriculum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub topic: String,
  /// Position in the curriculum. Lessons are served in ascending order.
  pub order: u32,
  #[serde(default = "default_tense")]
  pub tense: String,
  pub steps: Vec<StepDef>,
  #[serde(default)]
  pub conjugations: ConjugationTable,
  #[serde(default)]
  pub exercises: Vec<Exercise>,
}

fn default_tense() -> String { "present".into() }

impl Lesson {
  /// Look up a conjugated verb form. `None` when the table has no entry.
  pub fn conjugate(&self, tense: &str, subject: &str, infinitive: &str) -> Option<&str> {
    self.conjugations
      .get(tense)?
      .get(subject)?
      .get(infinitive)
      .map(String::as_str)
  }

  /// True if step `step` draws its options, directly or through other
  /// steps, from the selection made at `ancestor`.
  pub fn derives_from(&self, step: usize, ancestor: usize) -> bool {
    let mut cur = step;
    // Parents always point backwards, so this walk terminates.
    while let Some(parent) = self.steps.get(cur).and_then(|s| s.options.parent()) {
      if parent == ancestor {
        return true;
      }
      if parent >= cur {
        return false;
      }
      cur = parent;
    }
    false
  }

  /// Reject lessons that cannot be played: no steps, or a step whose
  /// options depend on a step that does not come before it.
  pub fn check(&self) -> Result<(), String> {
    if self.steps.is_empty() {
      return Err("lesson has no steps".into());
    }
    for (i, step) in self.steps.iter().enumerate() {
      if let Some(parent) = step.options.parent() {
        if parent >= i {
          return Err(format!("step {} ({}) depends on step {}, which does not precede it", i, step.key, parent));
        }
      }
    }
    Ok(())
  }

  pub fn exercise(&self, id: &str) -> Option<&Exercise> {
    self.exercises.iter().find(|e| e.id == id)
  }
}

/// Per-level completion record posted by the client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
  pub level_id: String,
  pub completed: bool,
  #[serde(default)]
  pub score: u32,
  #[serde(default)]
  pub attempts: u32,
}
