//! Sentence builder: the per-lesson selection state machine and the
//! assembler that turns a selection into an English preview and a
//! Spanish gloss.
//!
//! Selections always form a prefix of the step list. A step is enabled
//! once the step before it has a value, and changing a value clears the
//! first later step whose options were derived from it, together with
//! everything after that step.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::{Lesson, OptionSource, StepOption, StepRole};
use crate::error::BuilderError;

/// Client-facing view of one step.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
  pub index: usize,
  pub key: String,
  pub title: String,
  pub options: Vec<StepOption>,
  pub selected: Option<String>,
  pub is_completed: bool,
  pub is_disabled: bool,
}

#[derive(Clone, Debug)]
pub struct SentenceBuilder {
  lesson: Arc<Lesson>,
  selections: Vec<Option<StepOption>>,
}

impl SentenceBuilder {
  pub fn new(lesson: Arc<Lesson>) -> Self {
    let selections = vec![None; lesson.steps.len()];
    Self { lesson, selections }
  }

  pub fn lesson(&self) -> &Lesson {
    &self.lesson
  }

  pub fn len(&self) -> usize {
    self.selections.len()
  }

  pub fn is_empty(&self) -> bool {
    self.selections.is_empty()
  }

  pub fn selected(&self, step: usize) -> Option<&StepOption> {
    self.selections.get(step).and_then(Option::as_ref)
  }

  pub fn is_completed(&self, step: usize) -> bool {
    self.selected(step).is_some()
  }

  pub fn is_disabled(&self, step: usize) -> bool {
    step > 0 && !self.is_completed(step - 1)
  }

  /// All steps have a value.
  pub fn is_complete(&self) -> bool {
    self.selections.iter().all(Option::is_some)
  }

  /// Options currently offered at `step`.
  pub fn options(&self, step: usize) -> &[StepOption] {
    let Some(def) = self.lesson.steps.get(step) else {
      return &[];
    };
    match &def.options {
      OptionSource::Fixed { options } => options,
      OptionSource::DependsOn { step: parent, by_key } => self
        .selected(*parent)
        .and_then(|p| by_key.get(&p.key))
        .map(Vec::as_slice)
        .unwrap_or(&[]),
    }
  }

  /// Select `option` at `step`. Returns the indexes of the steps whose
  /// selection was discarded as a consequence.
  pub fn select(&mut self, step: usize, option: &str) -> Result<Vec<usize>, BuilderError> {
    let len = self.len();
    if step >= len {
      return Err(BuilderError::StepOutOfRange { step, len });
    }
    if self.is_disabled(step) {
      return Err(BuilderError::StepDisabled { step });
    }
    let chosen = self
      .options(step)
      .iter()
      .find(|o| o.key == option)
      .cloned()
      .ok_or_else(|| BuilderError::UnknownOption { step, option: option.to_string() })?;

    if self.selected(step).is_some_and(|cur| cur.key == chosen.key) {
      return Ok(Vec::new());
    }

    self.selections[step] = Some(chosen);

    let cleared = match (step + 1..len).find(|&i| self.lesson.derives_from(i, step)) {
      Some(first) => self.clear_from(first),
      None => Vec::new(),
    };
    debug!(target: "builder", lesson = %self.lesson.id, step, %option, ?cleared, "option selected");
    Ok(cleared)
  }

  /// Unselect `step` and every step after it.
  pub fn clear(&mut self, step: usize) -> Result<Vec<usize>, BuilderError> {
    let len = self.len();
    if step >= len {
      return Err(BuilderError::StepOutOfRange { step, len });
    }
    Ok(self.clear_from(step))
  }

  pub fn reset(&mut self) {
    self.selections.iter_mut().for_each(|s| *s = None);
  }

  fn clear_from(&mut self, from: usize) -> Vec<usize> {
    let mut cleared = Vec::new();
    for (i, slot) in self.selections.iter_mut().enumerate().skip(from) {
      if slot.take().is_some() {
        cleared.push(i);
      }
    }
    cleared
  }

  pub fn views(&self) -> Vec<StepView> {
    self.lesson
      .steps
      .iter()
      .enumerate()
      .map(|(index, def)| StepView {
        index,
        key: def.key.clone(),
        title: def.title.clone(),
        options: self.options(index).to_vec(),
        selected: self.selected(index).map(|o| o.key.clone()),
        is_completed: self.is_completed(index),
        is_disabled: self.is_disabled(index),
      })
      .collect()
  }

  /// English preview: the selected labels joined by spaces, in step order.
  pub fn preview(&self) -> String {
    self.selections
      .iter()
      .flatten()
      .map(|o| o.label.as_str())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Spanish gloss of the finished sentence. `None` until every step is set.
  pub fn gloss(&self) -> Option<String> {
    if !self.is_complete() {
      return None;
    }
    let chosen: Vec<&StepOption> = self.selections.iter().flatten().collect();

    let subject = self.with_role(StepRole::Subject).map(|o| o.key.as_str());
    let tense = self
      .with_role(StepRole::Time)
      .and_then(|o| o.tense.as_deref())
      .unwrap_or(self.lesson.tense.as_str());

    let parts: Vec<String> = self
      .lesson
      .steps
      .iter()
      .zip(chosen.iter())
      .filter_map(|(def, opt)| {
        let base = paired_gloss(opt, &chosen).unwrap_or(opt.gloss.as_str());
        let word = match (def.role, subject) {
          (StepRole::Verb, Some(subj)) => {
            self.lesson.conjugate(tense, subj, base).unwrap_or(base)
          }
          _ => base,
        };
        (!word.is_empty()).then(|| word.to_string())
      })
      .collect();
    Some(parts.join(" "))
  }

  fn with_role(&self, role: StepRole) -> Option<&StepOption> {
    self.lesson
      .steps
      .iter()
      .position(|s| s.role == role)
      .and_then(|i| self.selected(i))
  }
}

/// Context-dependent gloss: the first other selected option (in step order)
/// that `opt` carries an override for.
fn paired_gloss<'a>(opt: &'a StepOption, chosen: &[&StepOption]) -> Option<&'a str> {
  chosen
    .iter()
    .filter(|other| other.key != opt.key)
    .find_map(|other| opt.overrides.get(&other.key))
    .map(String::as_str)
}
