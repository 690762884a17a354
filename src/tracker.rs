//! Progress / feedback tracker.
//!
//! Counts interactions and completed levels and decides when the learner
//! should be asked for feedback. Counters live in the key-value store so
//! they survive restarts; the "modal open" flag is transient.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::StoreError;
use crate::store::{KeyValueStore, KeyValueStoreExt};

const KEY_INTERACTIONS: &str = "feedback:interactions";
const KEY_LEVELS: &str = "feedback:levels_completed";
const KEY_SHOWN: &str = "feedback:has_shown";

/// Thresholds of the "ask for feedback" heuristic. Rules are checked in
/// field order and the first match wins.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedbackPolicy {
  /// Ask once this many levels are completed.
  pub levels_alone: u32,
  /// Ask once both `levels_with_interactions` levels and
  /// `interactions_with_levels` interactions are reached.
  pub levels_with_interactions: u32,
  pub interactions_with_levels: u32,
  /// Ask once this many interactions are counted.
  pub interactions_alone: u32,
}

impl Default for FeedbackPolicy {
  fn default() -> Self {
    Self {
      levels_alone: 2,
      levels_with_interactions: 4,
      interactions_with_levels: 8,
      interactions_alone: 15,
    }
  }
}

impl FeedbackPolicy {
  pub fn should_show(&self, interactions: u32, levels: u32) -> bool {
    levels >= self.levels_alone
      || (levels >= self.levels_with_interactions && interactions >= self.interactions_with_levels)
      || interactions >= self.interactions_alone
  }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackState {
  pub interactions: u32,
  pub levels_completed: u32,
  pub has_shown_feedback: bool,
  pub show_feedback_modal: bool,
}

impl FeedbackState {
  /// Open the modal if the policy says so. Never reopens once shown.
  fn evaluate(&mut self, policy: &FeedbackPolicy) -> bool {
    if self.has_shown_feedback || self.show_feedback_modal {
      return false;
    }
    if policy.should_show(self.interactions, self.levels_completed) {
      self.show_feedback_modal = true;
      return true;
    }
    false
  }
}

pub struct FeedbackTracker {
  store: Arc<dyn KeyValueStore>,
  policy: FeedbackPolicy,
  state: Mutex<FeedbackState>,
}

impl FeedbackTracker {
  /// Load counters from the store.
  pub fn load(store: Arc<dyn KeyValueStore>, policy: FeedbackPolicy) -> Self {
    let state = FeedbackState {
      interactions: store.get_json(KEY_INTERACTIONS).unwrap_or(0),
      levels_completed: store.get_json(KEY_LEVELS).unwrap_or(0),
      has_shown_feedback: store.get_json(KEY_SHOWN).unwrap_or(false),
      show_feedback_modal: false,
    };
    info!(target: "tracker", interactions = state.interactions, levels = state.levels_completed, shown = state.has_shown_feedback, "Feedback tracker loaded");
    Self { store, policy, state: Mutex::new(state) }
  }

  pub fn snapshot(&self) -> FeedbackState {
    self.lock().clone()
  }

  #[instrument(level = "debug", skip(self))]
  pub fn track_interaction(&self) -> Result<FeedbackState, StoreError> {
    let mut st = self.lock();
    let next = st.interactions.saturating_add(1);
    self.store.set_json(KEY_INTERACTIONS, &next)?;
    st.interactions = next;
    self.after_event(&mut st);
    Ok(st.clone())
  }

  #[instrument(level = "debug", skip(self))]
  pub fn track_level_completed(&self) -> Result<FeedbackState, StoreError> {
    let mut st = self.lock();
    let next = st.levels_completed.saturating_add(1);
    self.store.set_json(KEY_LEVELS, &next)?;
    st.levels_completed = next;
    self.after_event(&mut st);
    Ok(st.clone())
  }

  /// Close the modal for good.
  pub fn mark_feedback_shown(&self) -> Result<FeedbackState, StoreError> {
    let mut st = self.lock();
    self.store.set_json(KEY_SHOWN, &true)?;
    st.has_shown_feedback = true;
    st.show_feedback_modal = false;
    info!(target: "tracker", "Feedback marked as shown");
    Ok(st.clone())
  }

  pub fn reset(&self) -> Result<FeedbackState, StoreError> {
    let mut st = self.lock();
    *st = FeedbackState::default();
    for key in [KEY_INTERACTIONS, KEY_LEVELS, KEY_SHOWN] {
      self.store.remove(key)?;
    }
    Ok(st.clone())
  }

  fn after_event(&self, st: &mut FeedbackState) {
    if st.evaluate(&self.policy) {
      info!(target: "tracker", interactions = st.interactions, levels = st.levels_completed, "Feedback modal triggered");
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, FeedbackState> {
    self.state.lock().unwrap_or_else(|p| p.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  fn tracker() -> FeedbackTracker {
    FeedbackTracker::load(Arc::new(MemoryStore::new()), FeedbackPolicy::default())
  }

  #[test]
  fn two_levels_open_the_modal_once() {
    let t = tracker();
    assert!(!t.track_level_completed().unwrap().show_feedback_modal);
    assert!(t.track_level_completed().unwrap().show_feedback_modal);
    // Still open, not re-triggered.
    assert!(t.track_interaction().unwrap().show_feedback_modal);

    let st = t.mark_feedback_shown().unwrap();
    assert!(st.has_shown_feedback && !st.show_feedback_modal);
    for _ in 0..20 {
      assert!(!t.track_interaction().unwrap().show_feedback_modal);
    }
    assert!(!t.track_level_completed().unwrap().show_feedback_modal);
  }

  #[test]
  fn fifteen_interactions_open_the_modal() {
    let t = tracker();
    for _ in 0..14 {
      assert!(!t.track_interaction().unwrap().show_feedback_modal);
    }
    assert!(t.track_interaction().unwrap().show_feedback_modal);
  }

  #[test]
  fn combined_rule_applies_with_custom_thresholds() {
    let policy = FeedbackPolicy { levels_alone: 10, ..FeedbackPolicy::default() };
    let t = FeedbackTracker::load(Arc::new(MemoryStore::new()), policy);
    for _ in 0..4 {
      t.track_level_completed().unwrap();
    }
    for _ in 0..7 {
      assert!(!t.track_interaction().unwrap().show_feedback_modal);
    }
    assert!(t.track_interaction().unwrap().show_feedback_modal);
  }

  #[test]
  fn counters_and_shown_flag_persist() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    {
      let t = FeedbackTracker::load(store.clone(), FeedbackPolicy::default());
      t.track_interaction().unwrap();
      t.track_level_completed().unwrap();
      t.mark_feedback_shown().unwrap();
    }
    let t = FeedbackTracker::load(store, FeedbackPolicy::default());
    let st = t.snapshot();
    assert_eq!((st.interactions, st.levels_completed), (1, 1));
    assert!(st.has_shown_feedback);
    assert!(!t.track_level_completed().unwrap().show_feedback_modal);
  }

  struct ReadOnlyStore;

  impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Option<String> {
      None
    }
    fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
      Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }
    fn remove(&self, _key: &str) -> Result<(), StoreError> {
      Ok(())
    }
    fn keys_with_prefix(&self, _prefix: &str) -> Vec<String> {
      Vec::new()
    }
  }

  #[test]
  fn failed_writes_leave_counters_untouched() {
    let t = FeedbackTracker::load(Arc::new(ReadOnlyStore), FeedbackPolicy::default());
    assert!(t.track_interaction().is_err());
    assert!(t.track_level_completed().is_err());
    assert!(t.mark_feedback_shown().is_err());
    assert_eq!(t.snapshot(), FeedbackState::default());
  }

  #[test]
  fn reset_clears_everything() {
    let t = tracker();
    t.track_level_completed().unwrap();
    t.mark_feedback_shown().unwrap();
    assert_eq!(t.reset().unwrap(), FeedbackState::default());
  }
}
