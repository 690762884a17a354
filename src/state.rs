//! Application state: curriculum, live learner sessions, tracker, store and audio client.
//!
//! This module owns:
//!   - the ordered curriculum (built-in seeds + optional TOML bank)
//!   - learner sessions (builder state + interaction log), by id
//!   - the key-value store ("local storage") and the feedback tracker
//!   - the optional audio client

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::audio::AudioClient;
use crate::builder::SentenceBuilder;
use crate::config::{load_config_from_env, AppConfig};
use crate::domain::Lesson;
use crate::seeds::seed_lessons;
use crate::stats::SessionLog;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::tracker::FeedbackTracker;

/// Sessions untouched for this long are dropped on the next `open_session`.
pub const SESSION_IDLE_MINUTES: i64 = 30;

/// One visit to a lesson page.
pub struct Session {
  pub id: String,
  pub builder: SentenceBuilder,
  pub log: SessionLog,
  /// Exercise served most recently.
  pub last_served: Option<String>,
  /// Exercises answered correctly, by id.
  pub solved: Vec<String>,
  pub last_seen: DateTime<Utc>,
}

impl Session {
  pub fn new(lesson: Arc<Lesson>) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      builder: SentenceBuilder::new(lesson),
      log: SessionLog::new(),
      last_served: None,
      solved: Vec::new(),
      last_seen: Utc::now(),
    }
  }

  pub fn lesson(&self) -> &Lesson {
    self.builder.lesson()
  }
}

pub struct AppState {
  /// Sorted by `Lesson::order`.
  pub lessons: Vec<Arc<Lesson>>,
  pub sessions: RwLock<HashMap<String, Session>>,
  pub store: Arc<dyn KeyValueStore>,
  pub tracker: FeedbackTracker,
  pub audio: Option<AudioClient>,
  /// Serializes level-progress saves so a level counts as completed once.
  pub(crate) progress_lock: Mutex<()>,
}

impl AppState {
  /// Build state from env: config file, DATA_PATH store, AUDIO_API_URL client.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_config_from_env().unwrap_or_default();

    let store: Arc<dyn KeyValueStore> = match std::env::var("DATA_PATH") {
      Ok(path) => match FileStore::open(&path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
          error!(target: "fluentblocks", %path, error = %e, "Cannot open DATA_PATH; falling back to memory store");
          Arc::new(MemoryStore::new())
        }
      },
      Err(_) => {
        info!(target: "fluentblocks", "DATA_PATH not set; progress is kept in memory only");
        Arc::new(MemoryStore::new())
      }
    };

    let audio = AudioClient::from_env();
    if let Some(a) = &audio {
      info!(target: "fluentblocks", endpoint = %a.endpoint, "Audio generation enabled.");
    } else {
      info!(target: "fluentblocks", "Audio generation disabled (no AUDIO_API_URL).");
    }

    Self::with_parts(cfg, store, audio)
  }

  /// Assemble state from explicit parts. Used by `new` and by tests.
  pub fn with_parts(cfg: AppConfig, store: Arc<dyn KeyValueStore>, audio: Option<AudioClient>) -> Self {
    let mut by_id: HashMap<String, Lesson> = HashMap::new();
    for l in seed_lessons() {
      by_id.insert(l.id.clone(), l);
    }
    for l in cfg.lessons {
      if let Err(reason) = l.check() {
        error!(target: "fluentblocks", id = %l.id, %reason, "Skipping config lesson: unplayable.");
        continue;
      }
      if by_id.contains_key(&l.id) {
        warn!(target: "fluentblocks", id = %l.id, "Config lesson replaces built-in lesson");
      }
      by_id.insert(l.id.clone(), l);
    }

    let mut lessons: Vec<Arc<Lesson>> = by_id.into_values().map(Arc::new).collect();
    lessons.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    for l in &lessons {
      info!(target: "fluentblocks", id = %l.id, order = l.order, steps = l.steps.len(), exercises = l.exercises.len(), "Curriculum lesson");
    }

    let tracker = FeedbackTracker::load(store.clone(), cfg.feedback);

    Self {
      lessons,
      sessions: RwLock::new(HashMap::new()),
      store,
      tracker,
      audio,
      progress_lock: Mutex::new(()),
    }
  }

  pub fn lesson(&self, id: &str) -> Option<Arc<Lesson>> {
    self.lessons.iter().find(|l| l.id == id).cloned()
  }

  /// The lesson after `id` in curriculum order, if any.
  pub fn next_lesson(&self, id: &str) -> Option<Arc<Lesson>> {
    let pos = self.lessons.iter().position(|l| l.id == id)?;
    self.lessons.get(pos + 1).cloned()
  }

  /// Start a session on a lesson. Returns the new session id.
  #[instrument(level = "debug", skip(self))]
  pub async fn open_session(&self, lesson_id: &str) -> Option<String> {
    let lesson = self.lesson(lesson_id)?;
    let session = Session::new(lesson);
    let id = session.id.clone();
    let mut sessions = self.sessions.write().await;
    let evicted = evict_idle(&mut sessions, Utc::now());
    sessions.insert(id.clone(), session);
    let live = sessions.len();
    drop(sessions);
    if evicted > 0 {
      info!(target: "fluentblocks", evicted, "Dropped idle sessions");
    }
    info!(target: "fluentblocks", %lesson_id, session = %id, live, "Session opened");
    Some(id)
  }

  /// Run `f` against a session under the write lock.
  pub async fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
    let mut sessions = self.sessions.write().await;
    let session = sessions.get_mut(id)?;
    session.last_seen = Utc::now();
    Some(f(session))
  }

  pub async fn close_session(&self, id: &str) -> Option<Session> {
    self.sessions.write().await.remove(id)
  }
}

/// Drop sessions idle for longer than `SESSION_IDLE_MINUTES`. Returns how many went.
fn evict_idle(sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) -> usize {
  let ttl = Duration::minutes(SESSION_IDLE_MINUTES);
  let before = sessions.len();
  sessions.retain(|_, s| now - s.last_seen < ttl);
  before - sessions.len()
}

impl Default for AppState {
  fn default() -> Self {
    Self::with_parts(AppConfig::default(), Arc::new(MemoryStore::new()), None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn curriculum_is_ordered_and_walkable() {
    let st = AppState::default();
    let orders: Vec<u32> = st.lessons.iter().map(|l| l.order).collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted);

    assert_eq!(st.next_lesson("present-simple").unwrap().id, "present-continuous");
    let last = st.lessons.last().unwrap().id.clone();
    assert!(st.next_lesson(&last).is_none());
    assert!(st.next_lesson("nope").is_none());
  }

  #[test]
  fn config_lessons_replace_by_id() {
    let mut replacement = seed_lessons().remove(0);
    replacement.title = "Custom".into();
    let cfg = AppConfig { lessons: vec![replacement], ..AppConfig::default() };
    let st = AppState::with_parts(cfg, Arc::new(MemoryStore::new()), None);
    assert_eq!(st.lesson("present-simple").unwrap().title, "Custom");
    assert_eq!(st.lessons.len(), seed_lessons().len());
  }

  #[test]
  fn unplayable_config_lessons_are_skipped() {
    let mut forward = seed_lessons().remove(0);
    forward.id = "forward".into();
    forward.steps[1].options = crate::domain::OptionSource::DependsOn { step: 3, by_key: Default::default() };
    let mut empty = seed_lessons().remove(0);
    empty.id = "empty".into();
    empty.steps.clear();
    let mut broken_builtin = seed_lessons().remove(0);
    broken_builtin.title = "Broken".into();
    broken_builtin.steps.clear();

    let cfg = AppConfig { lessons: vec![forward, empty, broken_builtin], ..AppConfig::default() };
    let st = AppState::with_parts(cfg, Arc::new(MemoryStore::new()), None);
    assert!(st.lesson("forward").is_none());
    assert!(st.lesson("empty").is_none());
    assert_ne!(st.lesson("present-simple").unwrap().title, "Broken");
    assert_eq!(st.lessons.len(), seed_lessons().len());
  }

  #[test]
  fn builtin_lessons_are_playable() {
    for l in seed_lessons() {
      assert!(l.check().is_ok(), "{}: {:?}", l.id, l.check());
    }
  }

  #[tokio::test]
  async fn idle_sessions_are_evicted_on_open() {
    let st = AppState::default();
    let stale = st.open_session("modal-can").await.unwrap();
    let fresh = st.open_session("modal-can").await.unwrap();
    st.sessions.write().await.get_mut(&stale).unwrap().last_seen =
      Utc::now() - Duration::minutes(SESSION_IDLE_MINUTES + 1);

    let newest = st.open_session("present-simple").await.unwrap();
    let sessions = st.sessions.read().await;
    assert!(!sessions.contains_key(&stale));
    assert!(sessions.contains_key(&fresh));
    assert!(sessions.contains_key(&newest));
    assert_eq!(sessions.len(), 2);
  }

  #[tokio::test]
  async fn sessions_open_and_close() {
    let st = AppState::default();
    assert!(st.open_session("missing").await.is_none());
    let id = st.open_session("modal-can").await.unwrap();
    let steps = st.with_session(&id, |s| s.builder.len()).await;
    assert_eq!(steps, Some(3));
    assert!(st.close_session(&id).await.is_some());
    assert!(st.with_session(&id, |_| ()).await.is_none());
  }
}
