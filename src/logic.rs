//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - curriculum listing and lesson detail
//!   - driving a session's sentence builder (select / clear / reset)
//!   - serving exercises and checking answers
//!   - closing sessions, saving level progress, feedback and audio

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::builder::SentenceBuilder;
use crate::domain::{Exercise, LevelProgress};
use crate::error::{AppError, AudioError};
use crate::protocol::*;
use crate::state::{AppState, Session};
use crate::stats::{InteractionKind, SessionLog, SessionStats};
use crate::store::KeyValueStoreExt;
use crate::tracker::FeedbackState;
use crate::validator::{shuffled, validate, Verdict};

fn session_out(s: &Session) -> SessionOut {
  SessionOut {
    session_id: s.id.clone(),
    lesson_id: s.lesson().id.clone(),
    steps: s.builder.views(),
    preview: s.builder.preview(),
    gloss: s.builder.gloss(),
    complete: s.builder.is_complete(),
  }
}

fn unknown_session(id: &str) -> AppError {
  AppError::not_found(format!("Unknown sessionId: {}", id))
}

pub fn list_lessons(state: &AppState) -> Vec<LessonSummary> {
  state.lessons.iter().map(|l| LessonSummary::from(l.as_ref())).collect()
}

pub fn lesson_detail(state: &AppState, id: &str) -> Result<LessonOut, AppError> {
  let lesson = state
    .lesson(id)
    .ok_or_else(|| AppError::not_found(format!("Unknown lessonId: {}", id)))?;
  let next_lesson_id = state.next_lesson(id).map(|l| l.id.clone());
  let steps = SentenceBuilder::new(lesson.clone()).views();
  Ok(LessonOut {
    id: lesson.id.clone(),
    title: lesson.title.clone(),
    topic: lesson.topic.clone(),
    order: lesson.order,
    steps,
    next_lesson_id,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn start_session(state: &AppState, lesson_id: &str) -> Result<SessionOut, AppError> {
  let id = state
    .open_session(lesson_id)
    .await
    .ok_or_else(|| AppError::not_found(format!("Unknown lessonId: {}", lesson_id)))?;
  state
    .with_session(&id, |s| session_out(s))
    .await
    .ok_or_else(|| unknown_session(&id))
}

pub async fn session_state(state: &AppState, session_id: &str) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| session_out(s))
    .await
    .ok_or_else(|| unknown_session(session_id))
}

#[instrument(level = "info", skip(state))]
pub async fn select_option(
  state: &AppState,
  session_id: &str,
  step: usize,
  option: &str,
) -> Result<SelectOut, AppError> {
  let (session, cleared) = state
    .with_session(session_id, |s| {
      let cleared = s.builder.select(step, option)?;
      s.log.record(InteractionKind::WordSelected, Some(option.to_string()));
      Ok::<_, AppError>((session_out(s), cleared))
    })
    .await
    .ok_or_else(|| unknown_session(session_id))??;

  let feedback = state.tracker.track_interaction()?;
  if session.complete {
    debug!(target: "builder", %session_id, preview = %session.preview, gloss = ?session.gloss, "Sentence complete");
  }
  Ok(SelectOut { session, cleared, feedback })
}

#[instrument(level = "info", skip(state))]
pub async fn clear_step(state: &AppState, session_id: &str, step: usize) -> Result<SelectOut, AppError> {
  let (session, cleared) = state
    .with_session(session_id, |s| {
      let cleared = s.builder.clear(step)?;
      Ok::<_, AppError>((session_out(s), cleared))
    })
    .await
    .ok_or_else(|| unknown_session(session_id))??;
  Ok(SelectOut { session, cleared, feedback: state.tracker.snapshot() })
}

/// Start the sentence over. Counts as a retry.
#[instrument(level = "info", skip(state))]
pub async fn reset_session(state: &AppState, session_id: &str) -> Result<SelectOut, AppError> {
  let (session, cleared) = state
    .with_session(session_id, |s| {
      let cleared: Vec<usize> = (0..s.builder.len()).filter(|&i| s.builder.is_completed(i)).collect();
      s.builder.reset();
      s.log.record(InteractionKind::Retry, None);
      (session_out(s), cleared)
    })
    .await
    .ok_or_else(|| unknown_session(session_id))?;
  let feedback = state.tracker.track_interaction()?;
  Ok(SelectOut { session, cleared, feedback })
}

/// Pick the next exercise: unsolved first, avoiding an immediate repeat.
fn pick_exercise<'a>(exercises: &'a [Exercise], solved: &[String], last: Option<&str>) -> Option<&'a Exercise> {
  let mut candidates: Vec<&Exercise> = exercises.iter().filter(|e| !solved.contains(&e.id)).collect();
  if candidates.is_empty() {
    candidates = exercises.iter().collect();
  }
  candidates
    .iter()
    .find(|e| Some(e.id.as_str()) != last)
    .or_else(|| candidates.first())
    .copied()
}

#[instrument(level = "info", skip(state))]
pub async fn next_exercise(state: &AppState, session_id: &str) -> Result<ExerciseOut, AppError> {
  let picked = state
    .with_session(session_id, |s| {
      let ex = pick_exercise(&s.lesson().exercises, &s.solved, s.last_served.as_deref()).cloned();
      if let Some(ex) = &ex {
        s.last_served = Some(ex.id.clone());
      }
      ex
    })
    .await
    .ok_or_else(|| unknown_session(session_id))?;

  let ex = picked.ok_or_else(|| AppError::not_found("This lesson has no exercises"))?;
  let tokens = {
    let mut rng = rand::thread_rng();
    shuffled(&ex.tokens, &mut rng)
  };
  Ok(ExerciseOut { id: ex.id, tokens, gloss: ex.gloss })
}

#[instrument(level = "info", skip(state, tokens), fields(tokens_len = tokens.len()))]
pub async fn check_answer(
  state: &AppState,
  session_id: &str,
  exercise_id: &str,
  tokens: &[String],
) -> Result<AnswerOut, AppError> {
  let (verdict, solved, total) = state
    .with_session(session_id, |s| {
      let ex = s
        .lesson()
        .exercise(exercise_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Unknown exerciseId: {}", exercise_id)))?;
      let verdict = validate(tokens, ex.tokens.as_slice());
      if verdict.is_correct() {
        s.log.record(InteractionKind::AnswerCorrect, Some(ex.id.clone()));
        if !s.solved.contains(&ex.id) {
          s.solved.push(ex.id.clone());
        }
      } else {
        s.log.record(InteractionKind::AnswerIncorrect, Some(ex.id.clone()));
      }
      Ok::<_, AppError>((verdict, s.solved.len(), s.lesson().exercises.len()))
    })
    .await
    .ok_or_else(|| unknown_session(session_id))??;

  let feedback = state.tracker.track_interaction()?;
  let correct = verdict.is_correct();
  info!(target: "fluentblocks", %session_id, %exercise_id, %correct, solved, total, "Answer checked");
  let expected = match verdict {
    Verdict::Correct => None,
    Verdict::Incorrect { expected } => Some(expected),
  };
  Ok(AnswerOut {
    correct,
    expected,
    solved,
    total,
    lesson_complete: total > 0 && solved == total,
    feedback,
  })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession<'a> {
  lesson_id: &'a str,
  log: &'a SessionLog,
  stats: &'a SessionStats,
}

/// Close a session and flush its log to the store.
#[instrument(level = "info", skip(state))]
pub async fn complete_session(state: &AppState, session_id: &str) -> Result<SessionStats, AppError> {
  let mut session = state
    .close_session(session_id)
    .await
    .ok_or_else(|| unknown_session(session_id))?;
  session.log.record(InteractionKind::SessionComplete, None);
  let stats = session.log.stats();
  state.store.set_json(
    &format!("session:{}", session_id),
    &StoredSession { lesson_id: &session.lesson().id, log: &session.log, stats: &stats },
  )?;
  info!(target: "fluentblocks", %session_id, lesson = %session.lesson().id, total = stats.total_interactions, accuracy = ?stats.accuracy, "Session completed");
  Ok(stats)
}

pub async fn session_stats(state: &AppState, session_id: &str) -> Result<SessionStats, AppError> {
  state
    .with_session(session_id, |s| s.log.stats())
    .await
    .ok_or_else(|| unknown_session(session_id))
}

/// Persist a level result. Only the first completion of a level counts
/// toward the feedback tracker.
#[instrument(level = "info", skip(state, progress), fields(level = %progress.level_id, completed = progress.completed))]
pub async fn save_progress(state: &AppState, progress: &LevelProgress) -> Result<ProgressOut, AppError> {
  if state.lesson(&progress.level_id).is_none() {
    return Err(AppError::not_found(format!("Unknown levelId: {}", progress.level_id)));
  }
  // Read, write and count as one step.
  let _guard = state.progress_lock.lock().await;
  let key = format!("progress:{}", progress.level_id);
  let already_completed = state
    .store
    .get_json::<LevelProgress>(&key)
    .is_some_and(|p| p.completed);

  state.store.set_json(&key, progress)?;

  let feedback = if progress.completed && !already_completed {
    state.tracker.track_level_completed()?
  } else {
    state.tracker.snapshot()
  };
  Ok(ProgressOut {
    saved: true,
    next_lesson_id: state.next_lesson(&progress.level_id).map(|l| l.id.clone()),
    feedback,
  })
}

/// All saved level results, in curriculum order.
pub fn list_progress(state: &AppState) -> Vec<LevelProgress> {
  state
    .lessons
    .iter()
    .filter_map(|l| state.store.get_json::<LevelProgress>(&format!("progress:{}", l.id)))
    .collect()
}

pub fn feedback_state(state: &AppState) -> FeedbackState {
  state.tracker.snapshot()
}

pub fn mark_feedback_shown(state: &AppState) -> Result<FeedbackState, AppError> {
  Ok(state.tracker.mark_feedback_shown()?)
}

/// Clear the feedback counters. The modal may trigger again afterwards.
#[instrument(level = "info", skip(state))]
pub fn reset_feedback(state: &AppState) -> Result<FeedbackState, AppError> {
  let st = state.tracker.reset()?;
  info!(target: "tracker", "Feedback tracker reset");
  Ok(st)
}

/// Record a feedback submission locally and close the modal for good.
#[instrument(level = "info", skip(state, body), fields(rating = body.rating))]
pub fn submit_feedback(state: &AppState, body: &FeedbackIn) -> Result<FeedbackState, AppError> {
  if !(1..=5).contains(&body.rating) {
    return Err(AppError::bad_request("rating must be between 1 and 5"));
  }
  let key = format!("feedback:submission:{}", Uuid::new_v4());
  state.store.set_json(&key, body)?;
  info!(target: "tracker", rating = body.rating, comment_len = body.comment.len(), source = ?body.source, "Feedback received");
  Ok(state.tracker.mark_feedback_shown()?)
}

#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn audio_url(state: &AppState, text: &str) -> Result<String, AppError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(AppError::bad_request("text must not be empty"));
  }
  let client = state.audio.as_ref().ok_or(AudioError::Disabled)?;
  match client.url_for(text).await {
    Ok(url) => Ok(url),
    Err(e) => {
      warn!(target: "audio", error = %e, "Audio generation failed");
      Err(e.into())
    }
  }
}
