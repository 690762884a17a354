//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::LevelProgress;
use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::stats::SessionStats;
use crate::tracker::FeedbackState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_lessons(State(state): State<Arc<AppState>>) -> Json<Vec<LessonSummary>> {
  Json(list_lessons(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<LessonOut> {
  Ok(Json(lesson_detail(&state, &id)?))
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = %body.lesson_id))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> ApiResult<SessionOut> {
  let out = start_session(&state, &body.lesson_id).await?;
  info!(target: "fluentblocks", lesson = %out.lesson_id, session = %out.session_id, "HTTP session started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<SessionOut> {
  Ok(Json(session_state(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(step = body.step, option = %body.option))]
pub async fn http_select(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<SelectIn>,
) -> ApiResult<SelectOut> {
  Ok(Json(select_option(&state, &id, body.step, &body.option).await?))
}

#[instrument(level = "info", skip(state, body), fields(step = body.step))]
pub async fn http_clear(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<ClearIn>,
) -> ApiResult<SelectOut> {
  Ok(Json(clear_step(&state, &id, body.step).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<SelectOut> {
  Ok(Json(reset_session(&state, &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_next_exercise(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<ExerciseOut> {
  Ok(Json(next_exercise(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(exercise_id = %body.exercise_id, tokens = body.tokens.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> ApiResult<AnswerOut> {
  let out = check_answer(&state, &id, &body.exercise_id, &body.tokens).await?;
  info!(target: "fluentblocks", session = %id, exercise = %body.exercise_id, correct = out.correct, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_complete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<SessionStats> {
  Ok(Json(complete_session(&state, &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_session_stats(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<SessionStats> {
  Ok(Json(session_stats(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(level = %body.level_id, completed = body.completed))]
pub async fn http_post_progress(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LevelProgress>,
) -> ApiResult<ProgressOut> {
  Ok(Json(save_progress(&state, &body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> Json<Vec<LevelProgress>> {
  Json(list_progress(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_feedback(State(state): State<Arc<AppState>>) -> Json<FeedbackState> {
  Json(feedback_state(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_feedback_shown(State(state): State<Arc<AppState>>) -> ApiResult<FeedbackState> {
  Ok(Json(mark_feedback_shown(&state)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset_feedback(State(state): State<Arc<AppState>>) -> ApiResult<FeedbackState> {
  Ok(Json(reset_feedback(&state)?))
}

#[instrument(level = "info", skip(state, body), fields(rating = body.rating))]
pub async fn http_post_feedback(
  State(state): State<Arc<AppState>>,
  Json(body): Json<FeedbackIn>,
) -> ApiResult<FeedbackState> {
  Ok(Json(submit_feedback(&state, &body)?))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_audio(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AudioIn>,
) -> ApiResult<AudioOut> {
  let url = audio_url(&state, &body.text).await?;
  Ok(Json(AudioOut { url }))
}
