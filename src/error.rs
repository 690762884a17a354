//! Error types. Domain errors stay small and typed; `AppError` maps them to
//! HTTP responses of the form `{ "success": false, "error": ..., "code": ... }`.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuilderError {
  #[error("step {step} does not exist (lesson has {len} steps)")]
  StepOutOfRange { step: usize, len: usize },
  #[error("step {step} is disabled until the previous step is completed")]
  StepDisabled { step: usize },
  #[error("option '{option}' is not available at step {step}")]
  UnknownOption { step: usize, option: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AudioError {
  #[error("audio generation is not configured")]
  Disabled,
  #[error("audio request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("audio service returned {0}")]
  BadStatus(u16),
  #[error("audio service returned an empty url")]
  EmptyUrl,
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  BadRequest(String),
  #[error(transparent)]
  Builder(#[from] BuilderError),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Audio(#[from] AudioError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub success: bool,
  pub error: String,
  pub code: &'static str,
}

impl AppError {
  pub fn not_found(message: impl Into<String>) -> Self {
    AppError::NotFound(message.into())
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    AppError::BadRequest(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Builder(BuilderError::StepDisabled { .. }) => StatusCode::CONFLICT,
      AppError::Builder(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Audio(AudioError::Disabled) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Audio(_) => StatusCode::BAD_GATEWAY,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::BadRequest(_) => "BAD_REQUEST",
      AppError::Builder(BuilderError::StepOutOfRange { .. }) => "STEP_OUT_OF_RANGE",
      AppError::Builder(BuilderError::StepDisabled { .. }) => "STEP_DISABLED",
      AppError::Builder(BuilderError::UnknownOption { .. }) => "UNKNOWN_OPTION",
      AppError::Store(_) => "STORE_ERROR",
      AppError::Audio(AudioError::Disabled) => "AUDIO_DISABLED",
      AppError::Audio(_) => "AUDIO_ERROR",
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    // Internal details stay in the logs.
    let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(target: "fluentblocks", error = %self, "internal error");
      "internal server error".to_string()
    } else {
      self.to_string()
    };
    let body = ErrorResponse { success: false, error, code: self.code() };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builder_errors_map_to_client_statuses() {
    let e: AppError = BuilderError::StepDisabled { step: 2 }.into();
    assert_eq!(e.status(), StatusCode::CONFLICT);
    assert_eq!(e.code(), "STEP_DISABLED");

    let e: AppError = BuilderError::UnknownOption { step: 0, option: "x".into() }.into();
    assert_eq!(e.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[test]
  fn disabled_audio_is_service_unavailable() {
    let e: AppError = AudioError::Disabled.into();
    assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
  }
}
