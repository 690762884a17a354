//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names follow the browser client (camelCase).

use serde::{Deserialize, Serialize};

use crate::builder::StepView;
use crate::domain::Lesson;
use crate::stats::SessionStats;
use crate::tracker::FeedbackState;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  StartSession {
    #[serde(rename = "lessonId")]
    lesson_id: String,
  },
  Select {
    #[serde(rename = "sessionId")]
    session_id: String,
    step: usize,
    option: String,
  },
  Clear {
    #[serde(rename = "sessionId")]
    session_id: String,
    step: usize,
  },
  Reset {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  NextExercise {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  CheckAnswer {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "exerciseId")]
    exercise_id: String,
    tokens: Vec<String>,
  },
  CompleteSession {
    #[serde(rename = "sessionId")]
    session_id: String,
  },
  FeedbackShown,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Session {
    session: SessionOut,
  },
  Selected {
    result: SelectOut,
  },
  Exercise {
    exercise: ExerciseOut,
  },
  AnswerResult {
    result: AnswerOut,
  },
  Stats {
    stats: SessionStats,
  },
  Feedback {
    feedback: FeedbackState,
  },
  Error {
    message: String,
    code: String,
  },
}

//
// Lessons
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
  pub id: String,
  pub title: String,
  pub topic: String,
  pub order: u32,
  pub steps: usize,
  pub exercises: usize,
}

impl From<&Lesson> for LessonSummary {
  fn from(l: &Lesson) -> Self {
    Self {
      id: l.id.clone(),
      title: l.title.clone(),
      topic: l.topic.clone(),
      order: l.order,
      steps: l.steps.len(),
      exercises: l.exercises.len(),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOut {
  pub id: String,
  pub title: String,
  pub topic: String,
  pub order: u32,
  /// Steps as seen at the start of a session.
  pub steps: Vec<StepView>,
  pub next_lesson_id: Option<String>,
}

//
// Sessions
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionIn {
  pub lesson_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
  pub session_id: String,
  pub lesson_id: String,
  pub steps: Vec<StepView>,
  pub preview: String,
  /// Present only once every step is completed.
  pub gloss: Option<String>,
  pub complete: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectIn {
  pub step: usize,
  pub option: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearIn {
  pub step: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOut {
  pub session: SessionOut,
  /// Steps whose selection was discarded by this call.
  pub cleared: Vec<usize>,
  pub feedback: FeedbackState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
  pub id: String,
  /// Shuffled for display.
  pub tokens: Vec<String>,
  pub gloss: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
  pub exercise_id: String,
  pub tokens: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
  pub correct: bool,
  /// Canonical answer, revealed only on a miss.
  pub expected: Option<String>,
  pub solved: usize,
  pub total: usize,
  pub lesson_complete: bool,
  pub feedback: FeedbackState,
}

//
// Progress, feedback, audio
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
  pub saved: bool,
  pub next_lesson_id: Option<String>,
  pub feedback: FeedbackState,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackIn {
  pub rating: u8,
  #[serde(default)]
  pub comment: String,
  #[serde(default)]
  pub timestamp: Option<String>,
  #[serde(default)]
  pub user_agent: Option<String>,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub app_name: Option<String>,
  #[serde(default)]
  pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioIn {
  pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AudioOut {
  pub url: String,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
