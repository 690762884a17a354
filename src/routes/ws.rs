//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::AppError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "fluentblocks", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "fluentblocks", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "fluentblocks", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e), code: "BAD_REQUEST".into() },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e), "code": "INTERNAL_ERROR" }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "fluentblocks", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "fluentblocks", "WebSocket disconnected");
}

fn ws_error(e: AppError) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string(), code: e.code().into() }
}

pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let reply = match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),

    ClientWsMessage::StartSession { lesson_id } => start_session(state, &lesson_id)
      .await
      .map(|session| ServerWsMessage::Session { session }),

    ClientWsMessage::Select { session_id, step, option } => select_option(state, &session_id, step, &option)
      .await
      .map(|result| ServerWsMessage::Selected { result }),

    ClientWsMessage::Clear { session_id, step } => clear_step(state, &session_id, step)
      .await
      .map(|result| ServerWsMessage::Selected { result }),

    ClientWsMessage::Reset { session_id } => reset_session(state, &session_id)
      .await
      .map(|result| ServerWsMessage::Selected { result }),

    ClientWsMessage::NextExercise { session_id } => next_exercise(state, &session_id)
      .await
      .map(|exercise| ServerWsMessage::Exercise { exercise }),

    ClientWsMessage::CheckAnswer { session_id, exercise_id, tokens } => {
      check_answer(state, &session_id, &exercise_id, &tokens)
        .await
        .map(|result| ServerWsMessage::AnswerResult { result })
    }

    ClientWsMessage::CompleteSession { session_id } => complete_session(state, &session_id)
      .await
      .map(|stats| ServerWsMessage::Stats { stats }),

    ClientWsMessage::FeedbackShown => mark_feedback_shown(state)
      .map(|feedback| ServerWsMessage::Feedback { feedback }),
  };
  reply.unwrap_or_else(ws_error)
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn send(state: &AppState, raw: &str) -> serde_json::Value {
    let msg: ClientWsMessage = serde_json::from_str(raw).unwrap();
    serde_json::to_value(handle_client_ws(msg, state).await).unwrap()
  }

  #[tokio::test]
  async fn ws_session_flow() {
    let state = AppState::default();
    assert_eq!(send(&state, r#"{"type":"ping"}"#).await["type"], "pong");

    let started = send(&state, r#"{"type":"start_session","lessonId":"modal-can"}"#).await;
    assert_eq!(started["type"], "session");
    let sid = started["session"]["sessionId"].as_str().unwrap().to_string();

    let disabled = send(&state, &format!(r#"{{"type":"select","sessionId":"{sid}","step":1,"option":"play"}}"#)).await;
    assert_eq!(disabled["type"], "error");
    assert_eq!(disabled["code"], "STEP_DISABLED");

    for (step, option) in [(0, "she"), (1, "play"), (2, "the_guitar")] {
      let r = send(&state, &format!(r#"{{"type":"select","sessionId":"{sid}","step":{step},"option":"{option}"}}"#)).await;
      assert_eq!(r["type"], "selected");
    }
    let r = send(&state, &format!(r#"{{"type":"clear","sessionId":"{sid}","step":2}}"#)).await;
    assert_eq!(r["result"]["cleared"], serde_json::json!([2]));
    assert_eq!(r["result"]["session"]["preview"], "She can play");

    let stats = send(&state, &format!(r#"{{"type":"complete_session","sessionId":"{sid}"}}"#)).await;
    assert_eq!(stats["type"], "stats");
    assert_eq!(stats["stats"]["wordsSelected"], 3);
  }

  #[tokio::test]
  async fn ws_unknown_session_is_an_error() {
    let state = AppState::default();
    let r = send(&state, r#"{"type":"reset","sessionId":"nope"}"#).await;
    assert_eq!(r["type"], "error");
    assert_eq!(r["code"], "NOT_FOUND");
  }
}
