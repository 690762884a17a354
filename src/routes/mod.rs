//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Browser client from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Curriculum
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/lessons", get(http::http_list_lessons))
        .route("/api/v1/lessons/:id", get(http::http_get_lesson))
        // Sessions (sentence builder + exercises)
        .route("/api/v1/sessions", post(http::http_start_session))
        .route("/api/v1/sessions/:id", get(http::http_get_session))
        .route("/api/v1/sessions/:id/select", post(http::http_select))
        .route("/api/v1/sessions/:id/clear", post(http::http_clear))
        .route("/api/v1/sessions/:id/reset", post(http::http_reset))
        .route("/api/v1/sessions/:id/exercise", get(http::http_next_exercise))
        .route("/api/v1/sessions/:id/answer", post(http::http_post_answer))
        .route("/api/v1/sessions/:id/complete", post(http::http_complete_session))
        .route("/api/v1/sessions/:id/stats", get(http::http_session_stats))
        // Progress + feedback tracker
        .route("/api/v1/progress", get(http::http_get_progress).post(http::http_post_progress))
        .route(
            "/api/v1/feedback",
            get(http::http_get_feedback)
                .post(http::http_post_feedback)
                .delete(http::http_reset_feedback),
        )
        .route("/api/v1/feedback/shown", post(http::http_feedback_shown))
        // Sentence audio
        .route("/api/v1/audio", post(http::http_post_audio))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
