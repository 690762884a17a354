//! FluentBlocks · English Sentence-Builder Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional sentence audio generation (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                       : u16 (default 3000)
//!   FLUENTBLOCKS_CONFIG_PATH   : path to TOML config (feedback thresholds + lesson bank)
//!   DATA_PATH                  : JSON file for progress/tracker persistence (memory if unset)
//!   AUDIO_API_URL              : enables sentence audio if present
//!   AUDIO_API_KEY              : optional bearer token for the audio service
//!   LOG_LEVEL                  : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                 : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use fluentblocks_backend::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "fluentblocks", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "fluentblocks", error = %e, "Failed to listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "fluentblocks", "Shutdown signal received");
}
