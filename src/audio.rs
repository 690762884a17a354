//! Minimal client for the sentence audio service.
//!
//! POST `{ "text": ... }` and read back `{ "url": ... }`. Results are cached
//! per exact sentence string for the lifetime of the process. No retries.

use std::{collections::HashMap, time::Duration};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::error::AudioError;

#[derive(Serialize)]
struct AudioReq<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct AudioResp {
  #[serde(default)]
  url: String,
}

pub struct AudioClient {
  client: reqwest::Client,
  pub endpoint: String,
  api_key: Option<String>,
  cache: RwLock<HashMap<String, String>>,
}

impl AudioClient {
  pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, AudioError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()?;
    Ok(Self { client, endpoint: endpoint.into(), api_key, cache: RwLock::new(HashMap::new()) })
  }

  /// Construct the client if AUDIO_API_URL is set; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let endpoint = std::env::var("AUDIO_API_URL").ok().filter(|s| !s.trim().is_empty())?;
    let api_key = std::env::var("AUDIO_API_KEY").ok();
    match Self::new(endpoint, api_key) {
      Ok(c) => Some(c),
      Err(e) => {
        error!(target: "audio", error = %e, "Failed to build audio HTTP client");
        None
      }
    }
  }

  async fn cached(&self, text: &str) -> Option<String> {
    self.cache.read().await.get(text).cloned()
  }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len()))]
  pub async fn url_for(&self, text: &str) -> Result<String, AudioError> {
    if let Some(url) = self.cached(text).await {
      debug!(target: "audio", "Audio cache hit");
      return Ok(url);
    }

    let start = std::time::Instant::now();
    let mut req = self.client
      .post(&self.endpoint)
      .header(USER_AGENT, "fluentblocks-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&AudioReq { text });
    if let Some(key) = &self.api_key {
      req = req.header(AUTHORIZATION, format!("Bearer {}", key));
    }
    let res = req.send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      error!(target: "audio", status, elapsed = ?start.elapsed(), "Audio service error");
      return Err(AudioError::BadStatus(status));
    }
    let body: AudioResp = res.json().await?;
    if body.url.trim().is_empty() {
      return Err(AudioError::EmptyUrl);
    }

    info!(target: "audio", elapsed = ?start.elapsed(), "Audio generated");
    self.cache.write().await.insert(text.to_string(), body.url.clone());
    Ok(body.url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn cached_entries_skip_the_network() {
    // Nothing listens on this port; a cache hit must not try to connect.
    let client = AudioClient::new("http://127.0.0.1:9/audio", None).unwrap();
    client
      .cache
      .write()
      .await
      .insert("She can swim.".into(), "https://cdn.example/a.mp3".into());
    assert_eq!(client.url_for("She can swim.").await.unwrap(), "https://cdn.example/a.mp3");
    assert!(client.url_for("Another sentence").await.is_err());
  }
}
