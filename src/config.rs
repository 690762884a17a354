//! Loading application configuration (feedback thresholds + optional lesson bank) from TOML.
//!
//! Example:
//!
//! ```toml
//! [feedback]
//! levels_alone = 3
//! interactions_alone = 20
//!
//! [[lessons]]
//! id = "modal-must"
//! title = "Modal verbs: must"
//! order = 7
//! # steps = [...]  (same schema as `domain::Lesson`)
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Lesson;
use crate::tracker::FeedbackPolicy;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub feedback: FeedbackPolicy,
  /// Added to the built-in lessons; an entry with a built-in id replaces it.
  #[serde(default)]
  pub lessons: Vec<Lesson>,
}

/// Parse a config file. On any IO/parse error, logs and returns None.
pub fn load_config_from_path(path: &Path) -> Option<AppConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "fluentblocks", path = %path.display(), lessons = cfg.lessons.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "fluentblocks", path = %path.display(), error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "fluentblocks", path = %path.display(), error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Attempt to load `AppConfig` from FLUENTBLOCKS_CONFIG_PATH.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("FLUENTBLOCKS_CONFIG_PATH").ok()?;
  load_config_from_path(Path::new(&path))
}
