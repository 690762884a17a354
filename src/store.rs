//! Key-value persistence for tracker counters, level progress and session logs.
//!
//! Values are JSON strings. `FileStore` keeps the whole map in memory and
//! rewrites one JSON file on every write; `MemoryStore` is used when no
//! DATA_PATH is configured and in tests.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;

pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
  fn remove(&self, key: &str) -> Result<(), StoreError>;
  fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// Typed helpers on top of the raw string interface.
pub trait KeyValueStoreExt: KeyValueStore {
  fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let raw = self.get(key)?;
    match serde_json::from_str(&raw) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "fluentblocks", %key, error = %e, "Ignoring unreadable stored value");
        None
      }
    }
  }

  fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
    self.set(key, serde_json::to_string(value)?)
  }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

#[derive(Default)]
pub struct MemoryStore {
  map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    lock(&self.map).get(key).cloned()
  }

  fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    lock(&self.map).insert(key.to_string(), value);
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    lock(&self.map).remove(key);
    Ok(())
  }

  fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
    prefixed(&lock(&self.map), prefix)
  }
}

pub struct FileStore {
  path: PathBuf,
  map: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
  /// Open (or lazily create) the store file. A missing file is an empty store.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let map = match std::fs::read_to_string(&path) {
      Ok(s) if s.trim().is_empty() => BTreeMap::new(),
      Ok(s) => serde_json::from_str(&s)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    info!(target: "fluentblocks", path = %path.display(), entries = map.len(), "Opened file store");
    Ok(Self { path, map: Mutex::new(map) })
  }

  fn flush(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)?;
    }
    // Write a sibling temp file, then rename over the target.
    let tmp = self.path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Option<String> {
    lock(&self.map).get(key).cloned()
  }

  fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    let mut map = lock(&self.map);
    map.insert(key.to_string(), value);
    self.flush(&map)
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let mut map = lock(&self.map);
    if map.remove(key).is_some() {
      self.flush(&map)?;
    }
    Ok(())
  }

  fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
    prefixed(&lock(&self.map), prefix)
  }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
  // A panic while holding the lock leaves the map itself intact.
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prefixed(map: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
  map.range(prefix.to_string()..)
    .take_while(|(k, _)| k.starts_with(prefix))
    .map(|(k, _)| k.clone())
    .collect()
}
