//! Versioned key/value cache
//!
//! A process-wide stand-in for browser `localStorage`: string keys mapping to
//! JSON values. SWR entries are stored as `{etag, ts, data}` objects, vote
//! flags and other small values are stored raw. All access goes through one
//! mutex so read-modify-write sequences (see [`CacheStore::update_entry`]) are
//! atomic across tasks.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse cache JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Cached response for one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Last known validator (HTTP ETag or body `version`)
    #[serde(default)]
    pub etag: Option<String>,

    /// Epoch millis of the last write or revalidation
    #[serde(rename = "ts")]
    pub timestamp: i64,

    #[serde(rename = "data")]
    pub payload: Value,
}

impl CacheEntry {
    pub fn new(etag: Option<String>, payload: Value) -> Self {
        Self {
            etag,
            timestamp: now_millis(),
            payload,
        }
    }

    /// Age relative to `now` in milliseconds
    pub fn age_ms(&self, now: i64) -> i64 {
        now - self.timestamp
    }

    pub fn is_fresh(&self, now: i64, fresh_window_ms: i64) -> bool {
        self.age_ms(now) < fresh_window_ms
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    values: HashMap<String, Value>,
    dirty: bool,
}

/// Shared cache store
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<StoreInner>,
    file_path: Option<PathBuf>,
}

impl CacheStore {
    /// Store without file persistence
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            file_path: None,
        }
    }

    /// Load from a JSON file; a missing or empty file yields an empty store
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let values: HashMap<String, Value> = if file_path.exists() {
            debug!("Loading cache from {:?}", file_path);
            let content = fs::read_to_string(&file_path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("Cache file not found, starting with empty cache");
            HashMap::new()
        };

        debug!("Loaded {} keys from cache", values.len());

        Ok(Self {
            inner: Mutex::new(StoreInner {
                values,
                dirty: false,
            }),
            file_path: Some(file_path),
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().values.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut inner = self.inner.lock();
        inner.values.insert(key.into(), value);
        inner.dirty = true;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().values.contains_key(key)
    }

    /// Read an SWR entry; values that are not entries read as absent
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        let inner = self.inner.lock();
        inner
            .values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn put_entry(&self, key: impl Into<String>, entry: &CacheEntry) {
        match serde_json::to_value(entry) {
            Ok(value) => self.set(key, value),
            Err(e) => warn!("Failed to encode cache entry: {}", e),
        }
    }

    /// Atomically replace an entry with the result of `f`
    ///
    /// `f` sees the current entry (if any). Returning `None` leaves the store
    /// untouched. The lock is held for the whole call, so `f` must not block.
    pub fn update_entry<F>(&self, key: &str, f: F) -> Option<CacheEntry>
    where
        F: FnOnce(Option<CacheEntry>) -> Option<CacheEntry>,
    {
        let mut inner = self.inner.lock();
        let current = inner
            .values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok());

        let next = f(current)?;
        match serde_json::to_value(&next) {
            Ok(value) => {
                inner.values.insert(key.to_string(), value);
                inner.dirty = true;
                Some(next)
            }
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Bump an entry's timestamp without touching its payload
    pub fn touch(&self, key: &str) -> bool {
        self.update_entry(key, |entry| {
            entry.map(|mut entry| {
                entry.timestamp = now_millis();
                entry
            })
        })
        .is_some()
    }

    /// Force the next fetch of `key` to revalidate while keeping the payload
    /// as a stale fallback
    pub fn expire(&self, key: &str) -> bool {
        self.update_entry(key, |entry| {
            entry.map(|mut entry| {
                entry.timestamp = 0;
                entry
            })
        })
        .is_some()
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.values.remove(key).is_some();
        if removed {
            inner.dirty = true;
        }
        removed
    }

    /// Remove every key starting with one of `prefixes`
    pub fn remove_prefixes(&self, prefixes: &[&str]) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.values.len();
        inner
            .values
            .retain(|key, _| !prefixes.iter().any(|prefix| key.starts_with(prefix)));
        let removed = before - inner.values.len();
        if removed > 0 {
            debug!("Removed {} keys with prefixes {:?}", removed, prefixes);
            inner.dirty = true;
        }
        removed
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().values.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Write to the backing file if anything changed
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let mut inner = self.inner.lock();
        if !inner.dirty {
            debug!("Cache not modified, skipping save");
            return Ok(());
        }

        debug!("Saving {} keys to cache file {:?}", inner.values.len(), path);
        let json = serde_json::to_string_pretty(&inner.values)?;
        fs::write(path, json)?;

        inner.dirty = false;
        Ok(())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        if self.inner.get_mut().dirty {
            if let Err(e) = self.save() {
                warn!("Failed to save cache on drop: {}", e);
            }
        }
    }
}
