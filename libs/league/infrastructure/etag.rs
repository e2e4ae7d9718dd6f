//! Conditional GET with stale-while-revalidate
//!
//! [`EtagFetcher::fetch`] serves a fresh cache entry without touching the
//! network, otherwise revalidates with `If-None-Match`. The cached payload is
//! only replaced when the server reports a change, and any failure falls back
//! to the cached payload when one exists. Every call publishes `etag:success`
//! or `etag:error` on the event bus.

use crate::domain::AppEvent;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::store::{now_millis, CacheEntry, CacheStore};
use reqwest::header::{HeaderMap, ETAG, IF_NONE_MATCH};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Header carrying the server-side last update time
pub const UPDATED_AT_HEADER: &str = "x-updated-at";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("304 Not Modified without a cached entry")]
    NotModifiedWithoutCache,
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Picks the relevant slice out of a decoded body
pub type Extract = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Combines the previously cached payload with a freshly extracted one
pub type Reconcile = Arc<dyn Fn(Option<&Value>, Value) -> Value + Send + Sync>;

/// Per-call options
#[derive(Clone)]
pub struct FetchOptions {
    pub cache_key: String,
    pub fresh_window: Duration,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub force_revalidate: bool,
    extract: Option<Extract>,
    reconcile: Option<Reconcile>,
}

impl FetchOptions {
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            fresh_window: Duration::ZERO,
            method: Method::GET,
            headers: Vec::new(),
            params: Vec::new(),
            force_revalidate: false,
            extract: None,
            reconcile: None,
        }
    }

    pub fn fresh_window(mut self, window: Duration) -> Self {
        self.fresh_window = window;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn force_revalidate(mut self, force: bool) -> Self {
        self.force_revalidate = force;
        self
    }

    pub fn extract<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.extract = Some(Arc::new(f));
        self
    }

    /// Runs under the store lock right before a changed payload is written
    pub fn reconcile<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Value>, Value) -> Value + Send + Sync + 'static,
    {
        self.reconcile = Some(Arc::new(f));
        self
    }
}

/// Result of [`EtagFetcher::fetch`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub data: Value,
    pub etag: Option<String>,
    pub from_cache: bool,
    pub updated: bool,
    /// Decoded body before extraction; only set for network responses
    pub raw: Option<Value>,
    /// `X-Updated-At` header, surfaced even on 304
    pub updated_at: Option<String>,
    /// Served from cache after a failed revalidation
    pub stale: bool,
}

impl FetchOutcome {
    fn cached(entry: CacheEntry, updated_at: Option<String>) -> Self {
        Self {
            data: entry.payload,
            etag: entry.etag,
            from_cache: true,
            updated: false,
            raw: None,
            updated_at,
            stale: false,
        }
    }
}

/// Merge `params` into the query string of `url`, replacing same-name pairs
pub fn build_url(url: &str, params: &[(String, String)]) -> Result<Url> {
    let mut parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    if params.is_empty() {
        return Ok(parsed);
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !params.iter().any(|(name, _)| name == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = parsed.query_pairs_mut();
        query.clear();
        for (k, v) in kept.iter().chain(params.iter()) {
            query.append_pair(k, v);
        }
    }
    Ok(parsed)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Application-level validator embedded in the body
fn body_version(raw: &Value) -> Option<String> {
    match raw.get("version")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer value of a validator, ignoring ETag quotes
fn numeric_validator(validator: &str) -> Option<u64> {
    validator.trim().trim_matches('"').parse().ok()
}

/// SWR fetcher backed by a [`CacheStore`]
#[derive(Clone)]
pub struct EtagFetcher {
    client: reqwest::Client,
    store: Arc<CacheStore>,
    bus: EventBus,
}

impl EtagFetcher {
    pub fn new(client: reqwest::Client, store: Arc<CacheStore>, bus: EventBus) -> Self {
        Self { client, store, bus }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome> {
        let key = options.cache_key.as_str();

        let final_url = match build_url(url, &options.params) {
            Ok(u) => u,
            Err(e) => {
                self.publish_error(key, url, &e, false);
                return Err(e);
            }
        };
        let url_text = final_url.to_string();

        let cached = self.store.get_entry(key);
        if let Some(entry) = &cached {
            let fresh_ms = options.fresh_window.as_millis() as i64;
            if !options.force_revalidate && entry.is_fresh(now_millis(), fresh_ms) {
                debug!("{}: fresh cache hit", key);
                let outcome = FetchOutcome::cached(entry.clone(), None);
                self.publish_success(key, &url_text, &outcome);
                return Ok(outcome);
            }
        }

        match self.revalidate(final_url, options, cached.clone()).await {
            Ok(outcome) => {
                self.publish_success(key, &url_text, &outcome);
                Ok(outcome)
            }
            Err(e) => match cached {
                Some(entry) => {
                    warn!("{}: revalidation failed ({}), serving stale cache", key, e);
                    self.publish_error(key, &url_text, &e, true);
                    Ok(FetchOutcome {
                        stale: true,
                        ..FetchOutcome::cached(entry, None)
                    })
                }
                None => {
                    warn!("{}: fetch failed with no cached fallback: {}", key, e);
                    self.publish_error(key, &url_text, &e, false);
                    Err(e)
                }
            },
        }
    }

    async fn revalidate(
        &self,
        url: Url,
        options: &FetchOptions,
        cached: Option<CacheEntry>,
    ) -> Result<FetchOutcome> {
        let key = options.cache_key.as_str();

        let mut request = self.client.request(options.method.clone(), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(etag) = cached.as_ref().and_then(|e| e.etag.as_deref()) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();
        let updated_at = header_value(response.headers(), UPDATED_AT_HEADER);
        let header_etag = header_value(response.headers(), ETAG.as_str());

        if status == StatusCode::NOT_MODIFIED {
            let entry = cached.ok_or(FetchError::NotModifiedWithoutCache)?;
            debug!("{}: 304 not modified", key);
            self.store.touch(key);
            return Ok(FetchOutcome::cached(entry, updated_at));
        }

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let raw: Value = serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        let etag = header_etag.or_else(|| body_version(&raw));

        if let Some(entry) = &cached {
            let unchanged = etag.is_some() && entry.etag == etag;
            let behind = match (
                entry.etag.as_deref().and_then(numeric_validator),
                body_version(&raw).as_deref().and_then(numeric_validator),
            ) {
                (Some(current), Some(incoming)) => incoming <= current,
                _ => false,
            };
            if unchanged || behind {
                debug!("{}: validator {:?} not newer than {:?}", key, etag, entry.etag);
                self.store.touch(key);
                return Ok(FetchOutcome {
                    raw: Some(raw),
                    ..FetchOutcome::cached(entry.clone(), updated_at)
                });
            }
        }

        let data = match &options.extract {
            Some(extract) => extract(&raw),
            None => raw.clone(),
        };

        let reconcile = options.reconcile.clone();
        let written = self.store.update_entry(key, |current| {
            let payload = match &reconcile {
                Some(reconcile) => reconcile(current.as_ref().map(|e| &e.payload), data),
                None => data,
            };
            Some(CacheEntry::new(etag.clone(), payload))
        });

        let data = written.map(|entry| entry.payload).unwrap_or(Value::Null);
        debug!("{}: updated (etag {:?})", key, etag);

        Ok(FetchOutcome {
            data,
            etag,
            from_cache: false,
            updated: true,
            raw: Some(raw),
            updated_at,
            stale: false,
        })
    }

    fn publish_success(&self, key: &str, url: &str, outcome: &FetchOutcome) {
        self.bus.publish(AppEvent::EtagSuccess {
            cache_key: key.to_string(),
            url: url.to_string(),
            from_cache: outcome.from_cache,
            updated: outcome.updated,
        });
    }

    fn publish_error(&self, key: &str, url: &str, error: &FetchError, stale_fallback: bool) {
        self.bus.publish(AppEvent::EtagError {
            cache_key: key.to_string(),
            url: url.to_string(),
            error: error.to_string(),
            stale_fallback,
        });
    }
}
