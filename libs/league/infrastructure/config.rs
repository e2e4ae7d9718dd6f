use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Sync layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// REST base URL, e.g. `https://league.example.com`
    pub api_base_url: String,

    /// Push endpoint; defaults to the API base URL
    #[serde(default)]
    pub ws_url: Option<String>,

    /// Run the capability probe before connecting
    #[serde(default = "default_true")]
    pub probe: bool,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional JSON file backing the cache store
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    #[serde(default)]
    pub fresh_window_ms: FreshWindows,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Topics subscribed on every connection
    #[serde(default)]
    pub topics: Vec<String>,

    /// Telegram init data from .env (not in YAML)
    #[serde(skip)]
    pub init_data: Option<String>,
}

/// Freshness windows per cache key family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshWindows {
    #[serde(default = "default_tours_window")]
    pub tours: u64,
    #[serde(default = "default_league_window")]
    pub league: u64,
    #[serde(default = "default_match_details_window")]
    pub match_details: u64,
    #[serde(default = "default_achievements_window")]
    pub achievements: u64,
}

impl Default for FreshWindows {
    fn default() -> Self {
        Self {
            tours: default_tours_window(),
            league: default_league_window(),
            match_details: default_match_details_window(),
            achievements: default_achievements_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            jitter: default_jitter(),
        }
    }
}

impl ReconnectConfig {
    pub fn strategy(&self) -> realtime::JitteredBackoff {
        realtime::JitteredBackoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            Some(self.max_attempts),
            self.jitter,
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    25_000
}

fn default_pong_timeout_ms() -> u64 {
    5_000
}

fn default_tours_window() -> u64 {
    30_000
}

fn default_league_window() -> u64 {
    60_000
}

fn default_match_details_window() -> u64 {
    15_000
}

fn default_achievements_window() -> u64 {
    300_000
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> usize {
    8
}

fn default_jitter() -> f64 {
    0.3
}

impl SyncConfig {
    /// Configuration with defaults for everything but the API base URL
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ws_url: None,
            probe: true,
            log_level: default_log_level(),
            cache_file: None,
            fresh_window_ms: FreshWindows::default(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            reconnect: ReconnectConfig::default(),
            topics: Vec::new(),
            init_data: None,
        }
    }

    /// Load configuration from YAML file
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&yaml_content)
    }

    /// Parse YAML, apply environment overrides and validate
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            info!("Overriding API base URL from environment variable");
            self.api_base_url = url;
        }
        if let Ok(url) = std::env::var("WS_URL") {
            info!("Overriding push URL from environment variable");
            self.ws_url = Some(url);
        }
        if let Ok(init_data) = std::env::var("TG_INIT_DATA") {
            if !init_data.is_empty() {
                self.init_data = Some(init_data);
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_base_url must not be empty".to_string(),
            ));
        }

        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.pong_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "pong_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.base_delay_ms == 0 || self.reconnect.max_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect delays must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.base_delay_ms > self.reconnect.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "reconnect.base_delay_ms must not exceed reconnect.max_delay_ms".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.reconnect.jitter) {
            return Err(ConfigError::ValidationError(
                "reconnect.jitter must be between 0 and 1".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Push base URL, falling back to the API base URL
    pub fn push_url(&self) -> &str {
        self.ws_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
