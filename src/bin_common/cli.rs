//! CLI utilities for binaries
//!
//! Configuration path resolution and loading.

use league::SyncConfig;
use std::path::PathBuf;
use tracing::info;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Sync configuration (config/sync_config.yaml)
    Sync,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Sync => "config/sync_config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    pub fn env_var_name(&self) -> &str {
        "SYNC_CONFIG_PATH"
    }
}

/// Configuration path from the environment, or the default
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Load the sync configuration
///
/// Without a config file, an `API_BASE_URL` environment variable alone is
/// enough; every other setting takes its default.
pub fn load_sync_config() -> anyhow::Result<SyncConfig> {
    let path = load_config_from_env(ConfigType::Sync);

    if path.exists() {
        info!("Loading configuration from {}", path.display());
        return Ok(SyncConfig::load(&path)?);
    }

    info!(
        "No configuration file at {}, using defaults and environment",
        path.display()
    );
    Ok(SyncConfig::from_yaml("api_base_url: \"\"")?)
}

/// Command line arguments, without the program name
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
