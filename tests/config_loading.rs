//! Integration test: Configuration utilities
//!
//! Tests the bin_common configuration loading and the shipped sample config.

use league::SyncConfig;
use league_sync::bin_common::{load_config_from_env, ConfigType};
use std::path::Path;
use std::time::Duration;

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    assert_eq!(custom.default_path(), "custom/path.yaml");
    assert_eq!(custom.env_var_name(), "SYNC_CONFIG_PATH");
}

#[test]
fn test_sync_config_path_from_env() {
    std::env::remove_var("SYNC_CONFIG_PATH");
    let config_path = load_config_from_env(ConfigType::Sync);
    assert_eq!(config_path.to_str().unwrap(), "config/sync_config.yaml");

    std::env::set_var("SYNC_CONFIG_PATH", "/tmp/other_sync.yaml");
    let config_path = load_config_from_env(ConfigType::Sync);
    assert_eq!(config_path.to_str().unwrap(), "/tmp/other_sync.yaml");
    std::env::remove_var("SYNC_CONFIG_PATH");
}

#[test]
fn test_sample_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/sync_config.yaml");
    let config = SyncConfig::load(&path).unwrap();

    assert_eq!(config.heartbeat_interval(), Duration::from_secs(25));
    assert_eq!(config.pong_timeout(), Duration::from_secs(5));
    assert_eq!(config.reconnect.max_attempts, 8);
    assert!(config.probe);
    assert_eq!(config.topics, vec!["predictions_page".to_string()]);
}
