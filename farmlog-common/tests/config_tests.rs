//! Configuration loading and graceful degradation tests
//!
//! - Missing config file → defaults, no error
//! - Malformed config file → error
//! - Config path priority: CLI → env → platform default
//! - Environment overrides
//!
//! Tests that manipulate environment variables are marked `#[serial]`.

use farmlog_common::config::{
    resolve_config_path, ConfigSource, TomlConfig, CONFIG_ENV_VAR, DATABASE_ENV_VAR,
    INFERENCE_API_KEY_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(DATABASE_ENV_VAR);
    env::remove_var(INFERENCE_API_KEY_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load(Some(&missing)).expect("missing file must not be an error");

    assert_eq!(config.port, 5740);
    assert_eq!(config.insights.default_limit, 10);
    assert!(config.inference.base_url.is_none());
}

#[test]
#[serial]
fn test_config_file_values_are_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("farmlog-insights.toml");
    std::fs::write(
        &path,
        r#"
database_path = "/srv/farmlog/farmlog.db"
port = 8088

[logging]
level = "debug"

[inference]
base_url = "http://inference.local:9000"
timeout_ms = 2500

[insights]
call_timeout_ms = 1500
filter_expired = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();

    assert_eq!(config.database_path, PathBuf::from("/srv/farmlog/farmlog.db"));
    assert_eq!(config.port, 8088);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.inference.base_url.as_deref(), Some("http://inference.local:9000"));
    assert_eq!(config.inference.timeout_ms, 2500);
    assert_eq!(config.inference.requests_per_second, 5);
    assert_eq!(config.insights.call_timeout_ms, 1500);
    assert!(!config.insights.filter_expired);
    assert_eq!(config.insights.task_budget, 3);
}

#[test]
#[serial]
fn test_config_source_reported_for_logging_after_init() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let present = dir.path().join("present.toml");
    std::fs::write(&present, "port = 6000").unwrap();

    let (_, source) = TomlConfig::load_with_source(Some(&missing)).unwrap();
    assert_eq!(source, ConfigSource::Missing(missing.clone()));
    assert!(source.is_defaults());
    assert!(source.to_string().contains("not found"));

    let (config, source) = TomlConfig::load_with_source(Some(&present)).unwrap();
    assert_eq!(config.port, 6000);
    assert_eq!(source, ConfigSource::File(present));
    assert!(!source.is_defaults());

    let (_, source) = TomlConfig::load_with_source(None).unwrap();
    assert_eq!(source, ConfigSource::NoLocation);
}

#[test]
#[serial]
fn test_malformed_config_file_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let result = TomlConfig::load(Some(&path));
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cli_path_has_highest_priority() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let resolved = resolve_config_path(Some(Path::new("/from/cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/from/cli.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/from/env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_applied_after_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("farmlog-insights.toml");
    std::fs::write(
        &path,
        r#"
database_path = "/file/farmlog.db"

[inference]
api_key = "file-key"
"#,
    )
    .unwrap();

    env::set_var(DATABASE_ENV_VAR, "/env/farmlog.db");
    env::set_var(INFERENCE_API_KEY_ENV_VAR, "env-key");

    let config = TomlConfig::load(Some(&path)).unwrap();

    assert_eq!(config.database_path, PathBuf::from("/env/farmlog.db"));
    assert_eq!(config.inference.api_key.as_deref(), Some("env-key"));

    clear_env();
}
