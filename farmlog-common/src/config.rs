//! Bootstrap configuration loading
//!
//! Configuration comes from a TOML file plus a few environment overrides.
//!
//! # Config file resolution priority
//! 1. Command-line argument (highest priority)
//! 2. `FARMLOG_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/farmlog/farmlog-insights.toml`)
//!
//! A missing config file is not an error: a warning is logged and compiled
//! defaults are used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "FARMLOG_CONFIG";
/// Environment variable overriding `database_path`
pub const DATABASE_ENV_VAR: &str = "FARMLOG_DATABASE";
/// Environment variable overriding `inference.api_key`
pub const INFERENCE_API_KEY_ENV_VAR: &str = "FARMLOG_INFERENCE_API_KEY";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote inference service (enhancement tier)
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Remote weather service
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Insight engine tuning
    #[serde(default)]
    pub insights: InsightSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Remote inference service settings
///
/// When `base_url` is absent the enhancement tier is disabled and every
/// signal goes straight to its rule-based analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Total request timeout
    #[serde(default = "default_inference_timeout_ms")]
    pub timeout_ms: u64,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

/// Remote weather service settings
///
/// When `base_url` is absent, current weather is read from stored observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_weather_timeout_ms")]
    pub timeout_ms: u64,
}

/// Insight engine tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Per-provider call timeout
    pub call_timeout_ms: u64,
    /// Result budget when the caller does not pass one
    pub default_limit: usize,
    /// Result budget used for the grouped view
    pub category_limit: usize,
    /// Max task recommendations contributed per call
    pub task_budget: usize,
    /// Minimum task priority score to qualify
    pub task_min_priority: f64,
    /// Pest alerts with onset within this many days are time-relevant
    pub pest_onset_window_days: i64,
    /// Length of each financial comparison window
    pub financial_window_days: i64,
    pub weather_min_confidence: f64,
    pub financial_min_confidence: f64,
    pub growth_min_confidence: f64,
    /// Confidence assigned to rule-based fallback insights
    pub fallback_confidence: f64,
    /// Drop insights whose `expires_at` has passed
    pub filter_expired: bool,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            logging: LoggingConfig::default(),
            inference: InferenceConfig::default(),
            weather: WeatherConfig::default(),
            insights: InsightSettings::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_ms: default_inference_timeout_ms(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_weather_timeout_ms(),
        }
    }
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 3000,
            default_limit: 10,
            category_limit: 50,
            task_budget: 3,
            task_min_priority: 0.7,
            pest_onset_window_days: 7,
            financial_window_days: 30,
            weather_min_confidence: 0.7,
            financial_min_confidence: 0.7,
            growth_min_confidence: 0.6,
            fallback_confidence: 0.5,
            filter_expired: true,
        }
    }
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_inference_timeout_ms() -> u64 {
    5000
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_weather_timeout_ms() -> u64 {
    5000
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("farmlog").join("farmlog.db"))
        .unwrap_or_else(|| PathBuf::from("./farmlog_data/farmlog.db"))
}

/// Resolve the config file path (CLI → env → platform config dir)
///
/// Returns `None` only when no candidate can be determined at all.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("farmlog").join("farmlog-insights.toml"))
}

/// Where a loaded `TomlConfig` came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Path resolved but no file there; compiled defaults used
    Missing(PathBuf),
    /// No config location could be resolved; compiled defaults used
    NoLocation,
}

impl ConfigSource {
    pub fn is_defaults(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "loaded configuration from {}", path.display()),
            Self::Missing(path) => {
                write!(f, "config file {} not found, using compiled defaults", path.display())
            }
            Self::NoLocation => f.write_str("no config file location available, using compiled defaults"),
        }
    }
}

impl TomlConfig {
    /// Load configuration from `path`, falling back to defaults when the file is missing
    ///
    /// Environment overrides are applied after parsing.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// `load`, also reporting where the values came from
    ///
    /// Nothing is logged here: this runs before the subscriber is installed,
    /// so callers log the returned `ConfigSource` once logging is up.
    pub fn load_with_source(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let (mut config, source) = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
                let parsed: TomlConfig = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
                (parsed, ConfigSource::File(path.to_path_buf()))
            }
            Some(path) => (TomlConfig::default(), ConfigSource::Missing(path.to_path_buf())),
            None => (TomlConfig::default(), ConfigSource::NoLocation),
        };

        config.apply_env_overrides();
        Ok((config, source))
    }

    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db) = std::env::var(DATABASE_ENV_VAR) {
            if !db.trim().is_empty() {
                self.database_path = PathBuf::from(db);
            }
        }

        if let Ok(key) = std::env::var(INFERENCE_API_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.inference.api_key = Some(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(default_port(), 5740);
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_insight_defaults() {
        let settings = InsightSettings::default();
        assert_eq!(settings.task_budget, 3);
        assert_eq!(settings.category_limit, 50);
        assert!(settings.fallback_confidence < settings.weather_min_confidence);
        assert!(settings.filter_expired);
    }

    #[test]
    fn test_partial_insights_table_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 6000

            [insights]
            task_budget = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.insights.task_budget, 5);
        assert_eq!(config.insights.default_limit, 10);
        assert!(config.inference.base_url.is_none());
        assert_eq!(config.logging.level, "info");
    }
}
