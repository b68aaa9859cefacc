//! Engine settings validation
//!
//! `TomlConfig::load` accepts any value serde can parse; this module rejects
//! combinations the aggregator cannot honor before the service starts.

use farmlog_common::config::{InferenceConfig, InsightSettings};
use farmlog_common::{Error, Result};
use tracing::warn;

/// Check `[insights]` settings for internally consistent values
///
/// # Errors
/// Returns `Error::Config` naming the first offending setting.
pub fn validate(settings: &InsightSettings) -> Result<()> {
    let confidences = [
        ("task_min_priority", settings.task_min_priority),
        ("weather_min_confidence", settings.weather_min_confidence),
        ("financial_min_confidence", settings.financial_min_confidence),
        ("growth_min_confidence", settings.growth_min_confidence),
        ("fallback_confidence", settings.fallback_confidence),
    ];
    for (name, value) in confidences {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Config(format!("insights.{} must be within [0, 1], got {}", name, value)));
        }
    }

    if settings.call_timeout_ms == 0 {
        return Err(Error::Config("insights.call_timeout_ms must be positive".to_string()));
    }
    if settings.default_limit == 0 {
        return Err(Error::Config("insights.default_limit must be positive".to_string()));
    }
    if settings.category_limit < settings.default_limit {
        return Err(Error::Config(format!(
            "insights.category_limit ({}) must not be below default_limit ({})",
            settings.category_limit, settings.default_limit
        )));
    }
    if settings.pest_onset_window_days < 0 {
        return Err(Error::Config("insights.pest_onset_window_days must not be negative".to_string()));
    }
    if settings.financial_window_days <= 0 {
        return Err(Error::Config("insights.financial_window_days must be positive".to_string()));
    }

    if settings.fallback_confidence >= settings.weather_min_confidence.min(settings.financial_min_confidence) {
        warn!(
            "insights.fallback_confidence ({}) is not below the enhancement thresholds; \
             fallback insights will rank alongside enhanced ones",
            settings.fallback_confidence
        );
    }

    Ok(())
}

/// Check that an API key is present (non-empty after trimming)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Warn about inference settings that will likely fail at request time
///
/// A blank key is treated as no key at all.
pub fn check_inference(config: &InferenceConfig) -> InferenceConfig {
    let mut config = config.clone();

    if config.api_key.as_deref().is_some_and(|key| !is_valid_key(key)) {
        warn!("Ignoring blank inference API key");
        config.api_key = None;
    }

    let has_url = config.base_url.as_deref().is_some_and(is_valid_key);
    if has_url && config.api_key.is_none() {
        warn!("Inference service configured without an API key; requests are sent unauthenticated");
    }
    if !has_url && config.api_key.is_some() {
        warn!("Inference API key set but no base_url configured; enhancement tier stays disabled");
    }
    if has_url && config.requests_per_second == 0 {
        warn!("inference.requests_per_second is 0; clamping to 1");
        config.requests_per_second = 1;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&InsightSettings::default()).is_ok());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let settings = InsightSettings {
            weather_min_confidence: 1.5,
            ..InsightSettings::default()
        };
        let err = validate(&settings).unwrap_err();
        assert!(err.to_string().contains("weather_min_confidence"));
    }

    #[test]
    fn test_category_limit_below_default_rejected() {
        let settings = InsightSettings {
            default_limit: 20,
            category_limit: 10,
            ..InsightSettings::default()
        };
        assert!(matches!(validate(&settings), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = InsightSettings {
            call_timeout_ms: 0,
            ..InsightSettings::default()
        };
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_zero_financial_window_rejected() {
        let settings = InsightSettings {
            financial_window_days: 0,
            ..InsightSettings::default()
        };
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_blank_api_key_dropped() {
        let config = InferenceConfig {
            base_url: Some("http://localhost:9000".to_string()),
            api_key: Some("  ".to_string()),
            ..InferenceConfig::default()
        };
        assert_eq!(check_inference(&config).api_key, None);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let config = InferenceConfig {
            base_url: Some("http://localhost:9000".to_string()),
            api_key: Some("k".to_string()),
            requests_per_second: 0,
            ..InferenceConfig::default()
        };
        let checked = check_inference(&config);
        assert_eq!(checked.requests_per_second, 1);
        assert_eq!(checked.api_key.as_deref(), Some("k"));
    }
}
