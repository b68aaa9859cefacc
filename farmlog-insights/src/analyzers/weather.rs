//! Weather advisory analyzers
//!
//! Basic rules, evaluated in order against the current snapshot:
//! - temperature >= 35 °C → heat stress (high, time-relevant)
//! - temperature <= 2 °C → frost risk (critical, time-relevant)
//! - humidity >= 85 % → disease pressure (medium)
//! - wind >= 25 km/h → spray drift (medium, time-relevant)
//! - rainfall >= 10 mm → skip irrigation (low, time-relevant)

use super::{parse_response, SignalAnalyzer};
use crate::providers::{
    FarmContext, InferenceKind, InferenceRequest, InferenceService, ProviderError, WeatherSnapshot,
};
use crate::types::{normalize_confidence, Confidence, Priority};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const HEAT_STRESS_C: f64 = 35.0;
const FROST_RISK_C: f64 = 2.0;
const DISEASE_HUMIDITY_PCT: f64 = 85.0;
const SPRAY_DRIFT_WIND_KMH: f64 = 25.0;
const SKIP_IRRIGATION_RAIN_MM: f64 = 10.0;

/// Weather signal input
#[derive(Debug, Clone)]
pub struct WeatherInput {
    pub farm: FarmContext,
    pub weather: WeatherSnapshot,
}

/// One advisory produced by either tier
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAdvisory {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub time_relevant: bool,
    /// Short label, e.g. `heat`, `frost`
    #[serde(default)]
    pub category: Option<String>,
}

/// Weather analysis result
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherAnalysis {
    pub advisories: Vec<WeatherAdvisory>,
    pub confidence: Confidence,
}

#[derive(Debug, Deserialize)]
struct EnhancedWeatherResponse {
    #[serde(default)]
    insights: Vec<WeatherAdvisory>,
    confidence: f64,
}

// ============================================================================
// Enhanced tier
// ============================================================================

/// Inference-backed weather analyzer
pub struct EnhancedWeatherAnalyzer {
    inference: Arc<dyn InferenceService>,
}

impl EnhancedWeatherAnalyzer {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self { inference }
    }
}

#[async_trait]
impl SignalAnalyzer for EnhancedWeatherAnalyzer {
    type Input = WeatherInput;
    type Output = WeatherAnalysis;

    fn name(&self) -> &'static str {
        "weather-inference"
    }

    async fn analyze(&self, input: &WeatherInput) -> Result<WeatherAnalysis, ProviderError> {
        let request = InferenceRequest {
            kind: InferenceKind::Weather,
            farm_id: input.farm.farm_id.clone(),
            payload: json!({
                "region": input.farm.region,
                "cropType": input.farm.crop_type,
                "weather": input.weather,
            }),
        };

        let response: EnhancedWeatherResponse = parse_response(self.inference.analyze(&request).await?)?;

        Ok(WeatherAnalysis {
            advisories: response.insights,
            confidence: normalize_confidence(response.confidence),
        })
    }
}

// ============================================================================
// Basic tier
// ============================================================================

/// Threshold rules over the current weather snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicWeatherAnalyzer;

impl BasicWeatherAnalyzer {
    pub fn evaluate(weather: &WeatherSnapshot) -> Vec<WeatherAdvisory> {
        let mut advisories = Vec::new();

        if weather.temperature_c >= HEAT_STRESS_C {
            advisories.push(advisory(
                "Heat Stress Warning",
                format!(
                    "Temperature at {:.0}°C. Irrigate early morning and check for leaf scorch.",
                    weather.temperature_c
                ),
                Priority::High,
                true,
                "heat",
            ));
        }

        if weather.temperature_c <= FROST_RISK_C {
            advisories.push(advisory(
                "Frost Risk",
                format!(
                    "Temperature at {:.0}°C. Protect young plants and delay irrigation until mid-morning.",
                    weather.temperature_c
                ),
                Priority::Critical,
                true,
                "frost",
            ));
        }

        if weather.humidity_pct >= DISEASE_HUMIDITY_PCT {
            advisories.push(advisory(
                "High Disease Pressure",
                format!(
                    "Humidity at {:.0}%. Conditions favor fungal disease; scout affected blocks.",
                    weather.humidity_pct
                ),
                Priority::Medium,
                false,
                "humidity",
            ));
        }

        if weather.wind_speed_kmh >= SPRAY_DRIFT_WIND_KMH {
            advisories.push(advisory(
                "Avoid Spraying Today",
                format!(
                    "Wind at {:.0} km/h. Spray drift likely; postpone applications.",
                    weather.wind_speed_kmh
                ),
                Priority::Medium,
                true,
                "wind",
            ));
        }

        if weather.rainfall_mm >= SKIP_IRRIGATION_RAIN_MM {
            advisories.push(advisory(
                "Skip Irrigation",
                format!(
                    "{:.0} mm of rain recorded. Soil moisture should cover today's demand.",
                    weather.rainfall_mm
                ),
                Priority::Low,
                true,
                "rain",
            ));
        }

        advisories
    }
}

fn advisory(
    title: &str,
    description: String,
    priority: Priority,
    time_relevant: bool,
    category: &str,
) -> WeatherAdvisory {
    WeatherAdvisory {
        title: title.to_string(),
        description,
        priority,
        time_relevant,
        category: Some(category.to_string()),
    }
}

#[async_trait]
impl SignalAnalyzer for BasicWeatherAnalyzer {
    type Input = WeatherInput;
    type Output = WeatherAnalysis;

    fn name(&self) -> &'static str {
        "weather-rules"
    }

    async fn analyze(&self, input: &WeatherInput) -> Result<WeatherAnalysis, ProviderError> {
        Ok(WeatherAnalysis {
            advisories: Self::evaluate(&input.weather),
            confidence: 1.0,
        })
    }
}
