//! Growth-stage analyzers
//!
//! The basic tier knows nothing about live conditions: it uses the stage the
//! grower recorded on the farm, or else a fixed calendar.
//!
//! | Months  | Stage             |
//! |---------|-------------------|
//! | Dec-Feb | dormancy          |
//! | Mar-May | flowering         |
//! | Jun-Aug | fruit_development |
//! | Sep-Nov | harvest           |

use super::{parse_response, SignalAnalyzer};
use crate::providers::{ActivityCount, FarmContext, InferenceKind, InferenceRequest, InferenceService, ProviderError};
use crate::types::{normalize_confidence, Confidence};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Growth signal input
#[derive(Debug, Clone)]
pub struct GrowthInput {
    pub farm: FarmContext,
    pub today: NaiveDate,
    /// Activity counts over the last 30 days
    pub recent_activities: Vec<ActivityCount>,
}

/// Growth analysis result
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthAnalysis {
    /// snake_case stage name
    pub stage: String,
    pub recommendations: Vec<String>,
    pub confidence: Confidence,
}

impl GrowthAnalysis {
    pub fn is_flowering(&self) -> bool {
        self.stage.to_ascii_lowercase().contains("flower")
    }
}

#[derive(Debug, Deserialize)]
struct EnhancedGrowthResponse {
    stage: String,
    #[serde(default)]
    recommendations: Vec<String>,
    confidence: f64,
}

/// Calendar stage for a month (1-12)
pub fn calendar_stage(month: u32) -> &'static str {
    match month {
        3..=5 => "flowering",
        6..=8 => "fruit_development",
        9..=11 => "harvest",
        _ => "dormancy",
    }
}

/// Fixed guidance per stage
pub fn stage_recommendations(stage: &str) -> Vec<String> {
    let items: &[&str] = match stage.to_ascii_lowercase().as_str() {
        s if s.contains("flower") => &[
            "Avoid broad-spectrum sprays during bloom",
            "Keep soil moisture steady to limit flower drop",
            "Scout panicles for powdery mildew",
        ],
        s if s.contains("fruit") => &[
            "Increase potassium in fertigation",
            "Check fruit fly traps weekly",
        ],
        s if s.contains("harvest") => &[
            "Plan picking crews around peak maturity",
            "Schedule post-harvest pruning after the final pick",
        ],
        s if s.contains("dorman") => &[
            "Prune dead and crossing branches",
            "Apply basal fertilizer before bud break",
        ],
        _ => &["Keep activity logs current for stage-specific guidance"],
    };
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Enhanced tier
// ============================================================================

/// Inference-backed growth analyzer
pub struct EnhancedGrowthAnalyzer {
    inference: Arc<dyn InferenceService>,
}

impl EnhancedGrowthAnalyzer {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self { inference }
    }
}

#[async_trait]
impl SignalAnalyzer for EnhancedGrowthAnalyzer {
    type Input = GrowthInput;
    type Output = GrowthAnalysis;

    fn name(&self) -> &'static str {
        "growth-inference"
    }

    async fn analyze(&self, input: &GrowthInput) -> Result<GrowthAnalysis, ProviderError> {
        let request = InferenceRequest {
            kind: InferenceKind::Growth,
            farm_id: input.farm.farm_id.clone(),
            payload: json!({
                "cropType": input.farm.crop_type,
                "recordedStage": input.farm.crop_stage,
                "region": input.farm.region,
                "date": input.today.to_string(),
                "activities": input.recent_activities,
            }),
        };

        let response: EnhancedGrowthResponse = parse_response(self.inference.analyze(&request).await?)?;

        if response.stage.trim().is_empty() {
            return Err(ProviderError::Malformed("empty growth stage".to_string()));
        }

        Ok(GrowthAnalysis {
            stage: response.stage,
            recommendations: response.recommendations,
            confidence: normalize_confidence(response.confidence),
        })
    }
}

// ============================================================================
// Basic tier
// ============================================================================

/// Recorded stage, else calendar-month heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicGrowthAnalyzer;

#[async_trait]
impl SignalAnalyzer for BasicGrowthAnalyzer {
    type Input = GrowthInput;
    type Output = GrowthAnalysis;

    fn name(&self) -> &'static str {
        "growth-calendar"
    }

    async fn analyze(&self, input: &GrowthInput) -> Result<GrowthAnalysis, ProviderError> {
        let stage = input
            .farm
            .crop_stage
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase().replace(' ', "_"))
            .unwrap_or_else(|| calendar_stage(input.today.month()).to_string());

        Ok(GrowthAnalysis {
            recommendations: stage_recommendations(&stage),
            stage,
            confidence: 1.0,
        })
    }
}
