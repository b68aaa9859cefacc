//! Signal providers and other collaborators
//!
//! Every external dependency of the insight engine sits behind one of the
//! narrow async traits in this module:
//! - `FarmRepository` - farm context and historical reads (persistence)
//! - `PestProvider` - scored pest/disease predictions
//! - `TaskProvider` - task recommendations
//! - `WeatherProvider` - current weather for a region
//! - `InferenceService` - remote analysis backing the enhancement tier
//! - `TaskScheduler` - marks a recommended task as scheduled
//! - `Clock` - current time, injectable for deterministic heuristics
//!
//! Collaborators return provider-native records; turning them into insights
//! is the normalizer's job.

pub mod inference_client;
pub mod weather_client;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use inference_client::HttpInferenceClient;
pub use weather_client::HttpWeatherClient;

// ============================================================================
// Errors
// ============================================================================

/// Collaborator failure
///
/// None of these reach the caller of the aggregator: they are absorbed by
/// the fallback adapter or turned into an empty contribution.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Collaborator not configured or not reachable
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its time budget
    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport or HTTP status failure
    #[error("Request failed: {0}")]
    Request(String),

    /// Payload could not be interpreted
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence read/write failure
    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// Native records
// ============================================================================

/// Resolved farm context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmContext {
    pub farm_id: String,
    pub user_id: String,
    pub name: String,
    pub region: String,
    pub crop_type: Option<String>,
    /// Crop stage recorded by the grower, if any
    pub crop_stage: Option<String>,
    pub area_hectares: Option<f64>,
}

/// Scored pest/disease prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestPrediction {
    pub id: String,
    /// snake_case pest category, e.g. `powdery_mildew`
    pub pest_type: String,
    pub risk_level: String,
    /// Fraction or percentage
    pub probability_score: f64,
    pub predicted_onset_date: NaiveDate,
}

/// Task recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecommendation {
    pub id: String,
    pub task_type: String,
    pub priority_score: f64,
    pub confidence_score: f64,
    pub reasoning: String,
    pub weather_dependent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Current weather for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub region: String,
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    #[serde(default)]
    pub rainfall_mm: f64,
}

/// One expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub category: String,
    pub amount: f64,
    pub spent_on: NaiveDate,
}

/// Number of logged activities of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    pub kind: String,
    pub count: u32,
}

/// Analysis kind requested from the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceKind {
    Weather,
    Financial,
    Growth,
}

impl fmt::Display for InferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weather => "weather",
            Self::Financial => "financial",
            Self::Growth => "growth",
        };
        f.write_str(s)
    }
}

/// Request sent to the inference service
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub kind: InferenceKind,
    pub farm_id: String,
    pub payload: serde_json::Value,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Persistence collaborator (read-only from the engine's point of view)
#[async_trait]
pub trait FarmRepository: Send + Sync {
    /// Resolve farm context; `Ok(None)` when the farm does not exist
    async fn get_farm(&self, farm_id: &str) -> Result<Option<FarmContext>, ProviderError>;

    /// Expenses with `from <= spent_on < to`
    async fn expenses_between(
        &self,
        farm_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, ProviderError>;

    /// Activity counts per kind with `occurred_on >= since`
    async fn activity_counts_since(
        &self,
        farm_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<ActivityCount>, ProviderError>;
}

#[async_trait]
pub trait PestProvider: Send + Sync {
    async fn active_predictions(&self, farm_id: &str) -> Result<Vec<PestPrediction>, ProviderError>;
}

#[async_trait]
pub trait TaskProvider: Send + Sync {
    async fn active_recommendations(
        &self,
        farm_id: &str,
    ) -> Result<Vec<TaskRecommendation>, ProviderError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, region: &str) -> Result<WeatherSnapshot, ProviderError>;
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Run one analysis; the response shape depends on `request.kind`
    async fn analyze(&self, request: &InferenceRequest) -> Result<serde_json::Value, ProviderError>;
}

#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule_task(&self, recommendation_id: &str) -> Result<(), ProviderError>;
}

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// Mock collaborators for testing
// ============================================================================
