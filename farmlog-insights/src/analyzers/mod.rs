//! Signal analyzers
//!
//! Each two-tier signal (weather, financial, growth) has an enhanced analyzer
//! backed by the inference service and a basic, rule-based analyzer with no
//! external calls. Both tiers of one signal share input and output types so
//! the fallback adapter can swap one for the other.

pub mod financial;
pub mod growth;
pub mod weather;

use crate::normalizer::Provenance;
use crate::providers::ProviderError;
use crate::types::{Confidence, Insight};
use async_trait::async_trait;

pub use financial::{BasicFinancialAnalyzer, EnhancedFinancialAnalyzer, FinancialAnalysis, FinancialInput, Trend};
pub use growth::{BasicGrowthAnalyzer, EnhancedGrowthAnalyzer, GrowthAnalysis, GrowthInput};
pub use weather::{BasicWeatherAnalyzer, EnhancedWeatherAnalyzer, WeatherAdvisory, WeatherAnalysis, WeatherInput};

/// One analysis tier for one signal type
///
/// # Example
/// ```rust,ignore
/// let analysis = BasicWeatherAnalyzer.analyze(&input).await?;
/// let insights = analysis.to_insights(&provenance);
/// ```
#[async_trait]
pub trait SignalAnalyzer: Send + Sync {
    type Input: Send + Sync;
    type Output: Analysis;

    /// Analyzer name for provenance tracking and logs
    fn name(&self) -> &'static str;

    /// Analyze the input
    ///
    /// # Errors
    /// Any `ProviderError`; the fallback adapter decides what happens next.
    async fn analyze(&self, input: &Self::Input) -> Result<Self::Output, ProviderError>;
}

/// Analyzer output that can be scored and normalized into insights
pub trait Analysis: Send + Sync + 'static {
    /// Confidence reported by the analyzer itself
    fn confidence(&self) -> Confidence;

    /// Normalize into zero or more insights
    fn to_insights(&self, provenance: &Provenance) -> Vec<Insight>;
}

/// Parse an inference response body into a typed response
pub(crate) fn parse_response<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))
}

// ============================================================================
// Mock analyzers for testing
// ============================================================================
