//! Enhancement/fallback adapter
//!
//! Runs one signal's enhanced analyzer, falls back to its basic analyzer on
//! failure, timeout or low confidence, and reports what happened as a tagged
//! `SignalOutcome`. Never returns an error: a signal whose tiers both fail
//! contributes nothing.
//!
//! # Example
//! ```rust,ignore
//! let adapter = FallbackAdapter::new(
//!     "weather",
//!     Some(Arc::new(EnhancedWeatherAnalyzer::new(inference))),
//!     Arc::new(BasicWeatherAnalyzer),
//!     policy,
//! );
//! let outcome = adapter.run(&input, clock.now()).await;
//! ```

use crate::analyzers::{Analysis, SignalAnalyzer};
use crate::normalizer::Provenance;
use crate::providers::ProviderError;
use crate::types::{clamp_confidence, Confidence, Insight, InsightSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Thresholds for one signal type
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy {
    /// Enhanced results below this confidence are discarded
    pub min_confidence: Confidence,
    /// Confidence attached to every basic-tier insight
    pub fallback_confidence: Confidence,
    /// Budget for each analyzer call
    pub call_timeout: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            fallback_confidence: 0.5,
            call_timeout: Duration::from_secs(3),
        }
    }
}

/// What one signal source contributed to an aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// Scored feed with no enhancement tier
    Direct { insights: Vec<Insight> },
    /// Enhanced analyzer succeeded with enough confidence
    Enhanced {
        insights: Vec<Insight>,
        analyzer: &'static str,
    },
    /// Basic analyzer used; `reason` says why the enhanced tier was skipped
    Basic {
        insights: Vec<Insight>,
        analyzer: &'static str,
        reason: String,
    },
    /// Nothing contributed
    Empty { reason: String },
}

impl SignalOutcome {
    pub fn empty(reason: impl Into<String>) -> Self {
        Self::Empty {
            reason: reason.into(),
        }
    }

    pub fn insights(&self) -> &[Insight] {
        match self {
            Self::Direct { insights } | Self::Enhanced { insights, .. } | Self::Basic { insights, .. } => {
                insights
            }
            Self::Empty { .. } => &[],
        }
    }

    pub fn into_insights(self) -> Vec<Insight> {
        match self {
            Self::Direct { insights } | Self::Enhanced { insights, .. } | Self::Basic { insights, .. } => {
                insights
            }
            Self::Empty { .. } => Vec::new(),
        }
    }

    /// Tier that produced the insights, `None` for `Empty`
    pub fn tier(&self) -> Option<InsightSource> {
        match self {
            Self::Direct { .. } => Some(InsightSource::Direct),
            Self::Enhanced { .. } => Some(InsightSource::Enhanced),
            Self::Basic { .. } => Some(InsightSource::Basic),
            Self::Empty { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Basic { reason, .. } | Self::Empty { reason } => Some(reason),
            _ => None,
        }
    }
}

type DynAnalyzer<I, A> = Arc<dyn SignalAnalyzer<Input = I, Output = A>>;

/// Two-tier runner for one signal type
pub struct FallbackAdapter<I, A>
where
    I: Send + Sync + 'static,
    A: Analysis,
{
    signal: &'static str,
    enhanced: Option<DynAnalyzer<I, A>>,
    basic: DynAnalyzer<I, A>,
    policy: FallbackPolicy,
}

impl<I, A> FallbackAdapter<I, A>
where
    I: Send + Sync + 'static,
    A: Analysis,
{
    /// `enhanced` is `None` when no inference service is configured
    pub fn new(
        signal: &'static str,
        enhanced: Option<DynAnalyzer<I, A>>,
        basic: DynAnalyzer<I, A>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            signal,
            enhanced,
            basic,
            policy,
        }
    }

    pub fn signal(&self) -> &'static str {
        self.signal
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    /// Run the tiers in order; sequential within this signal
    pub async fn run(&self, input: &I, now: DateTime<Utc>) -> SignalOutcome {
        let skip_reason = match &self.enhanced {
            Some(enhanced) => match self.call(enhanced.as_ref(), input).await {
                Ok(analysis) if analysis.confidence() >= self.policy.min_confidence => {
                    let provenance = Provenance {
                        source: InsightSource::Enhanced,
                        confidence: clamp_confidence(analysis.confidence()),
                        now,
                    };
                    let insights = analysis.to_insights(&provenance);
                    debug!(
                        signal = self.signal,
                        analyzer = enhanced.name(),
                        count = insights.len(),
                        "Enhanced analysis accepted"
                    );
                    return SignalOutcome::Enhanced {
                        insights,
                        analyzer: enhanced.name(),
                    };
                }
                Ok(analysis) => {
                    let reason = format!(
                        "confidence {:.2} below threshold {:.2}",
                        analysis.confidence(),
                        self.policy.min_confidence
                    );
                    debug!(
                        signal = self.signal,
                        analyzer = enhanced.name(),
                        %reason,
                        "Enhanced analysis discarded"
                    );
                    reason
                }
                Err(e) => {
                    warn!(
                        signal = self.signal,
                        analyzer = enhanced.name(),
                        error = %e,
                        "Enhanced analysis failed, using basic tier"
                    );
                    e.to_string()
                }
            },
            None => "inference service not configured".to_string(),
        };

        match self.call(self.basic.as_ref(), input).await {
            Ok(analysis) => {
                let provenance = Provenance {
                    source: InsightSource::Basic,
                    confidence: clamp_confidence(self.policy.fallback_confidence),
                    now,
                };
                SignalOutcome::Basic {
                    insights: analysis.to_insights(&provenance),
                    analyzer: self.basic.name(),
                    reason: skip_reason,
                }
            }
            Err(e) => {
                warn!(
                    signal = self.signal,
                    analyzer = self.basic.name(),
                    error = %e,
                    enhanced_skipped = %skip_reason,
                    "Basic analysis failed, signal contributes nothing"
                );
                SignalOutcome::empty(format!("{}; basic tier: {}", skip_reason, e))
            }
        }
    }

    async fn call(
        &self,
        analyzer: &dyn SignalAnalyzer<Input = I, Output = A>,
        input: &I,
    ) -> Result<A, ProviderError> {
        match tokio::time::timeout(self.policy.call_timeout, analyzer.analyze(input)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.policy.call_timeout)),
        }
    }
}
