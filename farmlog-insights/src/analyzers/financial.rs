//! Financial trend analyzers
//!
//! Both tiers compare a recent expense window against the window before it.
//! The aggregator never calls these with an empty window: without a baseline
//! there is nothing to compare.

use super::{parse_response, SignalAnalyzer};
use crate::providers::{ExpenseRecord, InferenceKind, InferenceRequest, InferenceService, ProviderError};
use crate::types::{normalize_confidence, Confidence};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Relative change below which spending counts as stable
pub const STABLE_BAND: f64 = 0.15;

/// Financial signal input
#[derive(Debug, Clone)]
pub struct FinancialInput {
    pub farm_id: String,
    pub window_days: i64,
    pub recent: Vec<ExpenseRecord>,
    pub prior: Vec<ExpenseRecord>,
}

impl FinancialInput {
    pub fn recent_total(&self) -> f64 {
        total(&self.recent)
    }

    pub fn prior_total(&self) -> f64 {
        total(&self.prior)
    }

    /// Relative change of recent vs prior spending; `None` without a positive baseline
    pub fn variance(&self) -> Option<f64> {
        let prior = self.prior_total();
        if prior > 0.0 {
            Some((self.recent_total() - prior) / prior)
        } else {
            None
        }
    }

    /// Largest recent cost category (ties broken by name)
    pub fn top_recent_category(&self) -> Option<String> {
        by_category(&self.recent)
            .into_iter()
            .fold(None::<(String, f64)>, |best, (category, amount)| match best {
                Some((_, best_amount)) if best_amount >= amount => best,
                _ => Some((category, amount)),
            })
            .map(|(category, _)| category)
    }
}

fn total(expenses: &[ExpenseRecord]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

fn by_category(expenses: &[ExpenseRecord]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Spending direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn from_variance(variance: f64) -> Self {
        if variance >= STABLE_BAND {
            Self::Increasing
        } else if variance <= -STABLE_BAND {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

/// Financial analysis result
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialAnalysis {
    pub trend: Trend,
    /// Relative change, 0.25 = 25 % more spending
    pub variance: f64,
    pub window_days: i64,
    pub top_category: Option<String>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhancedFinancialResponse {
    trend: Trend,
    variance: f64,
    #[serde(default)]
    risk_factors: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    confidence: f64,
}

// ============================================================================
// Enhanced tier
// ============================================================================

/// Inference-backed trend analyzer
pub struct EnhancedFinancialAnalyzer {
    inference: Arc<dyn InferenceService>,
}

impl EnhancedFinancialAnalyzer {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self { inference }
    }
}

#[async_trait]
impl SignalAnalyzer for EnhancedFinancialAnalyzer {
    type Input = FinancialInput;
    type Output = FinancialAnalysis;

    fn name(&self) -> &'static str {
        "financial-inference"
    }

    async fn analyze(&self, input: &FinancialInput) -> Result<FinancialAnalysis, ProviderError> {
        let request = InferenceRequest {
            kind: InferenceKind::Financial,
            farm_id: input.farm_id.clone(),
            payload: json!({
                "windowDays": input.window_days,
                "recentTotal": input.recent_total(),
                "priorTotal": input.prior_total(),
                "recentByCategory": by_category(&input.recent),
                "priorByCategory": by_category(&input.prior),
            }),
        };

        let response: EnhancedFinancialResponse =
            parse_response(self.inference.analyze(&request).await?)?;

        if !response.variance.is_finite() {
            return Err(ProviderError::Malformed("non-finite variance".to_string()));
        }

        Ok(FinancialAnalysis {
            trend: response.trend,
            variance: response.variance,
            window_days: input.window_days,
            top_category: input.top_recent_category(),
            risk_factors: response.risk_factors,
            recommendations: response.recommendations,
            confidence: normalize_confidence(response.confidence),
        })
    }
}

// ============================================================================
// Basic tier
// ============================================================================

/// Window-over-window spending comparison
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFinancialAnalyzer;

#[async_trait]
impl SignalAnalyzer for BasicFinancialAnalyzer {
    type Input = FinancialInput;
    type Output = FinancialAnalysis;

    fn name(&self) -> &'static str {
        "financial-rules"
    }

    async fn analyze(&self, input: &FinancialInput) -> Result<FinancialAnalysis, ProviderError> {
        let variance = input
            .variance()
            .ok_or_else(|| ProviderError::Malformed("prior window has no spending".to_string()))?;
        let trend = Trend::from_variance(variance);
        let top_category = input.top_recent_category();

        let recommendations = match (trend, &top_category) {
            (Trend::Increasing, Some(category)) => {
                vec![format!("Review {} costs against last period's budget", category)]
            }
            (Trend::Increasing, None) => vec!["Review recent costs against budget".to_string()],
            (Trend::Decreasing, _) => vec!["Spending is down; confirm no planned work was skipped".to_string()],
            (Trend::Stable, _) => Vec::new(),
        };

        Ok(FinancialAnalysis {
            trend,
            variance,
            window_days: input.window_days,
            top_category,
            risk_factors: Vec::new(),
            recommendations,
            confidence: 1.0,
        })
    }
}
