//! Insight aggregator
//!
//! Resolves the farm, fans out to the five signal sources, concatenates their
//! insights in provider-call order (pest, tasks, weather, financial, growth),
//! drops expired insights, then ranks and truncates.
//!
//! **Isolation:** a failing source contributes an empty outcome and a log line;
//! it never fails the aggregation. Only farm resolution errors propagate.

use crate::adapter::{FallbackAdapter, FallbackPolicy, SignalOutcome};
use crate::analyzers::{
    BasicFinancialAnalyzer, BasicGrowthAnalyzer, BasicWeatherAnalyzer, EnhancedFinancialAnalyzer,
    EnhancedGrowthAnalyzer, EnhancedWeatherAnalyzer, FinancialAnalysis, FinancialInput,
    GrowthAnalysis, GrowthInput, SignalAnalyzer, WeatherAnalysis, WeatherInput,
};
use crate::normalizer::{pest_insight, task_insight};
use crate::providers::{
    Clock, FarmContext, FarmRepository, InferenceService, PestProvider, ProviderError, TaskProvider,
    WeatherProvider,
};
use crate::ranking::{group_by_type, rank_and_truncate};
use crate::types::{normalize_confidence, Insight, InsightSource, InsightType, Priority};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use farmlog_common::config::InsightSettings;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Look-back for activity counts fed to the growth signal
const ACTIVITY_LOOKBACK_DAYS: i64 = 30;

/// External collaborators of the aggregator
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn FarmRepository>,
    pub pests: Arc<dyn PestProvider>,
    pub tasks: Arc<dyn TaskProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    /// `None` disables every enhancement tier
    pub inference: Option<Arc<dyn InferenceService>>,
    pub clock: Arc<dyn Clock>,
}

/// Aggregation tuning, resolved from `[insights]` settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub call_timeout: std::time::Duration,
    pub category_limit: usize,
    pub task_budget: usize,
    pub task_min_priority: f64,
    pub pest_onset_window_days: i64,
    pub financial_window_days: i64,
    pub weather_min_confidence: f64,
    pub financial_min_confidence: f64,
    pub growth_min_confidence: f64,
    pub fallback_confidence: f64,
    pub filter_expired: bool,
}

impl From<&InsightSettings> for AggregatorConfig {
    fn from(settings: &InsightSettings) -> Self {
        Self {
            call_timeout: std::time::Duration::from_millis(settings.call_timeout_ms),
            category_limit: settings.category_limit,
            task_budget: settings.task_budget,
            task_min_priority: settings.task_min_priority,
            pest_onset_window_days: settings.pest_onset_window_days,
            financial_window_days: settings.financial_window_days,
            weather_min_confidence: settings.weather_min_confidence,
            financial_min_confidence: settings.financial_min_confidence,
            growth_min_confidence: settings.growth_min_confidence,
            fallback_confidence: settings.fallback_confidence,
            filter_expired: settings.filter_expired,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&InsightSettings::default())
    }
}

impl AggregatorConfig {
    fn policy(&self, min_confidence: f64) -> FallbackPolicy {
        FallbackPolicy {
            min_confidence,
            fallback_confidence: self.fallback_confidence,
            call_timeout: self.call_timeout,
        }
    }
}

/// One source's contribution to an aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub signal: &'static str,
    /// `None` when the source contributed nothing
    pub tier: Option<InsightSource>,
    pub contributed: usize,
    pub reason: Option<String>,
}

impl SourceReport {
    fn from_outcome(signal: &'static str, outcome: &SignalOutcome) -> Self {
        Self {
            signal,
            tier: outcome.tier(),
            contributed: outcome.insights().len(),
            reason: outcome.reason().map(str::to_string),
        }
    }
}

/// Diagnostics for one aggregation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub farm_found: bool,
    /// In provider-call order
    pub sources: Vec<SourceReport>,
    pub expired_dropped: usize,
    pub total_before_limit: usize,
}

impl AggregationReport {
    pub fn source(&self, signal: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.signal == signal)
    }
}

type Analyzer<I, A> = Arc<dyn SignalAnalyzer<Input = I, Output = A>>;

/// The two-tier adapters of the weather, financial and growth signals
pub struct SignalAdapters {
    pub weather: FallbackAdapter<WeatherInput, WeatherAnalysis>,
    pub financial: FallbackAdapter<FinancialInput, FinancialAnalysis>,
    pub growth: FallbackAdapter<GrowthInput, GrowthAnalysis>,
}

impl SignalAdapters {
    /// Inference-backed enhanced tiers (when configured) over the rule-based analyzers
    pub fn standard(
        inference: Option<Arc<dyn InferenceService>>,
        config: &AggregatorConfig,
    ) -> Self {
        let weather = inference
            .clone()
            .map(|i| -> Analyzer<WeatherInput, WeatherAnalysis> {
                Arc::new(EnhancedWeatherAnalyzer::new(i))
            });
        let financial = inference
            .clone()
            .map(|i| -> Analyzer<FinancialInput, FinancialAnalysis> {
                Arc::new(EnhancedFinancialAnalyzer::new(i))
            });
        let growth = inference.map(|i| -> Analyzer<GrowthInput, GrowthAnalysis> {
            Arc::new(EnhancedGrowthAnalyzer::new(i))
        });

        Self {
            weather: FallbackAdapter::new(
                "weather",
                weather,
                Arc::new(BasicWeatherAnalyzer),
                config.policy(config.weather_min_confidence),
            ),
            financial: FallbackAdapter::new(
                "financial",
                financial,
                Arc::new(BasicFinancialAnalyzer),
                config.policy(config.financial_min_confidence),
            ),
            growth: FallbackAdapter::new(
                "growth",
                growth,
                Arc::new(BasicGrowthAnalyzer),
                config.policy(config.growth_min_confidence),
            ),
        }
    }
}

/// Insight aggregation engine
///
/// Stateless across calls: every aggregation recomputes from the collaborators.
pub struct InsightAggregator {
    collaborators: Collaborators,
    config: AggregatorConfig,
    adapters: SignalAdapters,
}

impl InsightAggregator {
    pub fn new(collaborators: Collaborators, config: AggregatorConfig) -> Self {
        let adapters = SignalAdapters::standard(collaborators.inference.clone(), &config);
        Self::with_adapters(collaborators, config, adapters)
    }

    /// Use caller-supplied signal adapters; `collaborators.inference` is then ignored
    pub fn with_adapters(
        collaborators: Collaborators,
        config: AggregatorConfig,
        adapters: SignalAdapters,
    ) -> Self {
        Self {
            collaborators,
            config,
            adapters,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Ranked insights for a farm, at most `limit`
    ///
    /// An unknown farm yields an empty list.
    ///
    /// # Errors
    /// Only when the farm context itself cannot be read.
    pub async fn aggregate(&self, farm_id: &str, limit: usize) -> Result<Vec<Insight>, ProviderError> {
        self.aggregate_with_report(farm_id, limit)
            .await
            .map(|(insights, _)| insights)
    }

    /// Ranked insights grouped by type, using the category budget
    pub async fn aggregate_by_category(
        &self,
        farm_id: &str,
    ) -> Result<BTreeMap<InsightType, Vec<Insight>>, ProviderError> {
        let insights = self.aggregate(farm_id, self.config.category_limit).await?;
        Ok(group_by_type(insights))
    }

    /// `aggregate` plus a per-source account of what happened
    pub async fn aggregate_with_report(
        &self,
        farm_id: &str,
        limit: usize,
    ) -> Result<(Vec<Insight>, AggregationReport), ProviderError> {
        let mut report = AggregationReport::default();

        // Join barrier: every source needs the farm context
        let farm = match self.bounded(self.collaborators.repository.get_farm(farm_id)).await? {
            Some(farm) => farm,
            None => {
                info!(farm_id = %farm_id, "Farm not found, no insights");
                return Ok((Vec::new(), report));
            }
        };
        report.farm_found = true;

        let now = self.collaborators.clock.now();
        let today = now.date_naive();

        let (pests, tasks, weather, financial, growth) = tokio::join!(
            self.pest_signal(&farm, today),
            self.task_signal(&farm, now),
            self.weather_signal(&farm, now),
            self.financial_signal(&farm, today, now),
            self.growth_signal(&farm, today, now),
        );

        let mut insights = Vec::new();
        for (signal, outcome) in [
            ("pest", pests),
            ("tasks", tasks),
            ("weather", weather),
            ("financial", financial),
            ("growth", growth),
        ] {
            report.sources.push(SourceReport::from_outcome(signal, &outcome));
            insights.extend(outcome.into_insights());
        }

        if self.config.filter_expired {
            let before = insights.len();
            insights.retain(|insight| !insight.is_expired(now));
            report.expired_dropped = before - insights.len();
        }

        report.total_before_limit = insights.len();
        let ranked = rank_and_truncate(insights, limit);

        debug!(
            farm_id = %farm_id,
            total = report.total_before_limit,
            returned = ranked.len(),
            expired_dropped = report.expired_dropped,
            "Aggregation complete"
        );

        Ok((ranked, report))
    }

    // ========================================================================
    // Signal sources
    // ========================================================================

    async fn pest_signal(&self, farm: &FarmContext, today: NaiveDate) -> SignalOutcome {
        match self
            .bounded(self.collaborators.pests.active_predictions(&farm.farm_id))
            .await
        {
            Ok(predictions) => {
                let insights = predictions
                    .iter()
                    .filter(|p| {
                        matches!(
                            Priority::parse(&p.risk_level),
                            Some(Priority::Critical | Priority::High)
                        )
                    })
                    .filter_map(|p| pest_insight(p, today, self.config.pest_onset_window_days))
                    .collect();
                SignalOutcome::Direct { insights }
            }
            Err(e) => {
                warn!(farm_id = %farm.farm_id, signal = "pest", error = %e, "Pest predictions unavailable");
                SignalOutcome::empty(e.to_string())
            }
        }
    }

    /// Expired recommendations are dropped before the budget is applied
    async fn task_signal(&self, farm: &FarmContext, now: DateTime<Utc>) -> SignalOutcome {
        match self
            .bounded(self.collaborators.tasks.active_recommendations(&farm.farm_id))
            .await
        {
            Ok(recommendations) => {
                let insights = recommendations
                    .iter()
                    .filter(|r| normalize_confidence(r.priority_score) >= self.config.task_min_priority)
                    .filter(|r| {
                        !(self.config.filter_expired && r.expires_at.is_some_and(|at| at < now))
                    })
                    .take(self.config.task_budget)
                    .map(task_insight)
                    .collect();
                SignalOutcome::Direct { insights }
            }
            Err(e) => {
                warn!(farm_id = %farm.farm_id, signal = "tasks", error = %e, "Task recommendations unavailable");
                SignalOutcome::empty(e.to_string())
            }
        }
    }

    async fn weather_signal(&self, farm: &FarmContext, now: DateTime<Utc>) -> SignalOutcome {
        let weather = match self
            .bounded(self.collaborators.weather.current_weather(&farm.region))
            .await
        {
            Ok(weather) => weather,
            Err(e) => {
                warn!(farm_id = %farm.farm_id, signal = "weather", error = %e, "Current weather unavailable");
                return SignalOutcome::empty(format!("weather unavailable: {}", e));
            }
        };

        let input = WeatherInput {
            farm: farm.clone(),
            weather,
        };
        self.adapters.weather.run(&input, now).await
    }

    async fn financial_signal(
        &self,
        farm: &FarmContext,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> SignalOutcome {
        // Recent window includes today
        let Some((prior_from, recent_from, recent_until)) =
            expense_windows(today, self.config.financial_window_days)
        else {
            warn!(farm_id = %farm.farm_id, %today, "Expense windows out of calendar range");
            return SignalOutcome::empty("expense window out of range");
        };
        let repository = &self.collaborators.repository;

        let (recent, prior) = tokio::join!(
            self.bounded(repository.expenses_between(&farm.farm_id, recent_from, recent_until)),
            self.bounded(repository.expenses_between(&farm.farm_id, prior_from, recent_from)),
        );

        let (recent, prior) = match (recent, prior) {
            (Ok(recent), Ok(prior)) => (recent, prior),
            (Err(e), _) | (_, Err(e)) => {
                warn!(farm_id = %farm.farm_id, signal = "financial", error = %e, "Expense history unavailable");
                return SignalOutcome::empty(format!("expense history unavailable: {}", e));
            }
        };

        if recent.is_empty() || prior.is_empty() {
            debug!(
                farm_id = %farm.farm_id,
                recent = recent.len(),
                prior = prior.len(),
                "Expense window empty, no financial baseline"
            );
            return SignalOutcome::empty("expense window empty");
        }

        let input = FinancialInput {
            farm_id: farm.farm_id.clone(),
            window_days: self.config.financial_window_days,
            recent,
            prior,
        };
        self.adapters.financial.run(&input, now).await
    }

    async fn growth_signal(
        &self,
        farm: &FarmContext,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> SignalOutcome {
        let since = today
            .checked_sub_signed(Duration::days(ACTIVITY_LOOKBACK_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let recent_activities = match self
            .bounded(
                self.collaborators
                    .repository
                    .activity_counts_since(&farm.farm_id, since),
            )
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                debug!(farm_id = %farm.farm_id, error = %e, "Activity counts unavailable, continuing without");
                Vec::new()
            }
        };

        let input = GrowthInput {
            farm: farm.clone(),
            today,
            recent_activities,
        };
        self.adapters.growth.run(&input, now).await
    }

    /// Bound a collaborator call by the per-call timeout
    async fn bounded<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        tokio::time::timeout(self.config.call_timeout, call)
            .await
            .unwrap_or_else(|_| Err(ProviderError::Timeout(self.config.call_timeout)))
    }
}

/// `(prior_from, recent_from, recent_until)`; `None` when a bound leaves the calendar
fn expense_windows(
    today: NaiveDate,
    window_days: i64,
) -> Option<(NaiveDate, NaiveDate, NaiveDate)> {
    let window = Duration::try_days(window_days)?;
    let recent_from = today.checked_sub_signed(window)?;
    let prior_from = recent_from.checked_sub_signed(window)?;
    let recent_until = today.checked_add_signed(Duration::days(1))?;
    Some((prior_from, recent_from, recent_until))
}
