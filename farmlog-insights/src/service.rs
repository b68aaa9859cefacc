//! Insight service facade
//!
//! The operations exposed to the request-handling layer. None of them fail:
//! aggregation errors and panics become an empty result, action failures
//! become `success: false`.

use crate::aggregator::{AggregatorConfig, Collaborators, InsightAggregator};
use crate::dispatcher::ActionDispatcher;
use crate::providers::TaskScheduler;
use crate::types::{ActionResult, Insight, InsightType};
use farmlog_common::config::InsightSettings;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct InsightService {
    aggregator: InsightAggregator,
    dispatcher: ActionDispatcher,
    default_limit: usize,
}

impl InsightService {
    pub fn new(aggregator: InsightAggregator, dispatcher: ActionDispatcher, default_limit: usize) -> Self {
        Self {
            aggregator,
            dispatcher,
            default_limit,
        }
    }

    /// Wire aggregator and dispatcher from `[insights]` settings
    pub fn from_settings(
        collaborators: Collaborators,
        scheduler: Arc<dyn TaskScheduler>,
        settings: &InsightSettings,
    ) -> Self {
        Self::new(
            InsightAggregator::new(collaborators, AggregatorConfig::from(settings)),
            ActionDispatcher::new(scheduler),
            settings.default_limit,
        )
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Ranked insights for a farm; `limit` defaults to the configured default
    pub async fn get_insights_for_farm(
        &self,
        farm_id: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Vec<Insight> {
        let limit = limit.unwrap_or(self.default_limit);

        match AssertUnwindSafe(self.aggregator.aggregate(farm_id, limit))
            .catch_unwind()
            .await
        {
            Ok(Ok(insights)) => {
                debug!(farm_id = %farm_id, user_id = %user_id, count = insights.len(), "Insights served");
                insights
            }
            Ok(Err(e)) => {
                warn!(farm_id = %farm_id, user_id = %user_id, error = %e, "Insight aggregation failed");
                Vec::new()
            }
            Err(_) => {
                error!(farm_id = %farm_id, user_id = %user_id, "Insight aggregation panicked");
                Vec::new()
            }
        }
    }

    /// Insights grouped by type
    pub async fn get_insights_by_category(
        &self,
        farm_id: &str,
        user_id: &str,
    ) -> BTreeMap<InsightType, Vec<Insight>> {
        match AssertUnwindSafe(self.aggregator.aggregate_by_category(farm_id))
            .catch_unwind()
            .await
        {
            Ok(Ok(groups)) => groups,
            Ok(Err(e)) => {
                warn!(farm_id = %farm_id, user_id = %user_id, error = %e, "Category aggregation failed");
                BTreeMap::new()
            }
            Err(_) => {
                error!(farm_id = %farm_id, user_id = %user_id, "Category aggregation panicked");
                BTreeMap::new()
            }
        }
    }

    pub async fn execute_insight_action(&self, insight: &Insight) -> ActionResult {
        match AssertUnwindSafe(self.dispatcher.execute(insight)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                error!(insight_id = %insight.id, "Insight action panicked");
                ActionResult::failed("Action failed unexpectedly")
            }
        }
    }
}
