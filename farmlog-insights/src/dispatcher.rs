//! Action dispatcher
//!
//! Executes the action an insight declares. Never returns an error: every
//! failure becomes `ActionResult { success: false, .. }`.
//!
//! | actionType | insight type        | effect                              |
//! |------------|---------------------|-------------------------------------|
//! | navigate   | any                 | none (UI concern), acknowledged     |
//! | view       | any                 | none, acknowledged                  |
//! | execute    | task_recommendation | task marked scheduled via scheduler |
//! | execute    | anything else       | rejected                            |
//! | unknown    | any                 | rejected                            |

use crate::providers::TaskScheduler;
use crate::types::{ActionResult, ActionType, Insight, InsightType};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ActionDispatcher {
    scheduler: Arc<dyn TaskScheduler>,
}

impl ActionDispatcher {
    pub fn new(scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self { scheduler }
    }

    pub async fn execute(&self, insight: &Insight) -> ActionResult {
        match insight.action_type {
            ActionType::Navigate => ActionResult::ok("Navigation acknowledged"),
            ActionType::View => ActionResult::ok("Insight viewed"),
            ActionType::Execute => self.execute_action(insight).await,
            ActionType::Unknown => {
                warn!(insight_id = %insight.id, "Unknown action type");
                ActionResult::failed("Unknown action type")
            }
        }
    }

    async fn execute_action(&self, insight: &Insight) -> ActionResult {
        if insight.insight_type != InsightType::TaskRecommendation {
            warn!(
                insight_id = %insight.id,
                insight_type = %insight.insight_type,
                "Execute requested for non-task insight"
            );
            return ActionResult::failed(format!(
                "execute is not supported for {} insights",
                insight.insight_type
            ));
        }

        let Some(recommendation_id) = insight
            .action_data
            .get("recommendationId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
        else {
            warn!(insight_id = %insight.id, "Task insight has no recommendationId");
            return ActionResult::failed("Missing recommendationId in action data");
        };

        match self.scheduler.schedule_task(recommendation_id).await {
            Ok(()) => {
                info!(recommendation_id = %recommendation_id, "Task scheduled");
                ActionResult::ok("Task scheduled")
            }
            Err(e) => {
                warn!(recommendation_id = %recommendation_id, error = %e, "Task scheduling failed");
                ActionResult::failed(format!("Failed to schedule task: {}", e))
            }
        }
    }
}
