//! Insight API handlers
//!
//! GET /farms/:farm_id/insights, GET /farms/:farm_id/insights/categories,
//! POST /insights/actions

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    error::{ApiError, ApiResult},
    types::{ActionResult, Insight, InsightType},
    AppState,
};

/// Upper bound on `limit` accepted over HTTP
pub const MAX_LIMIT: usize = 100;

/// Query for the flat insight list
#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    pub limit: Option<usize>,
    /// Requesting user, recorded in logs only
    pub user_id: Option<String>,
}

/// Query for the grouped view
#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub user_id: Option<String>,
}

/// GET /farms/:farm_id/insights
pub async fn list_insights(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Insight>>> {
    let Query(query) = query?;

    if let Some(limit) = query.limit {
        if limit > MAX_LIMIT {
            return Err(ApiError::BadRequest(format!(
                "limit must be at most {}, got {}",
                MAX_LIMIT, limit
            )));
        }
    }

    let user_id = query.user_id.unwrap_or_default();
    let insights = state
        .service
        .get_insights_for_farm(&farm_id, &user_id, query.limit)
        .await;

    Ok(Json(insights))
}

/// GET /farms/:farm_id/insights/categories
pub async fn list_insights_by_category(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    query: Result<Query<CategoriesQuery>, QueryRejection>,
) -> ApiResult<Json<BTreeMap<InsightType, Vec<Insight>>>> {
    let Query(query) = query?;
    let user_id = query.user_id.unwrap_or_default();

    let groups = state
        .service
        .get_insights_by_category(&farm_id, &user_id)
        .await;

    Ok(Json(groups))
}

/// POST /insights/actions
///
/// Body is the insight whose action should run. Always 200 for a well-formed
/// insight; the outcome is in `success`.
pub async fn execute_action(
    State(state): State<AppState>,
    body: Result<Json<Insight>, JsonRejection>,
) -> ApiResult<Json<ActionResult>> {
    let Json(insight) = body?;

    tracing::info!(
        insight_id = %insight.id,
        action_type = ?insight.action_type,
        "Execute insight action"
    );

    Ok(Json(state.service.execute_insight_action(&insight).await))
}

/// Build insight routes
pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/farms/:farm_id/insights", get(list_insights))
        .route(
            "/farms/:farm_id/insights/categories",
            get(list_insights_by_category),
        )
        .route("/insights/actions", post(execute_action))
}
