//! Task recommendations
//!
//! Status moves `active` → `scheduled` when the grower accepts a recommendation.

use crate::providers::TaskRecommendation;
use chrono::{DateTime, Utc};
use farmlog_common::{Error, Result};
use sqlx::{Row, SqlitePool};

pub async fn save_task_recommendation(
    pool: &SqlitePool,
    farm_id: &str,
    recommendation: &TaskRecommendation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO task_recommendations (
            id, farm_id, task_type, priority_score, confidence_score,
            reasoning, weather_dependent, expires_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            task_type = excluded.task_type,
            priority_score = excluded.priority_score,
            confidence_score = excluded.confidence_score,
            reasoning = excluded.reasoning,
            weather_dependent = excluded.weather_dependent,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(&recommendation.id)
    .bind(farm_id)
    .bind(&recommendation.task_type)
    .bind(recommendation.priority_score)
    .bind(recommendation.confidence_score)
    .bind(&recommendation.reasoning)
    .bind(recommendation.weather_dependent)
    .bind(recommendation.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Active recommendations, highest priority score first
pub async fn load_active_recommendations(
    pool: &SqlitePool,
    farm_id: &str,
) -> Result<Vec<TaskRecommendation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, task_type, priority_score, confidence_score, reasoning,
               weather_dependent, expires_at
        FROM task_recommendations
        WHERE farm_id = ? AND status = 'active'
        ORDER BY priority_score DESC, id
        "#,
    )
    .bind(farm_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<TaskRecommendation> {
            Ok(TaskRecommendation {
                id: row.try_get("id")?,
                task_type: row.try_get("task_type")?,
                priority_score: row.try_get("priority_score")?,
                confidence_score: row.try_get("confidence_score")?,
                reasoning: row.try_get("reasoning")?,
                weather_dependent: row.try_get("weather_dependent")?,
                expires_at: row.try_get("expires_at")?,
            })
        })
        .collect()
}

/// Mark an active recommendation as scheduled
///
/// # Errors
/// `Error::NotFound` if no active recommendation has this id.
pub async fn mark_scheduled(
    pool: &SqlitePool,
    recommendation_id: &str,
    scheduled_at: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE task_recommendations
        SET status = 'scheduled', scheduled_at = ?
        WHERE id = ? AND status = 'active'
        "#,
    )
    .bind(scheduled_at)
    .bind(recommendation_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "active task recommendation {}",
            recommendation_id
        )));
    }

    Ok(())
}

/// Current status of a recommendation, if it exists
pub async fn load_status(pool: &SqlitePool, recommendation_id: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT status FROM task_recommendations WHERE id = ?")
        .bind(recommendation_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(row.try_get("status")?)),
        None => Ok(None),
    }
}
