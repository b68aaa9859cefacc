//! Logged farm activities

use crate::providers::ActivityCount;
use chrono::NaiveDate;
use farmlog_common::Result;
use sqlx::{Row, SqlitePool};

pub async fn save_activity(
    pool: &SqlitePool,
    farm_id: &str,
    kind: &str,
    occurred_on: NaiveDate,
    notes: Option<&str>,
) -> Result<()> {
    sqlx::query("INSERT INTO activities (farm_id, kind, occurred_on, notes) VALUES (?, ?, ?, ?)")
        .bind(farm_id)
        .bind(kind)
        .bind(occurred_on)
        .bind(notes)
        .execute(pool)
        .await?;

    Ok(())
}

/// Activity counts per kind since `since` (inclusive), by kind name
pub async fn count_activities_since(
    pool: &SqlitePool,
    farm_id: &str,
    since: NaiveDate,
) -> Result<Vec<ActivityCount>> {
    let rows = sqlx::query(
        r#"
        SELECT kind, COUNT(*) AS count
        FROM activities
        WHERE farm_id = ? AND occurred_on >= ?
        GROUP BY kind
        ORDER BY kind
        "#,
    )
    .bind(farm_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ActivityCount> {
            let count: i64 = row.try_get("count")?;
            Ok(ActivityCount {
                kind: row.try_get("kind")?,
                count: u32::try_from(count).unwrap_or(u32::MAX),
            })
        })
        .collect()
}
