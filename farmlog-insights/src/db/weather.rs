//! Recorded weather observations

use crate::providers::WeatherSnapshot;
use farmlog_common::Result;
use sqlx::{Row, SqlitePool};

pub async fn save_observation(pool: &SqlitePool, snapshot: &WeatherSnapshot) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO weather_observations (
            region, observed_at, temperature_c, humidity_pct, wind_speed_kmh, rainfall_mm
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&snapshot.region)
    .bind(snapshot.observed_at)
    .bind(snapshot.temperature_c)
    .bind(snapshot.humidity_pct)
    .bind(snapshot.wind_speed_kmh)
    .bind(snapshot.rainfall_mm)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent observation for a region
pub async fn load_latest_observation(pool: &SqlitePool, region: &str) -> Result<Option<WeatherSnapshot>> {
    let row = sqlx::query(
        r#"
        SELECT region, observed_at, temperature_c, humidity_pct, wind_speed_kmh, rainfall_mm
        FROM weather_observations
        WHERE region = ?
        ORDER BY observed_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(region)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(WeatherSnapshot {
            region: row.try_get("region")?,
            observed_at: row.try_get("observed_at")?,
            temperature_c: row.try_get("temperature_c")?,
            humidity_pct: row.try_get("humidity_pct")?,
            wind_speed_kmh: row.try_get("wind_speed_kmh")?,
            rainfall_mm: row.try_get("rainfall_mm")?,
        })),
        None => Ok(None),
    }
}
