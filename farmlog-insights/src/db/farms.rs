//! Farm records

use crate::providers::FarmContext;
use farmlog_common::Result;
use sqlx::{Row, SqlitePool};

/// Insert or replace a farm
pub async fn save_farm(pool: &SqlitePool, farm: &FarmContext) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO farms (id, user_id, name, region, crop_type, crop_stage, area_hectares)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            name = excluded.name,
            region = excluded.region,
            crop_type = excluded.crop_type,
            crop_stage = excluded.crop_stage,
            area_hectares = excluded.area_hectares
        "#,
    )
    .bind(&farm.farm_id)
    .bind(&farm.user_id)
    .bind(&farm.name)
    .bind(&farm.region)
    .bind(&farm.crop_type)
    .bind(&farm.crop_stage)
    .bind(farm.area_hectares)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_farm(pool: &SqlitePool, farm_id: &str) -> Result<Option<FarmContext>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, name, region, crop_type, crop_stage, area_hectares
        FROM farms
        WHERE id = ?
        "#,
    )
    .bind(farm_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(FarmContext {
            farm_id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            region: row.try_get("region")?,
            crop_type: row.try_get("crop_type")?,
            crop_stage: row.try_get("crop_stage")?,
            area_hectares: row.try_get("area_hectares")?,
        })),
        None => Ok(None),
    }
}
