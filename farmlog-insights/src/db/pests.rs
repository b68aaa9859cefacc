//! Pest/disease predictions

use crate::providers::PestPrediction;
use farmlog_common::Result;
use sqlx::{Row, SqlitePool};

pub async fn save_pest_prediction(
    pool: &SqlitePool,
    farm_id: &str,
    prediction: &PestPrediction,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pest_predictions (
            id, farm_id, pest_type, risk_level, probability_score, predicted_onset_date
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            pest_type = excluded.pest_type,
            risk_level = excluded.risk_level,
            probability_score = excluded.probability_score,
            predicted_onset_date = excluded.predicted_onset_date
        "#,
    )
    .bind(&prediction.id)
    .bind(farm_id)
    .bind(&prediction.pest_type)
    .bind(&prediction.risk_level)
    .bind(prediction.probability_score)
    .bind(prediction.predicted_onset_date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Active predictions, earliest onset first
pub async fn load_active_predictions(pool: &SqlitePool, farm_id: &str) -> Result<Vec<PestPrediction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, pest_type, risk_level, probability_score, predicted_onset_date
        FROM pest_predictions
        WHERE farm_id = ? AND status = 'active'
        ORDER BY predicted_onset_date, id
        "#,
    )
    .bind(farm_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<PestPrediction> {
            Ok(PestPrediction {
                id: row.try_get("id")?,
                pest_type: row.try_get("pest_type")?,
                risk_level: row.try_get("risk_level")?,
                probability_score: row.try_get("probability_score")?,
                predicted_onset_date: row.try_get("predicted_onset_date")?,
            })
        })
        .collect()
}
