//! SQLite-backed collaborators
//!
//! `SqliteStore` serves farm context, expense and activity history, pest
//! predictions, task recommendations and recorded weather from the shared
//! farmlog database. The insight engine only reads; the single write is
//! marking a task recommendation as scheduled.

pub mod activities;
pub mod expenses;
pub mod farms;
pub mod pests;
pub mod tasks;
pub mod weather;

use crate::providers::{
    ActivityCount, ExpenseRecord, FarmContext, FarmRepository, PestPrediction, PestProvider,
    ProviderError, TaskProvider, TaskRecommendation, TaskScheduler, WeatherProvider, WeatherSnapshot,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

impl From<farmlog_common::Error> for ProviderError {
    fn from(err: farmlog_common::Error) -> Self {
        match err {
            farmlog_common::Error::NotFound(what) => ProviderError::NotFound(what),
            other => ProviderError::Storage(other.to_string()),
        }
    }
}

/// Store over a shared SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl FarmRepository for SqliteStore {
    async fn get_farm(&self, farm_id: &str) -> Result<Option<FarmContext>, ProviderError> {
        Ok(farms::load_farm(&self.pool, farm_id).await?)
    }

    async fn expenses_between(
        &self,
        farm_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, ProviderError> {
        Ok(expenses::load_expenses_between(&self.pool, farm_id, from, to).await?)
    }

    async fn activity_counts_since(
        &self,
        farm_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<ActivityCount>, ProviderError> {
        Ok(activities::count_activities_since(&self.pool, farm_id, since).await?)
    }
}

#[async_trait]
impl PestProvider for SqliteStore {
    async fn active_predictions(&self, farm_id: &str) -> Result<Vec<PestPrediction>, ProviderError> {
        Ok(pests::load_active_predictions(&self.pool, farm_id).await?)
    }
}

#[async_trait]
impl TaskProvider for SqliteStore {
    async fn active_recommendations(
        &self,
        farm_id: &str,
    ) -> Result<Vec<TaskRecommendation>, ProviderError> {
        Ok(tasks::load_active_recommendations(&self.pool, farm_id).await?)
    }
}

/// Latest recorded observation; used when no remote weather service is configured
#[async_trait]
impl WeatherProvider for SqliteStore {
    async fn current_weather(&self, region: &str) -> Result<WeatherSnapshot, ProviderError> {
        weather::load_latest_observation(&self.pool, region)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("weather observation for region {}", region)))
    }
}

#[async_trait]
impl TaskScheduler for SqliteStore {
    async fn schedule_task(&self, recommendation_id: &str) -> Result<(), ProviderError> {
        Ok(tasks::mark_scheduled(&self.pool, recommendation_id, Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use farmlog_common::db::init_memory_database;

    async fn store() -> SqliteStore {
        let store = SqliteStore::new(init_memory_database().await.unwrap());
        farms::save_farm(
            store.pool(),
            &FarmContext {
                farm_id: "farm-1".to_string(),
                user_id: "user-1".to_string(),
                name: "North Block".to_string(),
                region: "valley".to_string(),
                crop_type: Some("mango".to_string()),
                crop_stage: Some("flowering".to_string()),
                area_hectares: Some(12.0),
            },
        )
        .await
        .unwrap();
        store
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_farm_round_trip() {
        let store = store().await;
        let farm = store.get_farm("farm-1").await.unwrap().unwrap();
        assert_eq!(farm.region, "valley");
        assert_eq!(farm.crop_stage.as_deref(), Some("flowering"));
        assert!(store.get_farm("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expense_window_is_half_open() {
        let store = store().await;
        for (day, amount) in [(1, 10.0), (15, 20.0), (31, 40.0)] {
            let expense = ExpenseRecord {
                category: "fuel".to_string(),
                amount,
                spent_on: date(2026, 3, day),
            };
            expenses::save_expense(store.pool(), "farm-1", &expense).await.unwrap();
        }

        let window = store
            .expenses_between("farm-1", date(2026, 3, 1), date(2026, 3, 31))
            .await
            .unwrap();
        let amounts: Vec<f64> = window.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0]);
    }

    #[tokio::test]
    async fn test_activity_counts_grouped_by_kind() {
        let store = store().await;
        for (kind, day) in [("spray", 2), ("irrigation", 3), ("spray", 4), ("spray", 20)] {
            activities::save_activity(store.pool(), "farm-1", kind, date(2026, 3, day), None)
                .await
                .unwrap();
        }

        let counts = store.activity_counts_since("farm-1", date(2026, 3, 3)).await.unwrap();
        assert_eq!(
            counts,
            vec![
                ActivityCount { kind: "irrigation".to_string(), count: 1 },
                ActivityCount { kind: "spray".to_string(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_recommendations_ordered_by_priority() {
        let store = store().await;
        for (id, score) in [("low", 0.4), ("top", 0.95), ("mid", 0.8)] {
            let recommendation = TaskRecommendation {
                id: id.to_string(),
                task_type: "spray".to_string(),
                priority_score: score,
                confidence_score: 0.7,
                reasoning: String::new(),
                weather_dependent: true,
                expires_at: Some(Utc::now() + Duration::days(2)),
            };
            tasks::save_task_recommendation(store.pool(), "farm-1", &recommendation)
                .await
                .unwrap();
        }

        let loaded = store.active_recommendations("farm-1").await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "mid", "low"]);
        assert!(loaded[0].weather_dependent);
        assert!(loaded[0].expires_at.is_some());
    }

    #[tokio::test]
    async fn test_schedule_task_once() {
        let store = store().await;
        let recommendation = TaskRecommendation {
            id: "r1".to_string(),
            task_type: "harvest".to_string(),
            priority_score: 0.9,
            confidence_score: 0.9,
            reasoning: "Fruit at maturity".to_string(),
            weather_dependent: false,
            expires_at: None,
        };
        tasks::save_task_recommendation(store.pool(), "farm-1", &recommendation)
            .await
            .unwrap();

        store.schedule_task("r1").await.unwrap();
        assert_eq!(
            tasks::load_status(store.pool(), "r1").await.unwrap().as_deref(),
            Some("scheduled")
        );
        assert!(store.active_recommendations("farm-1").await.unwrap().is_empty());

        // Already scheduled
        let err = store.schedule_task("r1").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_weather_observation() {
        let store = store().await;
        let now = Utc::now();
        for (hours_ago, temperature_c) in [(5, 20.0), (1, 31.0)] {
            let snapshot = WeatherSnapshot {
                region: "valley".to_string(),
                observed_at: now - Duration::hours(hours_ago),
                temperature_c,
                humidity_pct: 50.0,
                wind_speed_kmh: 10.0,
                rainfall_mm: 0.0,
            };
            weather::save_observation(store.pool(), &snapshot).await.unwrap();
        }

        let latest = store.current_weather("valley").await.unwrap();
        assert_eq!(latest.temperature_c, 31.0);

        let err = store.current_weather("coast").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
