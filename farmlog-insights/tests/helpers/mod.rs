//! Test helper utilities
//!
//! A seeded in-memory farm database and a service wired to it with a fixed
//! clock (15 April 2026, inside the calendar flowering window).
#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use farmlog_common::config::InsightSettings;
use farmlog_common::db::init_memory_database;
use farmlog_insights::aggregator::{AggregatorConfig, Collaborators, InsightAggregator};
use farmlog_insights::db::{expenses, farms, pests, tasks, weather, SqliteStore};
use farmlog_insights::providers::{
    ExpenseRecord, FarmContext, FixedClock, PestPrediction, TaskRecommendation, WeatherSnapshot,
};
use farmlog_insights::InsightService;
use std::sync::Arc;

pub const FARM_ID: &str = "farm-1";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 9, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn farm() -> FarmContext {
    FarmContext {
        farm_id: FARM_ID.to_string(),
        user_id: "user-1".to_string(),
        name: "Riverside Orchard".to_string(),
        region: "valley".to_string(),
        crop_type: Some("mango".to_string()),
        crop_stage: None,
        area_hectares: Some(8.0),
    }
}

pub fn prediction(id: &str, pest_type: &str, risk: &str, onset_in_days: i64, probability: f64) -> PestPrediction {
    PestPrediction {
        id: id.to_string(),
        pest_type: pest_type.to_string(),
        risk_level: risk.to_string(),
        probability_score: probability,
        predicted_onset_date: today() + Duration::days(onset_in_days),
    }
}

pub fn recommendation(
    id: &str,
    task_type: &str,
    priority_score: f64,
    confidence_score: f64,
    weather_dependent: bool,
) -> TaskRecommendation {
    TaskRecommendation {
        id: id.to_string(),
        task_type: task_type.to_string(),
        priority_score,
        confidence_score,
        reasoning: format!("Recommended {} based on recent field conditions", task_type),
        weather_dependent,
        expires_at: Some(now() + Duration::days(3)),
    }
}

/// Seed one farm with data from every signal source
///
/// Expected ranking with no inference service:
/// pest-p-crit, task-t1, weather-1, pest-p-high, financial-1,
/// weather-2, growth-1, task-t2, task-t3
pub async fn seeded_store() -> SqliteStore {
    let pool = init_memory_database().await.unwrap();
    farms::save_farm(&pool, &farm()).await.unwrap();

    for p in [
        prediction("p-crit", "powdery_mildew", "critical", 2, 87.0),
        prediction("p-high", "fruit_fly", "high", 12, 0.6),
        prediction("p-low", "anthracnose", "low", 1, 0.9),
    ] {
        pests::save_pest_prediction(&pool, FARM_ID, &p).await.unwrap();
    }

    for r in [
        recommendation("t1", "irrigation", 0.95, 0.8, true),
        recommendation("t2", "spray", 0.8, 0.8, false),
        recommendation("t3", "pruning", 0.75, 0.7, false),
        recommendation("t4", "weeding", 0.72, 0.9, false),
        recommendation("t5", "scouting", 0.5, 0.9, false),
    ] {
        tasks::save_task_recommendation(&pool, FARM_ID, &r).await.unwrap();
    }

    for (category, amount, days_ago) in [("fuel", 900.0, 5), ("labor", 600.0, 12), ("fuel", 1000.0, 40)] {
        let expense = ExpenseRecord {
            category: category.to_string(),
            amount,
            spent_on: today() - Duration::days(days_ago),
        };
        expenses::save_expense(&pool, FARM_ID, &expense).await.unwrap();
    }

    let snapshot = WeatherSnapshot {
        region: "valley".to_string(),
        observed_at: now() - Duration::hours(1),
        temperature_c: 36.0,
        humidity_pct: 40.0,
        wind_speed_kmh: 30.0,
        rainfall_mm: 0.0,
    };
    weather::save_observation(&pool, &snapshot).await.unwrap();

    SqliteStore::new(pool)
}

pub fn collaborators(store: &Arc<SqliteStore>) -> Collaborators {
    Collaborators {
        repository: store.clone(),
        pests: store.clone(),
        tasks: store.clone(),
        weather: store.clone(),
        inference: None,
        clock: Arc::new(FixedClock(now())),
    }
}

pub fn aggregator(store: &Arc<SqliteStore>) -> InsightAggregator {
    InsightAggregator::new(collaborators(store), AggregatorConfig::default())
}

pub fn service(store: &Arc<SqliteStore>) -> InsightService {
    InsightService::from_settings(collaborators(store), store.clone(), &InsightSettings::default())
}
