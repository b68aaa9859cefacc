//! Database initialization tests
//!
//! Covers automatic creation of the database file and idempotent schema setup.

use farmlog_common::db::init::{create_schema, init_database, init_memory_database};
use sqlx::Row;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("farmlog.db");

    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("farmlog.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let pool = init_memory_database().await.unwrap();

    // Second pass must not fail on existing tables
    create_schema(&pool).await.unwrap();

    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(&pool)
        .await
        .unwrap();
    let tables: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();

    for expected in [
        "activities",
        "expenses",
        "farms",
        "pest_predictions",
        "task_recommendations",
        "weather_observations",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_expense_amount_must_be_non_negative() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO farms (id, user_id, name, region) VALUES ('f1', 'u1', 'North', 'valley')")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO expenses (farm_id, category, amount, spent_on) VALUES ('f1', 'fuel', -5.0, '2026-01-01')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "negative amount should violate CHECK constraint");
}
