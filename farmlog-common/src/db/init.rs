//! Database initialization
//!
//! Opens (or creates) the shared SQLite database and ensures the schema the
//! insight engine reads from exists. Schema creation is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open the database file, creating it and its parent directory if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Every connection to `sqlite::memory:` is a distinct database, hence the pool size of one.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_farms_table(pool).await?;
    create_expenses_table(pool).await?;
    create_activities_table(pool).await?;
    create_pest_predictions_table(pool).await?;
    create_task_recommendations_table(pool).await?;
    create_weather_observations_table(pool).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create_farms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS farms (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            region TEXT NOT NULL,
            crop_type TEXT,
            crop_stage TEXT,
            area_hectares REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_expenses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            farm_id TEXT NOT NULL REFERENCES farms(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 0),
            spent_on DATE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_farm_date ON expenses(farm_id, spent_on)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_activities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            farm_id TEXT NOT NULL REFERENCES farms(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            occurred_on DATE NOT NULL,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activities_farm_date ON activities(farm_id, occurred_on)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_pest_predictions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pest_predictions (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id) ON DELETE CASCADE,
            pest_type TEXT NOT NULL,
            risk_level TEXT NOT NULL,
            probability_score REAL NOT NULL,
            predicted_onset_date DATE NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_task_recommendations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_recommendations (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id) ON DELETE CASCADE,
            task_type TEXT NOT NULL,
            priority_score REAL NOT NULL,
            confidence_score REAL NOT NULL,
            reasoning TEXT NOT NULL DEFAULT '',
            weather_dependent INTEGER NOT NULL DEFAULT 0,
            expires_at TIMESTAMP,
            status TEXT NOT NULL DEFAULT 'active',
            scheduled_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_weather_observations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            region TEXT NOT NULL,
            observed_at TIMESTAMP NOT NULL,
            temperature_c REAL NOT NULL,
            humidity_pct REAL NOT NULL,
            wind_speed_kmh REAL NOT NULL,
            rainfall_mm REAL NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_weather_region_time ON weather_observations(region, observed_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
