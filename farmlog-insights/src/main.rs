//! farmlog-insights - Insight service
//!
//! Serves ranked farm insights over HTTP from the shared farmlog database.
//! The enhancement tier is active only when an inference service URL is
//! configured; weather comes from a remote service when configured, else from
//! recorded observations.

use anyhow::{Context, Result};
use clap::Parser;
use farmlog_common::config::{resolve_config_path, TomlConfig};
use farmlog_insights::aggregator::Collaborators;
use farmlog_insights::db::SqliteStore;
use farmlog_insights::providers::{
    HttpInferenceClient, HttpWeatherClient, InferenceService, SystemClock, WeatherProvider,
};
use farmlog_insights::{AppState, InsightService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "farmlog-insights")]
#[command(about = "Farm insight aggregation service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "FARMLOG_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database path (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let (mut config, config_source) =
        TomlConfig::load_with_source(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    farmlog_common::logging::init(&config.logging).context("Failed to initialize logging")?;

    info!("Starting farmlog-insights v{}", env!("CARGO_PKG_VERSION"));
    if config_source.is_defaults() {
        warn!("{}", config_source);
    } else {
        info!("{}", config_source);
    }
    info!("Database: {}", config.database_path.display());

    farmlog_insights::config::validate(&config.insights).context("Invalid [insights] settings")?;
    let inference_config = farmlog_insights::config::check_inference(&config.inference);

    let pool = farmlog_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteStore::new(pool));

    let inference: Option<Arc<dyn InferenceService>> = HttpInferenceClient::from_config(&inference_config)
        .context("Invalid inference configuration")?
        .map(|client| {
            info!("Enhancement tier enabled: {}", client.endpoint());
            Arc::new(client) as Arc<dyn InferenceService>
        });
    if inference.is_none() {
        info!("No inference service configured, basic analyzers only");
    }

    let weather: Arc<dyn WeatherProvider> = match HttpWeatherClient::from_config(&config.weather)
        .context("Invalid weather configuration")?
    {
        Some(client) => Arc::new(client),
        None => {
            info!("No weather service configured, using recorded observations");
            store.clone()
        }
    };

    let enhancement_enabled = inference.is_some();
    let collaborators = Collaborators {
        repository: store.clone(),
        pests: store.clone(),
        tasks: store.clone(),
        weather,
        inference,
        clock: Arc::new(SystemClock),
    };
    let service = InsightService::from_settings(collaborators, store, &config.insights);

    let state = AppState::new(Arc::new(service), enhancement_enabled);
    let app = farmlog_insights::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
