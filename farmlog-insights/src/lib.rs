//! farmlog-insights library interface
//!
//! The Insight Aggregation & Prioritization Engine: collects pest, task,
//! weather, financial and growth signals for a farm, normalizes them into one
//! `Insight` shape, ranks and truncates them, and dispatches insight actions.
//!
//! Data flows one way:
//! providers → adapter → normalizer → aggregator → ranking → service → api

pub mod adapter;
pub mod aggregator;
pub mod analyzers;
pub mod api;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod normalizer;
pub mod providers;
pub mod ranking;
pub mod service;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::service::InsightService;
pub use crate::types::{ActionResult, Insight, InsightType, Priority};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InsightService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub enhancement_enabled: bool,
}

impl AppState {
    pub fn new(service: Arc<InsightService>, enhancement_enabled: bool) -> Self {
        Self {
            service,
            startup_time: Utc::now(),
            enhancement_enabled,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::insight_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
