//! HTTP API handlers for farmlog-insights

pub mod health;
pub mod insights;

pub use health::health_routes;
pub use insights::insight_routes;
