//! # Farmlog Common Library
//!
//! Shared code for the farmlog services including:
//! - Common error type
//! - Bootstrap configuration loading (TOML + environment)
//! - Logging initialization
//! - SQLite pool initialization and schema
//!
//! Row types live with the services that read them.

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
