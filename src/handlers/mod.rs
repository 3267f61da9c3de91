//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/metrics`: Prometheus metrics endpoint (one collection cycle per request)
//! - `/health`: Scrape statistics endpoint
//! - `/config`: Configuration display endpoint
//! - `/`: Landing page

pub mod config;
pub mod health;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use config::config_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;
