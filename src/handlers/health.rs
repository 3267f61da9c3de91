//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! scrape statistics and the outcome of the most recent scrape.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use process_group_exporter::LastScrape;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = concat!("process-group-exporter ", env!("CARGO_PKG_VERSION"));

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");
    state.health_stats.record_http_request();

    let (status, message) = match state.health_stats.last_scrape() {
        LastScrape::Never => (StatusCode::OK, "OK - No scrape yet".to_string()),
        LastScrape::Succeeded => (StatusCode::OK, "OK".to_string()),
        LastScrape::Failed(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Last scrape failed: {}", reason),
        ),
    };

    let uptime_seconds = state.health_stats.get_uptime_seconds();
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = state.health_stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}\n{FOOTER_TEXT}\n"),
    )
}
