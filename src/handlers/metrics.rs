//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs one full collection cycle and encodes the resulting
//! snapshot. A failed cycle returns 503 without any group metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use process_group_exporter::{collect_with_timeout, encode_snapshot, CollectError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    Collection(CollectError),
    EncodingFailed(String),
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MetricsError::Collection(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Collection failed: {}\n", e),
            )
                .into_response(),
            MetricsError::EncodingFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}\n", msg),
            )
                .into_response(),
        }
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    let snapshot = match collect_with_timeout(Arc::clone(&state.collector), state.collect_timeout).await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Scrape failed: {}", e);
            state
                .health_stats
                .record_failure(&e.to_string(), matches!(e, CollectError::Timeout(_)));
            return Err(MetricsError::Collection(e));
        }
    };
    state.health_stats.record_success(&snapshot);

    let telemetry = state.config.enable_telemetry.unwrap_or(true);
    let body = encode_snapshot(&snapshot, telemetry).map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        MetricsError::EncodingFailed(e.to_string())
    })?;

    debug!(
        "Served {} groups ({} bytes) in {:.2}ms",
        snapshot.groups().len(),
        body.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
