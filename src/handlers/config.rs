//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the current exporter configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");
    state.health_stats.record_http_request();

    let cfg = &state.config;
    let mut out = String::new();

    writeln!(out, "PROCESS GROUP EXPORTER - CONFIGURATION").ok();
    writeln!(out, "======================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                       {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                       {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "COLLECTION").ok();
    writeln!(out, "----------").ok();
    writeln!(out, "root_supervisor:            {}", cfg.root_supervisor()).ok();
    writeln!(
        out,
        "collect_timeout:            {} seconds",
        state.collect_timeout.as_secs()
    )
    .ok();
    writeln!(
        out,
        "parallelism:                {}",
        cfg.parallelism
            .filter(|&n| n > 0)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "auto".into())
    )
    .ok();
    match &cfg.test_data_file {
        Some(path) => writeln!(out, "source:                     test data ({})", path.display()).ok(),
        None => writeln!(out, "source:                     procfs ({})", cfg.proc_root().display()).ok(),
    };
    writeln!(out).ok();

    writeln!(out, "FEATURE FLAGS").ok();
    writeln!(out, "-------------").ok();
    writeln!(
        out,
        "enable_health:              {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "enable_telemetry:           {}",
        cfg.enable_telemetry.unwrap_or(true)
    )
    .ok();
    writeln!(out).ok();
    writeln!(out, "{}", FOOTER_TEXT).ok();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}
