//! Application state management for the exporter.
//!
//! This module defines the shared application state passed to the HTTP
//! handlers. The collector is built once at startup and injected here; no
//! metrics source is registered globally.

use process_group_exporter::{
    HealthStats, ProcfsEnumerator, SnapshotCollector, SnapshotSource, SystemEnumerator,
    TestDataEnumerator,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Builds the collector for the configured process source.
///
/// Linux hosts are scanned through procfs; every other platform goes through
/// `sysinfo`.
pub fn build_collector(cfg: &Config) -> Arc<dyn SnapshotSource> {
    let supervisor = cfg.root_supervisor().to_string();
    match &cfg.test_data_file {
        Some(path) => {
            info!("Using test data from file: {}", path.display());
            Arc::new(SnapshotCollector::new(
                TestDataEnumerator::from_file(path),
                supervisor,
            ))
        }
        None if cfg!(target_os = "linux") => {
            info!("Scanning processes under {}", cfg.proc_root().display());
            Arc::new(SnapshotCollector::new(
                ProcfsEnumerator::new(cfg.proc_root()),
                supervisor,
            ))
        }
        None => {
            info!("Reading the process table through sysinfo");
            Arc::new(SnapshotCollector::new(SystemEnumerator::new(), supervisor))
        }
    }
}

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Application state shared across requests.
pub struct AppState {
    /// Source of one snapshot per scrape.
    pub collector: Arc<dyn SnapshotSource>,
    pub collect_timeout: Duration,
    pub config: Arc<Config>,
    /// Scrape statistics, also the source of the uptime shown on `/` and `/health`.
    pub health_stats: Arc<HealthStats>,
}
