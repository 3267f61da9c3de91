//! Collection cycle orchestration.
//!
//! One cycle enumerates the host, resolves and samples every process on the
//! rayon pool, and merges the per-worker group tables into a `Snapshot`.
//! Per-process failures are logged and counted; only enumeration failures,
//! timeouts and worker panics fail the cycle.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::aggregate::{GroupAggregate, GroupTable};
use crate::error::{CollectError, ProcessError, SampleField};
use crate::process::{resolve_group_ancestor, ProcessEnumerator, ProcessHandle};

/// Diagnostic counters of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Processes returned by the enumerator.
    pub enumerated: u64,
    /// Processes that made it into a group.
    pub aggregated: u64,
    pub name_errors: u64,
    pub ancestor_errors: u64,
    pub cpu_errors: u64,
    pub memory_errors: u64,
}

impl ScanStats {
    fn record(&mut self, err: &ProcessError) {
        match err {
            ProcessError::Name { .. } => self.name_errors += 1,
            ProcessError::AncestorLookup { .. } => self.ancestor_errors += 1,
            ProcessError::Sample {
                field: SampleField::CpuTimes,
                ..
            } => self.cpu_errors += 1,
            ProcessError::Sample {
                field: SampleField::MemoryPercent,
                ..
            } => self.memory_errors += 1,
        }
    }

    fn merge(self, other: ScanStats) -> ScanStats {
        ScanStats {
            enumerated: self.enumerated + other.enumerated,
            aggregated: self.aggregated + other.aggregated,
            name_errors: self.name_errors + other.name_errors,
            ancestor_errors: self.ancestor_errors + other.ancestor_errors,
            cpu_errors: self.cpu_errors + other.cpu_errors,
            memory_errors: self.memory_errors + other.memory_errors,
        }
    }

    /// Processes dropped entirely (name or ancestor failure).
    pub fn skipped(&self) -> u64 {
        self.name_errors + self.ancestor_errors
    }
}

/// Immutable result of one collection cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    groups: Vec<GroupAggregate>,
    stats: ScanStats,
    duration: Duration,
}

impl Snapshot {
    /// Groups sorted by key.
    pub fn groups(&self) -> &[GroupAggregate] {
        &self.groups
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn find(&self, name: &str, parent: &str) -> Option<&GroupAggregate> {
        self.groups
            .iter()
            .find(|g| g.key.name == name && g.key.parent == parent)
    }
}

/// Shared cancellation flag of one cycle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Object-safe view of a collector, injected into the HTTP layer.
pub trait SnapshotSource: Send + Sync {
    fn collect_snapshot(&self, cancel: &CancelToken) -> Result<Snapshot, CollectError>;
}

/// Runs collection cycles against one enumerator.
pub struct SnapshotCollector<E> {
    enumerator: E,
    supervisor: String,
}

impl<E: ProcessEnumerator> SnapshotCollector<E> {
    /// `supervisor` is the root supervisor name at which ancestor walks stop.
    pub fn new(enumerator: E, supervisor: impl Into<String>) -> Self {
        Self {
            enumerator,
            supervisor: supervisor.into(),
        }
    }

    /// Runs one full collection cycle.
    pub fn collect(&self) -> Result<Snapshot, CollectError> {
        self.collect_cancellable(&CancelToken::default())
    }

    /// Runs one cycle, stopping early once `cancel` is set.
    #[instrument(skip(self, cancel))]
    pub fn collect_cancellable(&self, cancel: &CancelToken) -> Result<Snapshot, CollectError> {
        let start = Instant::now();

        let handles = self.enumerator.list()?;
        debug!("Collected {} process handles", handles.len());

        let empty = || (GroupTable::new(), ScanStats::default());
        let (table, mut stats) = handles
            .par_iter()
            .fold(empty, |(mut table, mut stats), handle| {
                if !cancel.is_cancelled() {
                    self.scan_process(handle, &mut table, &mut stats);
                }
                (table, stats)
            })
            .reduce(empty, |(a, sa), (b, sb)| (a.merge(b), sa.merge(sb)));

        if cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }

        stats.enumerated = handles.len() as u64;
        let groups = table.into_groups();
        let duration = start.elapsed();

        debug!(
            "Collection cycle done: {} processes, {} groups, {} skipped, {} cpu errors, {} memory errors in {:.2}ms",
            stats.enumerated,
            groups.len(),
            stats.skipped(),
            stats.cpu_errors,
            stats.memory_errors,
            duration.as_secs_f64() * 1000.0
        );

        Ok(Snapshot {
            groups,
            stats,
            duration,
        })
    }

    fn scan_process(&self, handle: &E::Handle, table: &mut GroupTable, stats: &mut ScanStats) {
        let pid = handle.pid();

        let name = match handle.name() {
            Ok(name) => name,
            Err(source) => {
                let err = ProcessError::Name { pid, source };
                debug!("Skipping process: {}", err);
                stats.record(&err);
                return;
            }
        };

        let ancestor = match resolve_group_ancestor(&name, handle, &self.supervisor) {
            Ok(ancestor) => ancestor,
            Err(err) => {
                debug!("Skipping process {}: {}", name, err);
                stats.record(&err);
                return;
            }
        };

        for err in table.accumulate(name, ancestor, handle) {
            debug!("Partial sample: {}", err);
            stats.record(&err);
        }
        stats.aggregated += 1;
    }
}

impl<E: ProcessEnumerator> SnapshotSource for SnapshotCollector<E> {
    fn collect_snapshot(&self, cancel: &CancelToken) -> Result<Snapshot, CollectError> {
        self.collect_cancellable(cancel)
    }
}

/// Runs one cycle on the blocking pool, bounded by `timeout`.
///
/// On timeout the cycle is cancelled and `CollectError::Timeout` is returned;
/// workers finish the process they are on and then stop.
pub async fn collect_with_timeout(
    source: Arc<dyn SnapshotSource>,
    timeout: Duration,
) -> Result<Snapshot, CollectError> {
    let cancel = CancelToken::default();
    let worker_cancel = cancel.clone();
    let task = tokio::task::spawn_blocking(move || source.collect_snapshot(&worker_cancel));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(CollectError::Worker(join_err.to_string())),
        Err(_) => {
            cancel.cancel();
            warn!("Collection cycle exceeded {:?}, cancelled", timeout);
            Err(CollectError::Timeout(timeout))
        }
    }
}
