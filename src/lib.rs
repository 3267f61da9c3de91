//! Process Group Exporter Library
//!
//! This library answers "how much CPU and memory is each logical process group
//! using on this host?". A group is the pair (process name, session root name),
//! where the session root is the top-most ancestor directly below the root
//! supervisor (`launchd` / `systemd`).
//!
//! # Usage
//!
//! ```rust
//! use process_group_exporter::{SnapshotCollector, TestDataEnumerator, TestProcess};
//!
//! let enumerator = TestDataEnumerator::from_processes(vec![
//!     TestProcess::new(1, "launchd", 0),
//!     TestProcess::new(10, "Terminal", 1).with_cpu(1.0, 0.5).with_memory(2.0),
//!     TestProcess::new(11, "bash", 10).with_cpu(0.25, 0.25).with_memory(0.5),
//! ]);
//! let collector = SnapshotCollector::new(enumerator, "launchd");
//!
//! let snapshot = collector.collect().expect("enumeration succeeds");
//! let bash = snapshot.find("bash", "Terminal").expect("bash grouped under Terminal");
//! assert_eq!(bash.totals.cpu_seconds, 0.5);
//! ```
//!
//! Each call to `collect` is an independent cycle; nothing is shared between
//! snapshots.

pub mod aggregate;
pub mod collector;
pub mod error;
pub mod health_stats;
pub mod metrics;
pub mod process;

// Re-export main types for convenience
pub use aggregate::{GroupAggregate, GroupKey, GroupTable, GroupTotals, ProcessSample};
pub use collector::{
    collect_with_timeout, CancelToken, ScanStats, Snapshot, SnapshotCollector, SnapshotSource,
};
pub use error::{CollectError, ProcessError, SampleField};
pub use health_stats::{HealthStats, LastScrape};
pub use metrics::{encode_snapshot, CPU_USAGE_METRIC, MEM_USAGE_METRIC};
pub use process::{
    resolve_group_ancestor, CpuTimes, ProcfsEnumerator, ProcessEnumerator, ProcessHandle,
    SystemEnumerator, TestDataEnumerator, TestProcess, DEFAULT_ROOT_SUPERVISOR,
};
