//! Process access layer for the collection engine.
//!
//! This module provides:
//! - `ProcessHandle` / `ProcessEnumerator`: the seam between the engine and the OS
//! - `procfs`: enumeration and field reads from a procfs root
//! - `system`: enumeration through `sysinfo` on hosts without procfs
//! - `testdata`: synthetic process tables loaded from JSON
//! - `ancestry`: session root resolution via the parent chain

pub mod ancestry;
pub mod procfs;
pub mod system;
pub mod testdata;

use std::io;

use crate::error::CollectError;

// Re-export commonly used types
pub use ancestry::{resolve_group_ancestor, DEFAULT_ROOT_SUPERVISOR, MAX_ANCESTOR_DEPTH};
pub use procfs::{ProcHandle, ProcfsEnumerator, CLK_TCK, PAGE_SIZE};
pub use system::{SystemEnumerator, SystemHandle};
pub use testdata::{TestData, TestDataEnumerator, TestHandle, TestProcess};

/// Accumulated CPU time of a process, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
}

impl CpuTimes {
    pub fn total(&self) -> f64 {
        self.user + self.system
    }
}

/// A live process as seen by the engine.
///
/// Every accessor performs its own read and may fail independently; processes
/// routinely exit between enumeration and sampling.
pub trait ProcessHandle: Sized + Send + Sync {
    fn pid(&self) -> u32;

    fn name(&self) -> io::Result<String>;

    /// Returns `Ok(None)` when the process is the root of the whole tree.
    fn parent(&self) -> io::Result<Option<Self>>;

    fn cpu_times(&self) -> io::Result<CpuTimes>;

    /// Resident memory as a percentage of total system memory.
    fn memory_percent(&self) -> io::Result<f64>;
}

/// Lists every process visible to the caller.
pub trait ProcessEnumerator: Send + Sync {
    type Handle: ProcessHandle;

    fn list(&self) -> Result<Vec<Self::Handle>, CollectError>;
}
