//! Synthetic process tables for demos and tests.
//!
//! A test data file replaces the procfs scan with a JSON process table. Any
//! field left out (or set to `null`) makes the corresponding read fail, which
//! is how per-process failures are simulated.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CollectError;
use crate::process::{CpuTimes, ProcessEnumerator, ProcessHandle};

/// One synthetic process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestProcess {
    pub pid: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// `None` or `0` means the process has no parent.
    #[serde(default)]
    pub ppid: Option<u32>,
    #[serde(default)]
    pub user_seconds: Option<f64>,
    #[serde(default)]
    pub system_seconds: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
}

impl TestProcess {
    pub fn new(pid: u32, name: &str, ppid: u32) -> Self {
        Self {
            pid,
            name: Some(name.to_string()),
            ppid: Some(ppid),
            user_seconds: None,
            system_seconds: None,
            memory_percent: None,
        }
    }

    pub fn with_cpu(mut self, user_seconds: f64, system_seconds: f64) -> Self {
        self.user_seconds = Some(user_seconds);
        self.system_seconds = Some(system_seconds);
        self
    }

    pub fn with_memory(mut self, memory_percent: f64) -> Self {
        self.memory_percent = Some(memory_percent);
        self
    }

    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }
}

/// Root document of a test data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestData {
    #[serde(default)]
    pub version: String,
    pub processes: Vec<TestProcess>,
}

/// Loads test data from a JSON file.
pub fn load_test_data_from_file(path: &Path) -> io::Result<TestData> {
    debug!("Loading test data from: {}", path.display());

    let content = fs::read_to_string(path)?;
    let test_data: TestData = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    info!(
        "Loaded {} test processes from {}",
        test_data.processes.len(),
        path.display()
    );
    Ok(test_data)
}

#[derive(Debug)]
struct TestTable {
    order: Vec<u32>,
    by_pid: HashMap<u32, TestProcess>,
}

impl TestTable {
    fn new(processes: Vec<TestProcess>) -> Self {
        let order = processes.iter().map(|p| p.pid).collect();
        let by_pid = processes.into_iter().map(|p| (p.pid, p)).collect();
        Self { order, by_pid }
    }

    fn get(&self, pid: u32) -> io::Result<&TestProcess> {
        self.by_pid.get(&pid).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("pid {} not in table", pid))
        })
    }
}

/// Handle into a synthetic process table.
#[derive(Debug, Clone)]
pub struct TestHandle {
    pid: u32,
    table: Arc<TestTable>,
}

fn missing(field: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not available", field))
}

/// Rejects values no real process can report (negative, NaN or infinite).
fn checked(field: &str, value: f64) -> io::Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid {}: {}", field, value),
        ))
    }
}

impl ProcessHandle for TestHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> io::Result<String> {
        self.table
            .get(self.pid)?
            .name
            .clone()
            .ok_or_else(|| missing("name"))
    }

    fn parent(&self) -> io::Result<Option<Self>> {
        match self.table.get(self.pid)?.ppid {
            None | Some(0) => Ok(None),
            Some(ppid) => {
                self.table.get(ppid)?;
                Ok(Some(TestHandle {
                    pid: ppid,
                    table: Arc::clone(&self.table),
                }))
            }
        }
    }

    fn cpu_times(&self) -> io::Result<CpuTimes> {
        let p = self.table.get(self.pid)?;
        match (p.user_seconds, p.system_seconds) {
            (Some(user), Some(system)) => Ok(CpuTimes {
                user: checked("user_seconds", user)?,
                system: checked("system_seconds", system)?,
            }),
            _ => Err(missing("cpu times")),
        }
    }

    fn memory_percent(&self) -> io::Result<f64> {
        let value = self
            .table
            .get(self.pid)?
            .memory_percent
            .ok_or_else(|| missing("memory percent"))?;
        checked("memory_percent", value)
    }
}

#[derive(Debug)]
enum Origin {
    File(PathBuf),
    Inline(Arc<TestTable>),
}

/// Enumerator serving a synthetic process table.
///
/// File-backed enumerators re-read the file on every cycle, so a missing or
/// malformed file is an enumeration failure of that cycle.
#[derive(Debug)]
pub struct TestDataEnumerator {
    origin: Origin,
}

impl TestDataEnumerator {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
        }
    }

    pub fn from_processes(processes: Vec<TestProcess>) -> Self {
        Self {
            origin: Origin::Inline(Arc::new(TestTable::new(processes))),
        }
    }
}

impl ProcessEnumerator for TestDataEnumerator {
    type Handle = TestHandle;

    fn list(&self) -> Result<Vec<TestHandle>, CollectError> {
        let table = match &self.origin {
            Origin::File(path) => {
                let data = load_test_data_from_file(path).map_err(CollectError::Enumeration)?;
                Arc::new(TestTable::new(data.processes))
            }
            Origin::Inline(table) => Arc::clone(table),
        };

        Ok(table
            .order
            .iter()
            .map(|&pid| TestHandle {
                pid,
                table: Arc::clone(&table),
            })
            .collect())
    }
}
