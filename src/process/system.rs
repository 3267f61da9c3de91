//! Process enumeration through the `sysinfo` crate.
//!
//! Used on hosts without procfs (macOS in particular). One enumeration takes a
//! single refresh of the process list and serves every read of the cycle from
//! that table, so a process that exited before the refresh simply is not there.

use ahash::AHashMap as HashMap;
use std::io;
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, ThreadKind};
use tracing::debug;

use crate::error::CollectError;
use crate::process::{CpuTimes, ProcessEnumerator, ProcessHandle};

#[derive(Debug, Clone)]
struct SystemProcess {
    name: String,
    ppid: Option<u32>,
    /// Accumulated user + system time in milliseconds.
    cpu_ms: u64,
    memory_bytes: u64,
}

#[derive(Debug, Default)]
struct SystemTable {
    by_pid: HashMap<u32, SystemProcess>,
    total_memory: u64,
}

impl SystemTable {
    fn get(&self, pid: u32) -> io::Result<&SystemProcess> {
        self.by_pid.get(&pid).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("process {} exited", pid))
        })
    }
}

/// Handle into one refreshed `sysinfo` process table.
#[derive(Debug, Clone)]
pub struct SystemHandle {
    pid: u32,
    table: Arc<SystemTable>,
}

impl ProcessHandle for SystemHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> io::Result<String> {
        let p = self.table.get(self.pid)?;
        if p.name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "empty process name"));
        }
        Ok(p.name.clone())
    }

    fn parent(&self) -> io::Result<Option<Self>> {
        match self.table.get(self.pid)?.ppid {
            None | Some(0) => Ok(None),
            Some(ppid) => {
                self.table.get(ppid)?;
                Ok(Some(SystemHandle {
                    pid: ppid,
                    table: Arc::clone(&self.table),
                }))
            }
        }
    }

    /// sysinfo only reports the combined time, which is accounted as user time.
    fn cpu_times(&self) -> io::Result<CpuTimes> {
        let p = self.table.get(self.pid)?;
        Ok(CpuTimes {
            user: p.cpu_ms as f64 / 1000.0,
            system: 0.0,
        })
    }

    fn memory_percent(&self) -> io::Result<f64> {
        let p = self.table.get(self.pid)?;
        if self.table.total_memory == 0 {
            return Err(io::Error::other("total memory unavailable"));
        }
        Ok(p.memory_bytes as f64 / self.table.total_memory as f64 * 100.0)
    }
}

/// Enumerates processes with a fresh `sysinfo::System` per cycle.
#[derive(Debug, Default, Clone)]
pub struct SystemEnumerator;

impl SystemEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessEnumerator for SystemEnumerator {
    type Handle = SystemHandle;

    fn list(&self) -> Result<Vec<SystemHandle>, CollectError> {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let by_pid: HashMap<u32, SystemProcess> = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind() != Some(ThreadKind::Userland))
            .map(|p| {
                (
                    p.pid().as_u32(),
                    SystemProcess {
                        name: p.name().to_string_lossy().into_owned(),
                        ppid: p.parent().map(|pp| pp.as_u32()),
                        cpu_ms: p.accumulated_cpu_time(),
                        memory_bytes: p.memory(),
                    },
                )
            })
            .collect();

        if by_pid.is_empty() {
            return Err(CollectError::Enumeration(io::Error::other(
                "process table is empty",
            )));
        }

        let table = Arc::new(SystemTable {
            by_pid,
            total_memory: sys.total_memory(),
        });

        let mut pids: Vec<u32> = table.by_pid.keys().copied().filter(|&pid| pid != 0).collect();
        pids.sort_unstable();
        debug!("Enumerated {} processes via sysinfo", pids.len());

        Ok(pids
            .into_iter()
            .map(|pid| SystemHandle {
                pid,
                table: Arc::clone(&table),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<SystemTable> {
        let mut by_pid = HashMap::new();
        for (pid, name, ppid, cpu_ms, memory_bytes) in [
            (1, "launchd", Some(0), 90_000, 1024),
            (300, "Terminal", Some(1), 1_500, 4096),
            (301, "", Some(300), 10, 0),
            (302, "zsh", Some(999), 10, 0),
        ] {
            by_pid.insert(
                pid,
                SystemProcess {
                    name: name.to_string(),
                    ppid,
                    cpu_ms,
                    memory_bytes,
                },
            );
        }
        Arc::new(SystemTable {
            by_pid,
            total_memory: 16 * 1024,
        })
    }

    fn handle(pid: u32) -> SystemHandle {
        SystemHandle { pid, table: table() }
    }

    #[test]
    fn test_reads_from_table() {
        let h = handle(300);
        assert_eq!(h.name().unwrap(), "Terminal");
        assert_eq!(h.cpu_times().unwrap().total(), 1.5);
        assert_eq!(h.memory_percent().unwrap(), 25.0);
        assert_eq!(h.parent().unwrap().unwrap().pid(), 1);
    }

    #[test]
    fn test_ppid_zero_means_no_parent() {
        assert!(handle(1).parent().unwrap().is_none());
    }

    #[test]
    fn test_missing_entries_are_read_failures() {
        assert!(handle(301).name().is_err());
        assert!(handle(302).parent().is_err());
        assert_eq!(
            handle(42).cpu_times().unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_lists_current_process() {
        let handles = SystemEnumerator::new().list().unwrap();
        let me = handles
            .iter()
            .find(|h| h.pid() == std::process::id())
            .expect("own process listed");

        assert!(!me.name().unwrap().is_empty());
        assert!(me.cpu_times().is_ok());
        let mem = me.memory_percent().unwrap();
        assert!((0.0..=100.0).contains(&mem));
    }
}
