//! Process enumeration and field reads from a procfs root.
//!
//! This module scans the procfs root for numeric PID directories and reads
//! names, parent PIDs, CPU times and resident memory for each of them.

use once_cell::sync::Lazy;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::CollectError;
use crate::process::{CpuTimes, ProcessEnumerator, ProcessHandle};

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    100.0
}

/// Get the memory page size in bytes.
fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Memory page size (for resident set calculation).
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Per-enumeration data shared by all handles of one cycle.
#[derive(Debug)]
struct ProcContext {
    root: PathBuf,
    mem_total_bytes: Option<u64>,
}

/// Fields of `/proc/<pid>/stat` the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFields {
    pub ppid: u32,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Parses ppid, utime and stime from the content of a stat file.
///
/// The comm field may contain spaces and parentheses, so fields are counted
/// from the last `)`.
pub fn parse_stat(content: &str) -> io::Result<StatFields> {
    let close = content
        .rfind(')')
        .ok_or_else(|| invalid_data("Invalid stat format: missing comm field"))?;

    // rest[0] is field 3 (state), so field N lives at rest[N - 3]
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() <= 12 {
        return Err(invalid_data("Invalid stat format"));
    }

    let ppid = rest[1]
        .parse()
        .map_err(|_| invalid_data("Failed to parse ppid field"))?;
    let utime_ticks = rest[11]
        .parse()
        .map_err(|_| invalid_data("Failed to parse utime field"))?;
    let stime_ticks = rest[12]
        .parse()
        .map_err(|_| invalid_data("Failed to parse stime field"))?;

    Ok(StatFields {
        ppid,
        utime_ticks,
        stime_ticks,
    })
}

/// Parses `MemTotal` from meminfo content, in bytes.
pub fn parse_mem_total(content: &str) -> io::Result<u64> {
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("MemTotal:") {
            let kb: u64 = value
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| invalid_data("Failed to parse MemTotal"))?;
            return Ok(kb * 1024);
        }
    }
    Err(invalid_data("MemTotal not found in meminfo"))
}

/// Parses the resident page count (second field) from statm content.
pub fn parse_statm_resident_pages(content: &str) -> io::Result<u64> {
    content
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| invalid_data("Invalid statm format"))
}

/// Length at which the kernel truncates `comm` (TASK_COMM_LEN - 1).
const COMM_MAX_LEN: usize = 15;

/// Basename of the first `cmdline` argument, if any.
fn cmdline_basename(proc_path: &Path) -> Option<String> {
    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let first = content.split(|&b| b == 0u8).next()?;
    let first = std::str::from_utf8(first).ok()?;
    let name = Path::new(first).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Reads process name from comm file or extracts from cmdline.
///
/// A `comm` cut off at the kernel limit is extended with the cmdline basename
/// when that basename starts with it, so binaries sharing a long prefix keep
/// distinct names.
pub fn read_process_name(proc_path: &Path) -> io::Result<String> {
    let comm_err = match fs::read_to_string(proc_path.join("comm")) {
        Ok(s) => {
            let t = s.trim();
            if !t.is_empty() {
                if t.len() == COMM_MAX_LEN {
                    if let Some(full) = cmdline_basename(proc_path) {
                        if full.starts_with(t) {
                            return Ok(full);
                        }
                    }
                }
                return Ok(t.to_string());
            }
            invalid_data("empty comm")
        }
        Err(e) => e,
    };

    cmdline_basename(proc_path).ok_or(comm_err)
}

/// Handle to one procfs PID directory.
#[derive(Debug, Clone)]
pub struct ProcHandle {
    pid: u32,
    proc_path: PathBuf,
    ctx: Arc<ProcContext>,
}

impl ProcHandle {
    fn read_stat(&self) -> io::Result<StatFields> {
        let content = fs::read_to_string(self.proc_path.join("stat"))?;
        parse_stat(&content)
    }
}

impl ProcessHandle for ProcHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> io::Result<String> {
        read_process_name(&self.proc_path)
    }

    fn parent(&self) -> io::Result<Option<Self>> {
        let stat = self.read_stat()?;
        if stat.ppid == 0 {
            return Ok(None);
        }

        let proc_path = self.ctx.root.join(stat.ppid.to_string());
        // The parent may have exited since enumeration
        fs::metadata(&proc_path)?;

        Ok(Some(ProcHandle {
            pid: stat.ppid,
            proc_path,
            ctx: Arc::clone(&self.ctx),
        }))
    }

    fn cpu_times(&self) -> io::Result<CpuTimes> {
        let stat = self.read_stat()?;
        Ok(CpuTimes {
            user: stat.utime_ticks as f64 / *CLK_TCK,
            system: stat.stime_ticks as f64 / *CLK_TCK,
        })
    }

    fn memory_percent(&self) -> io::Result<f64> {
        let total = match self.ctx.mem_total_bytes {
            Some(v) if v > 0 => v,
            _ => return Err(io::Error::other("MemTotal unavailable")),
        };
        let content = fs::read_to_string(self.proc_path.join("statm"))?;
        let resident_bytes = parse_statm_resident_pages(&content)? * *PAGE_SIZE;
        Ok(resident_bytes as f64 / total as f64 * 100.0)
    }
}

/// Enumerates processes below a procfs root (normally `/proc`).
#[derive(Debug, Clone)]
pub struct ProcfsEnumerator {
    root: PathBuf,
}

impl ProcfsEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProcessEnumerator for ProcfsEnumerator {
    type Handle = ProcHandle;

    fn list(&self) -> Result<Vec<ProcHandle>, CollectError> {
        let entries = fs::read_dir(&self.root).map_err(CollectError::Enumeration)?;

        let mem_total_bytes = match fs::read_to_string(self.root.join("meminfo"))
            .and_then(|c| parse_mem_total(&c))
        {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    "Cannot read MemTotal from {}: {} - memory samples will fail",
                    self.root.display(),
                    e
                );
                None
            }
        };

        let ctx = Arc::new(ProcContext {
            root: self.root.clone(),
            mem_total_bytes,
        });

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let p = entry.path();
            let name = match p.file_name().and_then(|s| s.to_str()) {
                Some(v) => v,
                None => continue,
            };
            if !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            out.push(ProcHandle {
                pid,
                proc_path: p,
                ctx: Arc::clone(&ctx),
            });
        }

        debug!(
            "Enumerated {} processes under {}",
            out.len(),
            self.root.display()
        );
        Ok(out)
    }
}
