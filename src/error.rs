//! Error types for the collection engine.
//!
//! `CollectError` aborts a whole collection cycle. `ProcessError` covers a
//! single process (or a single field of it) and is only ever logged and
//! counted by the collector.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Whole-cycle failure. No snapshot is produced.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("process enumeration failed: {0}")]
    Enumeration(#[source] io::Error),

    #[error("collection cycle exceeded timeout of {0:?}")]
    Timeout(Duration),

    #[error("collection cycle was cancelled")]
    Cancelled,

    #[error("collection worker failed: {0}")]
    Worker(String),
}

/// Sampled field of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    CpuTimes,
    MemoryPercent,
}

impl fmt::Display for SampleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleField::CpuTimes => f.write_str("cpu times"),
            SampleField::MemoryPercent => f.write_str("memory percent"),
        }
    }
}

/// Per-process read failure. The process (or just the field) is skipped.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("pid {pid}: cannot read process name: {source}")]
    Name {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("pid {pid}: ancestor lookup failed: {source}")]
    AncestorLookup {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("pid {pid}: cannot sample {field}: {source}")]
    Sample {
        pid: u32,
        field: SampleField,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Label value used for the `kind` label of the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Name { .. } => "name",
            ProcessError::AncestorLookup { .. } => "ancestor",
            ProcessError::Sample {
                field: SampleField::CpuTimes,
                ..
            } => "cpu",
            ProcessError::Sample {
                field: SampleField::MemoryPercent,
                ..
            } => "memory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_kind_labels() {
        let name = ProcessError::Name {
            pid: 1,
            source: io::Error::other("gone"),
        };
        let cpu = ProcessError::Sample {
            pid: 1,
            field: SampleField::CpuTimes,
            source: io::Error::other("gone"),
        };
        let mem = ProcessError::Sample {
            pid: 1,
            field: SampleField::MemoryPercent,
            source: io::Error::other("gone"),
        };

        assert_eq!(name.kind(), "name");
        assert_eq!(cpu.kind(), "cpu");
        assert_eq!(mem.kind(), "memory");
    }

    #[test]
    fn test_sample_error_message_names_field() {
        let err = ProcessError::Sample {
            pid: 42,
            field: SampleField::MemoryPercent,
            source: io::Error::other("statm unreadable"),
        };
        assert_eq!(
            err.to_string(),
            "pid 42: cannot sample memory percent: statm unreadable"
        );
    }
}
