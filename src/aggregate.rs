//! Per-group aggregation of process samples.
//!
//! Processes are folded into a `GroupTable` keyed by (own name, session root
//! name). CPU time and memory are read as two independent results so a
//! failure of one never drops the other.

use ahash::AHashMap as HashMap;

use crate::error::{ProcessError, SampleField};
use crate::process::{CpuTimes, ProcessHandle};

/// Identity of a logical process group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    /// Own process name (`name` label).
    pub name: String,
    /// Resolved session root name (`parent` label).
    pub parent: String,
}

impl GroupKey {
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
        }
    }
}

/// Running totals of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    pub cpu_seconds: f64,
    pub memory_percent: f64,
    pub processes: usize,
}

impl GroupTotals {
    fn add(&mut self, other: &GroupTotals) {
        self.cpu_seconds += other.cpu_seconds;
        self.memory_percent += other.memory_percent;
        self.processes += other.processes;
    }
}

/// A finished group of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub key: GroupKey,
    pub totals: GroupTotals,
}

/// Field reads of one process.
#[derive(Debug)]
pub struct ProcessSample {
    pub cpu: Result<CpuTimes, ProcessError>,
    pub memory_percent: Result<f64, ProcessError>,
}

impl ProcessSample {
    pub fn read<H: ProcessHandle>(handle: &H) -> Self {
        let pid = handle.pid();
        Self {
            cpu: handle.cpu_times().map_err(|source| ProcessError::Sample {
                pid,
                field: SampleField::CpuTimes,
                source,
            }),
            memory_percent: handle
                .memory_percent()
                .map_err(|source| ProcessError::Sample {
                    pid,
                    field: SampleField::MemoryPercent,
                    source,
                }),
        }
    }

    /// Consumes the sample, returning the field errors it carried.
    pub fn into_errors(self) -> Vec<ProcessError> {
        let mut errors = Vec::new();
        if let Err(e) = self.cpu {
            errors.push(e);
        }
        if let Err(e) = self.memory_percent {
            errors.push(e);
        }
        errors
    }
}

/// Mapping from group key to running totals for one collection cycle.
#[derive(Debug, Default, Clone)]
pub struct GroupTable {
    groups: HashMap<GroupKey, GroupTotals>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupTotals> {
        self.groups.get(key)
    }

    /// Reads CPU and memory from `handle` and adds them to the group
    /// (`own_name`, `ancestor_name`).
    ///
    /// The group is created even when both reads fail. Returns the per-field
    /// errors for the caller to log.
    pub fn accumulate<H: ProcessHandle>(
        &mut self,
        own_name: String,
        ancestor_name: String,
        handle: &H,
    ) -> Vec<ProcessError> {
        let sample = ProcessSample::read(handle);
        self.add_sample(GroupKey::new(own_name, ancestor_name), &sample);
        sample.into_errors()
    }

    /// Adds whichever fields of `sample` succeeded to the group `key`.
    pub fn add_sample(&mut self, key: GroupKey, sample: &ProcessSample) {
        let entry = self.groups.entry(key).or_default();
        entry.processes += 1;
        if let Ok(cpu) = &sample.cpu {
            entry.cpu_seconds += cpu.total();
        }
        if let Ok(mem) = &sample.memory_percent {
            entry.memory_percent += *mem;
        }
    }

    /// Folds `other` into `self`, summing matching keys.
    pub fn merge(mut self, other: GroupTable) -> GroupTable {
        // Iterate over the smaller map
        let (mut into, from) = if self.groups.len() >= other.groups.len() {
            (std::mem::take(&mut self.groups), other.groups)
        } else {
            (other.groups, std::mem::take(&mut self.groups))
        };
        for (key, totals) in from {
            into.entry(key).or_default().add(&totals);
        }
        GroupTable { groups: into }
    }

    /// Converts the table into key-sorted group aggregates.
    pub fn into_groups(self) -> Vec<GroupAggregate> {
        let mut groups: Vec<GroupAggregate> = self
            .groups
            .into_iter()
            .map(|(key, totals)| GroupAggregate { key, totals })
            .collect();
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessEnumerator, TestDataEnumerator, TestProcess};

    fn handles(processes: Vec<TestProcess>) -> Vec<crate::process::TestHandle> {
        TestDataEnumerator::from_processes(processes).list().unwrap()
    }

    #[test]
    fn test_accumulate_sums_members() {
        let hs = handles(vec![
            TestProcess::new(1, "node", 0).with_cpu(1.0, 0.5).with_memory(2.0),
            TestProcess::new(2, "node", 0).with_cpu(3.0, 0.25).with_memory(1.5),
        ]);

        let mut table = GroupTable::new();
        for h in &hs {
            let errors = table.accumulate("node".into(), "Terminal".into(), h);
            assert!(errors.is_empty());
        }

        let totals = table.get(&GroupKey::new("node", "Terminal")).unwrap();
        assert_eq!(totals.cpu_seconds, 4.75);
        assert_eq!(totals.memory_percent, 3.5);
        assert_eq!(totals.processes, 2);
    }

    #[test]
    fn test_failed_memory_read_keeps_cpu() {
        let hs = handles(vec![TestProcess::new(1, "node", 0).with_cpu(2.0, 1.0)]);

        let mut table = GroupTable::new();
        let errors = table.accumulate("node".into(), "node".into(), &hs[0]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "memory");
        let totals = table.get(&GroupKey::new("node", "node")).unwrap();
        assert_eq!(totals.cpu_seconds, 3.0);
        assert_eq!(totals.memory_percent, 0.0);
    }

    #[test]
    fn test_group_created_when_both_reads_fail() {
        let hs = handles(vec![TestProcess::new(1, "zombie", 0)]);

        let mut table = GroupTable::new();
        let errors = table.accumulate("zombie".into(), "zombie".into(), &hs[0]);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            table.get(&GroupKey::new("zombie", "zombie")),
            Some(&GroupTotals {
                cpu_seconds: 0.0,
                memory_percent: 0.0,
                processes: 1,
            })
        );
    }

    #[test]
    fn test_merge_sums_matching_keys() {
        let hs = handles(vec![
            TestProcess::new(1, "bash", 0).with_cpu(1.0, 1.0).with_memory(1.0),
            TestProcess::new(2, "bash", 0).with_cpu(2.0, 2.0).with_memory(2.0),
            TestProcess::new(3, "vim", 0).with_cpu(0.5, 0.0).with_memory(0.5),
        ]);

        let mut left = GroupTable::new();
        left.accumulate("bash".into(), "Terminal".into(), &hs[0]);
        let mut right = GroupTable::new();
        right.accumulate("bash".into(), "Terminal".into(), &hs[1]);
        right.accumulate("vim".into(), "Terminal".into(), &hs[2]);

        let merged = left.merge(right);
        let bash = *merged.get(&GroupKey::new("bash", "Terminal")).unwrap();
        assert_eq!(bash.cpu_seconds, 6.0);
        assert_eq!(bash.memory_percent, 3.0);
        assert_eq!(bash.processes, 2);
        assert_eq!(merged.into_groups().len(), 2);
    }

    #[test]
    fn test_into_groups_is_sorted_by_key() {
        let mut table = GroupTable::new();
        let sample = ProcessSample {
            cpu: Ok(CpuTimes::default()),
            memory_percent: Ok(0.0),
        };
        table.add_sample(GroupKey::new("zsh", "iTerm2"), &sample);
        table.add_sample(GroupKey::new("bash", "Terminal"), &sample);
        table.add_sample(GroupKey::new("bash", "iTerm2"), &sample);

        let keys: Vec<GroupKey> = table.into_groups().into_iter().map(|g| g.key).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::new("bash", "Terminal"),
                GroupKey::new("bash", "iTerm2"),
                GroupKey::new("zsh", "iTerm2"),
            ]
        );
    }
}
