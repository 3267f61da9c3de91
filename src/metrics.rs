//! Prometheus metrics definitions for process-group-exporter.
//!
//! Every scrape builds its own `Registry` from a finished `Snapshot`, so
//! overlapping scrapes never share metric state and nothing is registered
//! globally.

use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::collector::Snapshot;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

pub const CPU_USAGE_METRIC: &str = "mac_process_cpu_usage_total";
pub const MEM_USAGE_METRIC: &str = "mac_process_mem_usage";

/// Group-level metrics, labelled by own name and session root.
#[derive(Clone)]
pub struct GroupMetrics {
    pub cpu_usage_total: CounterVec, // labels: name, parent
    pub mem_usage: GaugeVec,         // labels: name, parent
}

impl GroupMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let cpu_usage_total = CounterVec::new(
            Opts::new(CPU_USAGE_METRIC, "process cpu usage"),
            &["name", "parent"],
        )?;
        let mem_usage = GaugeVec::new(
            Opts::new(MEM_USAGE_METRIC, "process memory usage"),
            &["name", "parent"],
        )?;

        registry.register(Box::new(cpu_usage_total.clone()))?;
        registry.register(Box::new(mem_usage.clone()))?;

        Ok(Self {
            cpu_usage_total,
            mem_usage,
        })
    }

    pub fn observe(&self, snapshot: &Snapshot) {
        for group in snapshot.groups() {
            let labels = [group.key.name.as_str(), group.key.parent.as_str()];
            self.cpu_usage_total
                .with_label_values(&labels)
                .inc_by(group.totals.cpu_seconds);
            self.mem_usage
                .with_label_values(&labels)
                .set(group.totals.memory_percent);
        }
    }
}

/// Exporter self-metrics describing the collection cycle.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub scrape_duration_seconds: Gauge,
    pub groups: Gauge,
    pub processes: GaugeVec,      // labels: state
    pub process_errors: GaugeVec, // labels: kind
}

impl ExporterMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let scrape_duration_seconds = Gauge::new(
            "process_group_exporter_scrape_duration_seconds",
            "Time spent collecting and aggregating processes for this scrape",
        )?;
        let groups = Gauge::new(
            "process_group_exporter_groups",
            "Number of process groups in this scrape",
        )?;
        let processes = GaugeVec::new(
            Opts::new(
                "process_group_exporter_processes",
                "Processes enumerated and aggregated in this scrape",
            ),
            &["state"],
        )?;
        let process_errors = GaugeVec::new(
            Opts::new(
                "process_group_exporter_process_errors",
                "Per-process read failures in this scrape",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(groups.clone()))?;
        registry.register(Box::new(processes.clone()))?;
        registry.register(Box::new(process_errors.clone()))?;

        Ok(Self {
            scrape_duration_seconds,
            groups,
            processes,
            process_errors,
        })
    }

    pub fn observe(&self, snapshot: &Snapshot) {
        let stats = snapshot.stats();
        self.scrape_duration_seconds
            .set(snapshot.duration().as_secs_f64());
        self.groups.set(snapshot.groups().len() as f64);
        self.processes
            .with_label_values(&["enumerated"])
            .set(stats.enumerated as f64);
        self.processes
            .with_label_values(&["aggregated"])
            .set(stats.aggregated as f64);

        for (kind, count) in [
            ("name", stats.name_errors),
            ("ancestor", stats.ancestor_errors),
            ("cpu", stats.cpu_errors),
            ("memory", stats.memory_errors),
        ] {
            self.process_errors
                .with_label_values(&[kind])
                .set(count as f64);
        }
    }
}

/// Encodes a snapshot in Prometheus text format.
///
/// `telemetry` adds the `process_group_exporter_*` self-metrics.
pub fn encode_snapshot(snapshot: &Snapshot, telemetry: bool) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    GroupMetrics::new(&registry)?.observe(snapshot);
    if telemetry {
        ExporterMetrics::new(&registry)?.observe(snapshot);
    }

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SnapshotCollector;
    use crate::process::{TestDataEnumerator, TestProcess};

    fn snapshot() -> Snapshot {
        SnapshotCollector::new(
            TestDataEnumerator::from_processes(vec![
                TestProcess::new(1, "launchd", 0).with_cpu(10.0, 5.0).with_memory(0.5),
                TestProcess::new(100, "Terminal", 1).with_cpu(2.0, 1.0).with_memory(1.25),
            ]),
            "launchd",
        )
        .collect()
        .unwrap()
    }

    #[test]
    fn test_encode_group_metrics() {
        let text = encode_snapshot(&snapshot(), false).unwrap();

        assert!(text.contains("# TYPE mac_process_cpu_usage_total counter"));
        assert!(text.contains("# TYPE mac_process_mem_usage gauge"));
        assert!(text.contains(r#"mac_process_cpu_usage_total{name="Terminal",parent="Terminal"} 3"#));
        assert!(text.contains(r#"mac_process_mem_usage{name="Terminal",parent="Terminal"} 1.25"#));
        assert!(text.contains(r#"mac_process_cpu_usage_total{name="launchd",parent="launchd"} 15"#));
        assert!(!text.contains("process_group_exporter_"));
    }

    #[test]
    fn test_encode_with_telemetry() {
        let text = encode_snapshot(&snapshot(), true).unwrap();

        assert!(text.contains("process_group_exporter_groups 2"));
        assert!(text.contains(r#"process_group_exporter_processes{state="enumerated"} 2"#));
        assert!(text.contains(r#"process_group_exporter_process_errors{kind="memory"} 0"#));
    }
}
