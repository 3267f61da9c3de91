//! Scrape statistics for the exporter's own health.
//!
//! These counters describe the exporter (how many scrapes ran, how long they
//! took, whether the last one failed). They never carry process data from one
//! scrape to the next.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::Instant;

use crate::collector::Snapshot;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Outcome of the most recent scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastScrape {
    Never,
    Succeeded,
    Failed(String),
}

/// Scrape statistics shared by all HTTP handlers.
pub struct HealthStats {
    pub processes: Stat,
    pub groups: Stat,
    pub collect_duration_seconds: Stat,
    pub scrapes_total: AtomicU64,
    pub scrape_failures_total: AtomicU64,
    pub timeouts_total: AtomicU64,
    pub process_errors_total: AtomicU64,
    pub http_requests_total: AtomicU64,
    pub start_time: Instant,
    /// Outcome and time of the most recent scrape, updated together.
    last: StdRwLock<(LastScrape, Option<Instant>)>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            processes: Stat::default(),
            groups: Stat::default(),
            collect_duration_seconds: Stat::default(),
            scrapes_total: AtomicU64::new(0),
            scrape_failures_total: AtomicU64::new(0),
            timeouts_total: AtomicU64::new(0),
            process_errors_total: AtomicU64::new(0),
            http_requests_total: AtomicU64::new(0),
            start_time: Instant::now(),
            last: StdRwLock::new((LastScrape::Never, None)),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_http_request(&self) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, snapshot: &Snapshot) {
        let stats = snapshot.stats();
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.processes.add_sample(stats.enumerated as f64);
        self.groups.add_sample(snapshot.groups().len() as f64);
        self.collect_duration_seconds
            .add_sample(snapshot.duration().as_secs_f64());
        self.process_errors_total.fetch_add(
            stats.name_errors + stats.ancestor_errors + stats.cpu_errors + stats.memory_errors,
            Ordering::Relaxed,
        );
        self.set_last(LastScrape::Succeeded);
    }

    pub fn record_failure(&self, reason: &str, timed_out: bool) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.scrape_failures_total.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts_total.fetch_add(1, Ordering::Relaxed);
        }
        self.set_last(LastScrape::Failed(reason.to_string()));
    }

    fn set_last(&self, outcome: LastScrape) {
        if let Ok(mut guard) = self.last.write() {
            *guard = (outcome, Some(Instant::now()));
        }
    }

    /// False only when the most recent scrape failed.
    pub fn is_healthy(&self) -> bool {
        !matches!(self.last_scrape(), LastScrape::Failed(_))
    }

    pub fn last_scrape(&self) -> LastScrape {
        self.last
            .read()
            .map(|g| g.0.clone())
            .unwrap_or(LastScrape::Never)
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn get_last_scrape_str(&self) -> String {
        match self.last.read() {
            Ok(guard) => match guard.1 {
                Some(t) => format!("{:.1}s ago", t.elapsed().as_secs_f64()),
                None => "never".to_string(),
            },
            Err(_) => "unknown".to_string(),
        }
    }

    /// Renders the statistics as a plain-text table.
    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;
        let mut out = String::new();

        writeln!(out, "SCRAPE STATISTICS").ok();
        writeln!(out, "=================").ok();
        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        let rows = [
            ("processes", &self.processes, 0usize),
            ("groups", &self.groups, 0usize),
            ("collect_duration_seconds", &self.collect_duration_seconds, 4usize),
        ];
        for (label, stat, precision) in rows {
            let (cur, avg, max, min, _) = stat.snapshot();
            writeln!(
                out,
                "{:left$} | {:^col$.prec$} | {:^col$.prec$} | {:^col$.prec$} | {:^col$.prec$}",
                label,
                cur,
                avg,
                max,
                min,
                left = left_col,
                col = col_w,
                prec = precision
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {}",
            "scrapes_total",
            self.scrapes_total.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "scrape_failures_total",
            self.scrape_failures_total.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "timeouts_total",
            self.timeouts_total.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "process_errors_total",
            self.process_errors_total.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "last_scrape",
            self.get_last_scrape_str(),
            left = left_col
        )
        .ok();

        out
    }
}
