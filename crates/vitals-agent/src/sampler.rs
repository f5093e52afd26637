//! Runtime resource sampling.
//!
//! Every runtime statistic the agent reports is listed once in
//! [`RUNTIME_METRICS`]: a name paired with an accessor over the refreshed
//! [`RuntimeSampler`] snapshot. Adding a statistic means adding one table
//! row; there is no name-based field lookup at run time.

use std::collections::HashMap;

use sysinfo::{Pid, ProcessesToUpdate, System};
use vitals_common::types::Metric;

/// Error returned when a requested statistic is not in the accessor table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown runtime metric: {0}")]
pub struct UnknownMetric(pub String);

type Accessor = fn(&RuntimeSampler) -> f64;

/// The fixed list of runtime statistics, all reported as gauges.
pub const RUNTIME_METRICS: &[(&str, Accessor)] = &[
    ("memory.total", |s| s.system.total_memory() as f64),
    ("memory.used", |s| s.system.used_memory() as f64),
    ("memory.available", |s| s.system.available_memory() as f64),
    ("memory.free", |s| s.system.free_memory() as f64),
    ("memory.used_percent", |s| {
        let total = s.system.total_memory();
        if total > 0 {
            (s.system.used_memory() as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }),
    ("memory.swap_total", |s| s.system.total_swap() as f64),
    ("memory.swap_used", |s| s.system.used_swap() as f64),
    ("cpu.usage", |s| s.system.global_cpu_usage() as f64),
    ("process.memory", |s| {
        s.process_stat(|p| p.memory() as f64)
    }),
    ("process.virtual_memory", |s| {
        s.process_stat(|p| p.virtual_memory() as f64)
    }),
    ("process.cpu_usage", |s| {
        s.process_stat(|p| p.cpu_usage() as f64)
    }),
    ("system.processes", |s| s.system.processes().len() as f64),
    ("system.load_1", |_| System::load_average().one),
    ("system.load_5", |_| System::load_average().five),
    ("system.load_15", |_| System::load_average().fifteen),
    ("system.uptime", |_| System::uptime() as f64),
];

/// A refreshable snapshot of host and process statistics.
pub struct RuntimeSampler {
    system: System,
    pid: Pid,
}

impl RuntimeSampler {
    pub fn new() -> anyhow::Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| anyhow::anyhow!("cannot determine own pid: {e}"))?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }

    /// Refreshes the underlying snapshot; call once per poll tick.
    pub fn refresh(&mut self) {
        self.system.refresh_memory();
        self.system.refresh_cpu_all();
        self.system.refresh_processes(ProcessesToUpdate::All, true);
    }

    /// Reads one statistic by name.
    ///
    /// # Errors
    ///
    /// [`UnknownMetric`] for names outside [`RUNTIME_METRICS`]; the caller
    /// logs and continues, a bad name never aborts a sampling cycle.
    pub fn read(&self, name: &str) -> Result<f64, UnknownMetric> {
        RUNTIME_METRICS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, accessor)| accessor(self))
            .ok_or_else(|| UnknownMetric(name.to_string()))
    }

    fn process_stat(&self, stat: impl Fn(&sysinfo::Process) -> f64) -> f64 {
        self.system.process(self.pid).map(stat).unwrap_or(0.0)
    }
}

/// The batch under construction during one report cycle.
///
/// Gauges overwrite within the batch; the tick counter accumulates. At
/// the report boundary [`MetricBatch::drain`] turns the state into wire
/// metrics and resets it for the next cycle.
#[derive(Default)]
pub struct MetricBatch {
    gauges: HashMap<String, f64>,
    poll_count: i64,
}

impl MetricBatch {
    pub fn record_gauge(&mut self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }

    /// Marks one completed poll tick.
    pub fn tick(&mut self) {
        self.poll_count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty() && self.poll_count == 0
    }

    /// Produces the wire batch and resets the accumulator. `PollCount`
    /// carries the ticks since the previous drain as its counter delta;
    /// the collector side accumulates it into the total poll count.
    pub fn drain(&mut self) -> Vec<Metric> {
        let mut metrics: Vec<Metric> = self
            .gauges
            .drain()
            .map(|(name, value)| Metric::gauge(name, value))
            .collect();
        if self.poll_count > 0 {
            metrics.push(Metric::counter("PollCount", self.poll_count));
            self.poll_count = 0;
        }
        metrics
    }
}
