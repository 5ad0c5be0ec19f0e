//! Host CPU utilization sampler.
//!
//! Keeps the two most recent `/proc/stat` readings in a double buffer and
//! turns their difference into percentages of the elapsed interval.

use std::path::PathBuf;

use tracing::debug;

use crate::collector::procfs::parser::{CpuCounters, LoadAvg, parse_cpu_counters, parse_loadavg};
use crate::collector::traits::FileSystem;

/// Error type for host counter collection.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a counter file.
    Io(std::io::Error),
    /// Counter file had unexpected content.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// CPU time breakdown over the last sampling interval, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Utilization {
    pub user: f64,
    /// system + hardirq + softirq, as top(1) shows it in `sy`.
    pub system: f64,
    pub nice: f64,
    pub idle: f64,
    pub iowait: f64,
    pub hardirq: f64,
    pub softirq: f64,
    pub steal: f64,
    /// The latest read failed; these are the previous values.
    pub stale: bool,
}

/// Normalized delta of one counter pair, clamped to [0, 100].
///
/// A backward jump (dyn-tick kernel race) contributes zero rather than a
/// negative value.
fn percent(prev: u64, curr: u64, interval: u64) -> f64 {
    if curr < prev {
        return 0.0;
    }
    let value = (curr - prev) as f64 / interval as f64 * 100.0;
    value.clamp(0.0, 100.0)
}

/// Computes utilization between two raw samples.
pub fn utilization(prev: &CpuCounters, curr: &CpuCounters) -> Utilization {
    // First sample has prev == 0, which yields "since boot" figures.
    let interval = curr.uptime().saturating_sub(prev.uptime()).max(1);

    let busy_sys = |c: &CpuCounters| {
        c.system
            .saturating_add(c.irq)
            .saturating_add(c.softirq)
    };

    Utilization {
        user: percent(prev.user, curr.user, interval),
        system: percent(busy_sys(prev), busy_sys(curr), interval),
        nice: percent(prev.nice, curr.nice, interval),
        idle: percent(prev.idle, curr.idle, interval),
        iowait: percent(prev.iowait, curr.iowait, interval),
        hardirq: percent(prev.irq, curr.irq, interval),
        softirq: percent(prev.softirq, curr.softirq, interval),
        steal: percent(prev.steal, curr.steal, interval),
        stale: false,
    }
}

/// Samples `/proc/stat` and reports utilization since the previous call.
pub struct CpuSampler<F: FileSystem> {
    fs: F,
    proc_path: String,
    /// Double buffer of raw readings; `curr` selects the slot written next.
    samples: [CpuCounters; 2],
    curr: bool,
    last: Utilization,
}

impl<F: FileSystem> CpuSampler<F> {
    /// Creates a sampler and takes the first reading.
    ///
    /// Fails if the counter source cannot be read at all: without it there
    /// is nothing meaningful to show.
    pub fn new(fs: F, proc_path: impl Into<String>) -> Result<Self, CollectError> {
        let mut sampler = Self {
            fs,
            proc_path: proc_path.into(),
            samples: [CpuCounters::default(); 2],
            curr: false,
            last: Utilization::default(),
        };
        let counters = sampler.read_counters()?;
        sampler.last = sampler.push(counters);
        Ok(sampler)
    }

    /// Takes a new reading and returns utilization since the previous one.
    ///
    /// A failed read keeps the previous buffer untouched and returns the last
    /// good utilization marked stale.
    pub fn sample(&mut self) -> Utilization {
        match self.read_counters() {
            Ok(counters) => {
                self.last = self.push(counters);
                self.last
            }
            Err(e) => {
                debug!(error = %e, "cpu sample failed, reusing previous values");
                Utilization {
                    stale: true,
                    ..self.last
                }
            }
        }
    }

    /// Most recent utilization without taking a new reading.
    pub fn last(&self) -> Utilization {
        self.last
    }

    /// Reads `/proc/loadavg`. Failure is not fatal for the caller.
    pub fn load_average(&self) -> Result<LoadAvg, CollectError> {
        let path = PathBuf::from(format!("{}/loadavg", self.proc_path));
        let content = self.fs.read_to_string(&path)?;
        parse_loadavg(&content).map_err(|e| CollectError::Parse(e.message))
    }

    fn read_counters(&self) -> Result<CpuCounters, CollectError> {
        let path = PathBuf::from(format!("{}/stat", self.proc_path));
        let content = self.fs.read_to_string(&path)?;
        parse_cpu_counters(&content).map_err(|e| CollectError::Parse(e.message))
    }

    fn push(&mut self, counters: CpuCounters) -> Utilization {
        let curr = usize::from(self.curr);
        self.samples[curr] = counters;
        let util = utilization(&self.samples[curr ^ 1], &self.samples[curr]);
        self.curr = !self.curr;
        util
    }
}
