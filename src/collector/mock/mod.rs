//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built host fixtures for running
//! the CPU sampler without a Linux `/proc` filesystem.

mod filesystem;

pub use filesystem::MockFs;

impl MockFs {
    /// A small two-CPU host with plausible `/proc/stat` and `/proc/loadavg`.
    pub fn typical_host() -> Self {
        let fs = Self::new();
        fs.add_file("/proc/stat", stat_line(&[10000, 500, 3000, 80000, 1000, 200, 100, 0, 0, 0]));
        fs.add_file("/proc/loadavg", "1.09 1.13 1.18 2/310 48211\n");
        fs
    }

    /// Rewrites the aggregate `cpu` line of `/proc/stat`.
    ///
    /// `counters` is user, nice, system, idle, iowait, irq, softirq, steal,
    /// guest, guest_nice.
    pub fn set_cpu_counters(&self, counters: &[u64; 10]) {
        self.add_file("/proc/stat", stat_line(counters));
    }
}

fn stat_line(counters: &[u64; 10]) -> String {
    let values: Vec<String> = counters.iter().map(u64::to_string).collect();
    format!(
        "cpu  {}\ncpu0 {}\nctxt 500000\nbtime 1700000000\n",
        values.join(" "),
        values.join(" ")
    )
}
