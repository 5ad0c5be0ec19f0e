//! Collectors for the Linux `/proc` filesystem.
//!
//! Only host-wide figures are read here: the aggregate CPU line of
//! `/proc/stat` and the load averages from `/proc/loadavg`.

pub mod cpu;
pub mod parser;

pub use cpu::{CollectError, CpuSampler, Utilization};
pub use parser::{CpuCounters, LoadAvg};
