//! Host metrics and log collection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 CpuSampler                   │
//! │  - /proc/stat    (double-buffered deltas)    │
//! │  - /proc/loadavg                             │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                 ┌──────▼──────┐
//!                 │  FileSystem │ (trait)
//!                 └──────┬──────┘
//!               ┌────────┴────────┐
//!        ┌──────▼──────┐   ┌──────▼──────┐
//!        │   RealFs    │   │   MockFs    │
//!        │  (Linux)    │   │  (Testing)  │
//!        └─────────────┘   └─────────────┘
//! ```
//!
//! The pooler log viewer reads real files directly through [`LogCursor`].
//!
//! # Usage
//!
//! ```
//! use pgbtop::collector::{CpuSampler, MockFs};
//!
//! let mut sampler = CpuSampler::new(MockFs::typical_host(), "/proc").unwrap();
//! let util = sampler.sample();
//! assert!(util.idle <= 100.0);
//! ```

pub mod log_tailer;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use log_tailer::LogCursor;
pub use mock::MockFs;
pub use procfs::{CollectError, CpuSampler, Utilization};
pub use traits::{FileSystem, RealFs};
