//! fpsmon - in-process frame-rate monitor.
//!
//! Many producers (per-channel video pipelines, network sessions) count
//! frames against a composite `(owner, group, sub)` key. A background
//! worker turns the counts into frames per second on a fixed interval and
//! writes fixed-width text reports.
//!
//! # Features
//!
//! - **Cheap counting**: one table lookup per frame, or lock-free through a
//!   [`metrics::CounterHandle`]
//! - **Valid/invalid classification** against a configurable rate band
//! - **Stable report format**: detail and summary streams for existing
//!   log parsers
//! - **Recyclable ids** for sessions that only have a string key
//!
//! # Architecture
//!
//! - `core`: keys, clocks, configuration and errors
//! - `metrics`: counter table, aggregator and report formatting
//! - `allocator`: string key to numeric id allocation
//! - `sink`: where report lines go
//! - `monitoring`: the owned monitor tying it together
//! - `cli`: demo load generator
//!
//! # Example
//!
//! ```no_run
//! use fpsmon_lib::core::{Config, RateKey};
//! use fpsmon_lib::monitoring::FpsMonitor;
//!
//! fn main() -> fpsmon_lib::Result<()> {
//!     let monitor = FpsMonitor::from_config(&Config::default())?;
//!     let key = RateKey::new(0, 1, 0);
//!     monitor.increment(key);
//!     println!("{:.1} fps", monitor.current_rate(key));
//!     monitor.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod allocator;
pub mod cli;
pub mod core;
pub mod metrics;
pub mod monitoring;
pub mod sink;

// Re-export core types for convenience
pub use crate::core::{Config, FpsError, RateKey, Result};
pub use crate::monitoring::FpsMonitor;
