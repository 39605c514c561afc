//! Core domain types for the frame-rate monitor.
//!
//! This module contains the key, clock, configuration and error types
//! shared by the counting, reporting and id-allocation paths.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Config, ConfigBuilder, LogLevel, RateBand, SinkKind};
pub use error::{FpsError, Result};
pub use types::RateKey;
