//! Configuration management for the frame-rate monitor.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides (see `cli`)
//! - Validation and defaults

use crate::core::{FpsError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for the monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregation and classification settings
    pub monitor: MonitorConfig,
    /// Where report lines go
    pub sink: SinkConfig,
    /// Diagnostic logging
    pub logging: LoggingConfig,
}

/// Aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between aggregation/report cycles
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Inclusive band a rate must fall in to count as valid
    pub band: RateBand,
    /// Valid/invalid key lists are printed only while shorter than this
    pub list_cap: usize,
}

/// Inclusive `[min, max]` rate interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub min: f32,
    pub max: f32,
}

impl RateBand {
    /// Wide band for mixed workloads.
    pub const RELAXED: RateBand = RateBand {
        min: 8.0,
        max: 1000.0,
    };
    /// Camera feeds expected to run between 10 and 40 fps.
    pub const STRICT_40: RateBand = RateBand {
        min: 10.0,
        max: 40.0,
    };
    /// Camera feeds expected to run between 10 and 30 fps.
    pub const STRICT_30: RateBand = RateBand {
        min: 10.0,
        max: 30.0,
    };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Both bounds are inclusive.
    #[inline]
    pub fn contains(&self, rate: f32) -> bool {
        self.min <= rate && rate <= self.max
    }
}

impl Default for RateBand {
    fn default() -> Self {
        Self::RELAXED
    }
}

/// Report sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Which stock sink to build
    pub kind: SinkKind,
    /// Directory holding the report files
    pub session_dir: PathBuf,
    /// Base file name; the summary file gets a `_summary` suffix
    pub file_name: String,
    /// Size at which a report file is rotated
    pub max_file_bytes: u64,
    /// Number of files kept per report, current one included
    pub max_files: usize,
    /// Lines buffered between the report worker and the sink; further
    /// lines are dropped while the queue is full
    pub queue_capacity: usize,
}

/// Stock sink kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    File,
    Tracing,
    Null,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            interval: Duration::from_secs(10),
            band: RateBand::default(),
            list_cap: 100,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            kind: SinkKind::File,
            session_dir: PathBuf::from("session"),
            file_name: "fps_common".to_string(),
            max_file_bytes: 5 * 1024 * 1024,
            max_files: 3,
            queue_capacity: 4096,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval.is_zero() {
            return Err(FpsError::config("interval must be greater than 0"));
        }

        let band = self.monitor.band;
        if !band.min.is_finite() || !band.max.is_finite() {
            return Err(FpsError::config(format!(
                "rate band bounds must be finite, got [{}, {}]",
                band.min, band.max
            )));
        }
        if band.min < 0.0 {
            return Err(FpsError::config(format!(
                "rate band minimum must not be negative, got {}",
                band.min
            )));
        }
        if band.min > band.max {
            return Err(FpsError::config(format!(
                "rate band minimum {} exceeds maximum {}",
                band.min, band.max
            )));
        }

        if self.monitor.list_cap == 0 {
            return Err(FpsError::config("list_cap must be greater than 0"));
        }

        if self.sink.queue_capacity == 0 {
            return Err(FpsError::config("queue_capacity must be greater than 0"));
        }

        if self.sink.kind == SinkKind::File {
            if self.sink.file_name.trim().is_empty() {
                return Err(FpsError::config("file_name must not be empty"));
            }
            if self.sink.max_file_bytes == 0 {
                return Err(FpsError::config("max_file_bytes must be greater than 0"));
            }
            if self.sink.max_files == 0 {
                return Err(FpsError::config("max_files must be greater than 0"));
            }
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| FpsError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the aggregation interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.monitor.interval = interval;
        self
    }

    /// Set the valid rate band
    pub fn band(mut self, band: RateBand) -> Self {
        self.config.monitor.band = band;
        self
    }

    /// Set the lower bound of the rate band
    pub fn min_rate(mut self, min: f32) -> Self {
        self.config.monitor.band.min = min;
        self
    }

    /// Set the upper bound of the rate band
    pub fn max_rate(mut self, max: f32) -> Self {
        self.config.monitor.band.max = max;
        self
    }

    /// Set the key-list cap of the summary lines
    pub fn list_cap(mut self, cap: usize) -> Self {
        self.config.monitor.list_cap = cap;
        self
    }

    /// Select the stock sink
    pub fn sink_kind(mut self, kind: SinkKind) -> Self {
        self.config.sink.kind = kind;
        self
    }

    /// Set session directory
    pub fn session_dir(mut self, path: PathBuf) -> Self {
        self.config.sink.session_dir = path;
        self
    }

    /// Set report file base name
    pub fn file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.sink.file_name = name.into();
        self
    }

    /// Set how many report lines may wait for the sink
    pub fn queue_capacity(mut self, lines: usize) -> Self {
        self.config.sink.queue_capacity = lines;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
