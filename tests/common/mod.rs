//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fpsmon_lib::core::{Clock, ConfigBuilder, ManualClock, RateBand, SinkKind};
use fpsmon_lib::monitoring::FpsMonitor;
use fpsmon_lib::sink::{LineSink, MemorySink, SinkId};

/// Monitor driven by a manual clock and capturing its reports in memory.
///
/// The worker interval is an hour, so cycles only happen through
/// `flush_now` or `shutdown`.
pub struct TestMonitor {
    pub clock: Arc<ManualClock>,
    pub sink: Arc<MemorySink>,
    pub monitor: FpsMonitor,
}

impl TestMonitor {
    pub fn new() -> Self {
        Self::with_band(RateBand::RELAXED)
    }

    pub fn with_band(band: RateBand) -> Self {
        Self::build(band, 100)
    }

    pub fn build(band: RateBand, list_cap: usize) -> Self {
        let config = ConfigBuilder::new()
            .interval(Duration::from_secs(3600))
            .band(band)
            .list_cap(list_cap)
            .sink_kind(SinkKind::Null)
            .build()
            .unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let sink = Arc::new(MemorySink::new());
        let monitor = FpsMonitor::with_clock(
            &config,
            Arc::clone(&sink) as Arc<dyn LineSink>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();

        Self {
            clock,
            sink,
            monitor,
        }
    }

    /// Advance the clock by `ms`, run one cycle and wait for its report.
    pub fn cycle_after(&self, ms: u64) {
        self.clock.advance(ms);
        self.monitor
            .flush_now()
            .expect("cycle should run after the clock advanced");
        self.monitor.wait_for_reports();
    }

    pub fn summary(&self) -> Vec<String> {
        self.monitor.wait_for_reports();
        self.sink.lines(SinkId::Summary)
    }

    pub fn detail(&self) -> Vec<String> {
        self.monitor.wait_for_reports();
        self.sink.lines(SinkId::Detail)
    }
}

/// Approximate float comparison for rates.
pub fn assert_rate(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected rate {}, got {}",
        expected,
        actual
    );
}
