//! Self-contained rate counter for a single stream.
//!
//! Useful when one component wants its own frame rate without a shared
//! table or a background worker: the rate is recomputed lazily on read,
//! at most once per `min_interval`.

use crate::core::{Clock, MonotonicClock};
use crate::metrics::counter::rate_per_second;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default minimum time between two rate computations.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(10);

pub struct FpsCounter {
    clock: Arc<dyn Clock>,
    min_interval_ms: u64,
    value: AtomicU64,
    window: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    start_ms: u64,
    start_value: u64,
    rate: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()), DEFAULT_MIN_INTERVAL)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, min_interval: Duration) -> Self {
        let start_ms = clock.now_ms();
        Self {
            clock,
            min_interval_ms: u64::try_from(min_interval.as_millis()).unwrap_or(u64::MAX),
            value: AtomicU64::new(0),
            window: Mutex::new(Window {
                start_ms,
                start_value: 0,
                rate: 0.0,
            }),
        }
    }

    /// Add `n` events and return the running total.
    #[inline(always)]
    pub fn add(&self, n: u64) -> u64 {
        self.value.fetch_add(n, Ordering::AcqRel) + n
    }

    pub fn total(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Current rate, recomputed if the window is old enough.
    pub fn rate(&self) -> f32 {
        self.rate_at(self.clock.now_ms())
    }

    /// Rate as of `now_ms` on this counter's clock.
    ///
    /// Windows shorter than the minimum interval (including a clock that
    /// went backwards) return the previous rate.
    pub fn rate_at(&self, now_ms: u64) -> f32 {
        let mut window = self.window.lock();
        let elapsed = match now_ms.checked_sub(window.start_ms) {
            Some(elapsed) if elapsed > 0 && elapsed >= self.min_interval_ms => elapsed,
            _ => return window.rate,
        };

        let value = self.total();
        window.rate = rate_per_second(value.saturating_sub(window.start_value), elapsed);
        window.start_value = value;
        window.start_ms = now_ms;
        window.rate
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn counter(min_interval: Duration) -> (Arc<ManualClock>, FpsCounter) {
        let clock = Arc::new(ManualClock::new(0));
        let counter = FpsCounter::with_clock(Arc::clone(&clock) as Arc<dyn Clock>, min_interval);
        (clock, counter)
    }

    #[test]
    fn test_rate_after_full_window() {
        let (clock, counter) = counter(DEFAULT_MIN_INTERVAL);
        counter.add(1024 * 10);

        clock.advance(10_000);
        assert!((counter.rate() - 1024.0).abs() < 1e-3);
        assert_eq!(counter.total(), 10_240);
    }

    #[test]
    fn test_short_window_returns_cached_rate() {
        let (clock, counter) = counter(Duration::from_secs(1));
        counter.add(50);
        clock.advance(1_000);
        assert!((counter.rate() - 50.0).abs() < 1e-3);

        counter.add(500);
        clock.advance(400);
        assert!((counter.rate() - 50.0).abs() < 1e-3);

        clock.advance(600);
        assert!((counter.rate() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_backward_clock_keeps_rate() {
        let (clock, counter) = counter(Duration::from_secs(1));
        counter.add(10);
        clock.set(2_000);
        let rate = counter.rate();
        assert!((rate - 5.0).abs() < 1e-3);

        counter.add(10);
        assert_eq!(counter.rate_at(100), rate);
    }

    #[test]
    fn test_zero_interval_still_needs_elapsed_time() {
        let (_clock, counter) = counter(Duration::ZERO);
        counter.add(10);
        assert_eq!(counter.rate(), 0.0);
    }
}
