//! Per-key counter state.
//!
//! All fields are atomics so producers holding a [`CounterHandle`] can
//! count without touching the table lock. `previous_count` and `last_rate`
//! are only written by the aggregator while it holds the table lock.

use crate::core::RateKey;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// One tracked stream.
#[derive(Debug)]
pub struct Counter {
    count: AtomicU64,
    previous_count: AtomicU64,
    /// `f32` bits
    last_rate: AtomicU32,
    reportable: AtomicBool,
}

impl Counter {
    pub fn new(reportable: bool) -> Self {
        Self {
            count: AtomicU64::new(0),
            previous_count: AtomicU64::new(0),
            last_rate: AtomicU32::new(0.0f32.to_bits()),
            reportable: AtomicBool::new(reportable),
        }
    }

    /// Add one and return the new total.
    #[inline(always)]
    pub fn increment(&self) -> u64 {
        self.add(1)
    }

    /// Add `n` and return the new total.
    #[inline(always)]
    pub fn add(&self, n: u64) -> u64 {
        self.count.fetch_add(n, Ordering::AcqRel) + n
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn previous_count(&self) -> u64 {
        self.previous_count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn last_rate(&self) -> f32 {
        f32::from_bits(self.last_rate.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_reportable(&self) -> bool {
        self.reportable.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_reportable(&self, reportable: bool) {
        self.reportable.store(reportable, Ordering::Relaxed);
    }

    /// Close the current interval: derive the rate from the count delta and
    /// make the observed count the new baseline.
    ///
    /// `count` is read exactly once, so an increment racing with this call
    /// lands either in this interval or the next one, never both.
    pub(crate) fn roll(&self, elapsed_ms: u64) -> f32 {
        let count = self.count();
        let delta = count.saturating_sub(self.previous_count());
        let rate = rate_per_second(delta, elapsed_ms);
        self.previous_count.store(count, Ordering::Release);
        self.last_rate.store(rate.to_bits(), Ordering::Release);
        rate
    }

    /// Point-in-time copy of the fields.
    pub fn view(&self, key: RateKey) -> CounterView {
        CounterView {
            key,
            count: self.count(),
            previous_count: self.previous_count(),
            last_rate: self.last_rate(),
            reportable: self.is_reportable(),
        }
    }
}

/// Events per second given a count delta over `elapsed_ms` milliseconds.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn rate_per_second(delta: u64, elapsed_ms: u64) -> f32 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    (delta as f64 * 1000.0 / elapsed_ms as f64) as f32
}

/// Read-only copy of a counter, detached from the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterView {
    pub key: RateKey,
    pub count: u64,
    pub previous_count: u64,
    pub last_rate: f32,
    pub reportable: bool,
}

/// Shared handle to a registered counter.
///
/// Increments through a handle skip the table lookup entirely, which is
/// how long-lived producers are expected to count.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    key: RateKey,
    counter: Arc<Counter>,
}

impl CounterHandle {
    pub(crate) fn new(key: RateKey, counter: Arc<Counter>) -> Self {
        Self { key, counter }
    }

    pub fn key(&self) -> RateKey {
        self.key
    }

    #[inline(always)]
    pub fn increment(&self) -> u64 {
        self.counter.increment()
    }

    #[inline(always)]
    pub fn add(&self, n: u64) -> u64 {
        self.counter.add(n)
    }

    pub fn count(&self) -> u64 {
        self.counter.count()
    }

    /// Rate computed at the last aggregation tick.
    pub fn rate(&self) -> f32 {
        self.counter.last_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counter_is_zeroed() {
        let counter = Counter::new(true);
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.previous_count(), 0);
        assert_eq!(counter.last_rate(), 0.0);
        assert!(counter.is_reportable());
    }

    #[test]
    fn test_increment_returns_new_total() {
        let counter = Counter::new(false);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.add(10), 12);
    }

    #[test]
    fn test_roll_computes_rate_and_rebases() {
        let counter = Counter::new(true);
        counter.add(250);

        let rate = counter.roll(10_000);
        assert!((rate - 25.0).abs() < 1e-4);
        assert_eq!(counter.previous_count(), 250);
        assert_eq!(counter.last_rate(), rate);

        // Nothing new: rate drops to zero, baseline unchanged
        assert_eq!(counter.roll(10_000), 0.0);
        assert_eq!(counter.previous_count(), 250);
    }

    #[test]
    fn test_rate_per_second() {
        assert!((rate_per_second(100, 1000) - 100.0).abs() < 1e-4);
        assert!((rate_per_second(3, 1500) - 2.0).abs() < 1e-4);
        assert_eq!(rate_per_second(42, 0), 0.0);
    }

    #[test]
    fn test_handle_shares_counter() {
        let counter = Arc::new(Counter::new(true));
        let handle = CounterHandle::new(RateKey::new(0, 1, 0), Arc::clone(&counter));
        let other = handle.clone();

        handle.increment();
        other.add(4);
        assert_eq!(counter.count(), 5);
        assert_eq!(handle.count(), 5);
        assert_eq!(handle.key(), RateKey::new(0, 1, 0));
    }
}
