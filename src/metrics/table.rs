//! Concurrent key → counter table.
//!
//! One mutex guards the map structure (inserts and snapshots). Increments
//! through the table also take it; increments through a [`CounterHandle`]
//! do not. Entries are never removed, so the table only grows.

use crate::core::RateKey;
use crate::metrics::counter::{Counter, CounterHandle, CounterView};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Table of every counter the monitor knows about, ordered by key.
#[derive(Debug, Default)]
pub struct CounterTable {
    entries: Mutex<BTreeMap<RateKey, Arc<Counter>>>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event for `key`, creating a reportable entry if needed.
    #[inline]
    pub fn increment(&self, key: RateKey) -> u64 {
        self.increment_with(key, true)
    }

    /// Count one event for `key` and set its reportable flag.
    ///
    /// The flag follows the most recent caller, so a producer can switch a
    /// stream in or out of the detail report at any time.
    pub fn increment_with(&self, key: RateKey, reportable: bool) -> u64 {
        let mut entries = self.entries.lock();
        let counter = entries
            .entry(key)
            .or_insert_with(|| Arc::new(Counter::new(reportable)));
        counter.set_reportable(reportable);
        counter.increment()
    }

    /// Find or create the counter for `key` without counting.
    ///
    /// An existing entry keeps its reportable flag.
    pub fn register(&self, key: RateKey, reportable: bool) -> CounterHandle {
        let mut entries = self.entries.lock();
        let counter = entries
            .entry(key)
            .or_insert_with(|| Arc::new(Counter::new(reportable)));
        CounterHandle::new(key, Arc::clone(counter))
    }

    /// Rate from the last aggregation tick, `0.0` for unknown keys.
    ///
    /// Never inserts.
    pub fn last_rate(&self, key: RateKey) -> f32 {
        self.entries
            .lock()
            .get(&key)
            .map_or(0.0, |counter| counter.last_rate())
    }

    /// Raw count for `key`, if tracked.
    pub fn count(&self, key: RateKey) -> Option<u64> {
        self.entries.lock().get(&key).map(|counter| counter.count())
    }

    /// Consistent copy of every entry in key order.
    pub fn snapshot(&self) -> Vec<CounterView> {
        self.entries
            .lock()
            .iter()
            .map(|(key, counter)| counter.view(*key))
            .collect()
    }

    /// Run `f` over every entry while holding the table lock.
    pub(crate) fn with_entries<R>(&self, f: impl FnOnce(&BTreeMap<RateKey, Arc<Counter>>) -> R) -> R {
        f(&self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
