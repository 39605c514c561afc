//! Periodic rate computation.
//!
//! Each tick turns the count accumulated since the previous tick into a
//! per-second rate for every entry, then classifies reportable entries
//! against the configured [`RateBand`].

use crate::core::{Clock, RateBand, RateKey};
use crate::metrics::counter::CounterView;
use crate::metrics::table::CounterTable;
use std::sync::Arc;

/// Computes rates from a [`CounterTable`] on demand.
pub struct Aggregator {
    clock: Arc<dyn Clock>,
    band: RateBand,
    last_tick_ms: u64,
}

/// Everything one tick produced, ready for the reporter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cycle {
    /// Post-tick state of every entry, in key order
    pub entries: Vec<CounterView>,
    /// Reportable keys whose rate is inside the band
    pub valid: Vec<RateKey>,
    /// Reportable keys whose rate is outside the band
    pub invalid: Vec<RateKey>,
    /// Length of the interval the rates cover
    pub elapsed_ms: u64,
}

impl Cycle {
    /// Number of tracked keys, reportable or not.
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Entries that appear in the detail report.
    pub fn reportable(&self) -> impl Iterator<Item = &CounterView> {
        self.entries.iter().filter(|entry| entry.reportable)
    }
}

impl Aggregator {
    /// Start the first interval at the clock's current reading.
    pub fn new(clock: Arc<dyn Clock>, band: RateBand) -> Self {
        let last_tick_ms = clock.now_ms();
        Self {
            clock,
            band,
            last_tick_ms,
        }
    }

    /// Clock reading at the end of the last successful tick.
    pub fn last_tick_ms(&self) -> u64 {
        self.last_tick_ms
    }

    /// Close the current interval.
    ///
    /// Returns `None` and leaves every counter untouched when no time has
    /// passed since the last tick or the clock went backwards.
    pub fn tick(&mut self, table: &CounterTable) -> Option<Cycle> {
        let now = self.clock.now_ms();
        let elapsed_ms = match now.checked_sub(self.last_tick_ms) {
            Some(elapsed) if elapsed > 0 => elapsed,
            _ => {
                tracing::debug!(
                    now_ms = now,
                    last_tick_ms = self.last_tick_ms,
                    "Skipping aggregation tick, no time elapsed"
                );
                return None;
            },
        };

        let band = self.band;
        let cycle = table.with_entries(|entries| {
            let mut cycle = Cycle {
                entries: Vec::with_capacity(entries.len()),
                elapsed_ms,
                ..Cycle::default()
            };

            for (key, counter) in entries {
                let rate = counter.roll(elapsed_ms);
                let view = counter.view(*key);
                if view.reportable {
                    if band.contains(rate) {
                        cycle.valid.push(*key);
                    } else {
                        cycle.invalid.push(*key);
                    }
                }
                cycle.entries.push(view);
            }
            cycle
        });

        self.last_tick_ms = now;
        tracing::debug!(
            elapsed_ms,
            total = cycle.total(),
            valid = cycle.valid.len(),
            invalid = cycle.invalid.len(),
            "Aggregation tick complete"
        );
        Some(cycle)
    }
}
