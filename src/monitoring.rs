//! The frame-rate monitor: counter table, id allocator and the background
//! worker that aggregates and reports on a fixed interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use crossbeam_channel::{select, tick, Receiver, Sender};
use parking_lot::Mutex;

use crate::allocator::IdentifierAllocator;
use crate::core::{Clock, Config, FpsError, MonotonicClock, RateKey, Result};
use crate::metrics::{Aggregator, CounterHandle, CounterTable, CounterView, Cycle, Reporter};
use crate::sink::{self, LineSink, NonBlockingSink};

/// Aggregator and reporter run as one unit, by the worker or by
/// [`FpsMonitor::flush_now`].
struct Pipeline {
    aggregator: Aggregator,
    reporter: Reporter,
}

struct Shared {
    table: CounterTable,
    pipeline: Mutex<Pipeline>,
    /// Cycles only enqueue; the sink's own I/O runs on the writer thread
    sink: NonBlockingSink,
}

impl Shared {
    fn run_cycle(&self) -> Option<Cycle> {
        let mut pipeline = self.pipeline.lock();
        let cycle = pipeline.aggregator.tick(&self.table)?;
        pipeline.reporter.emit(&cycle, Local::now(), &self.sink);
        Some(cycle)
    }
}

struct Worker {
    handle: JoinHandle<()>,
    /// Dropping this wakes the worker for its final flush.
    stop: Sender<()>,
}

/// Frame-rate monitor owning its counters and report worker.
///
/// Producers share it behind an `Arc`. The worker stops on
/// [`shutdown`](Self::shutdown) or when the monitor is dropped, after one
/// last aggregation and report.
pub struct FpsMonitor {
    shared: Arc<Shared>,
    allocator: IdentifierAllocator,
    worker: Mutex<Option<Worker>>,
}

impl FpsMonitor {
    /// Monitor writing to the sink selected by `config.sink`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sink = sink::from_config(&config.sink)?;
        Self::new(config, sink)
    }

    /// Monitor writing to `sink`, timed by a monotonic clock.
    ///
    /// `sink` is called from a dedicated writer thread, never from the
    /// aggregation worker.
    pub fn new(config: &Config, sink: Arc<dyn LineSink>) -> Result<Self> {
        Self::with_clock(config, sink, Arc::new(MonotonicClock::new()))
    }

    /// Monitor with an explicit rate clock.
    ///
    /// The worker still wakes on real time; `clock` only decides how much
    /// time each rate covers.
    pub fn with_clock(config: &Config, sink: Arc<dyn LineSink>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            table: CounterTable::new(),
            pipeline: Mutex::new(Pipeline {
                aggregator: Aggregator::new(clock, config.monitor.band),
                reporter: Reporter::new(config.monitor.list_cap),
            }),
            sink: NonBlockingSink::new(sink, config.sink.queue_capacity)?,
        });

        let interval = config.monitor.interval;
        let (stop, stopped) = crossbeam_channel::bounded::<()>(1);
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("fps-monitor".to_string())
            .spawn(move || run_worker(&worker_shared, interval, &stopped))
            .map_err(|e| FpsError::worker(format!("failed to spawn report worker: {}", e)))?;

        tracing::info!(
            interval = ?interval,
            min_rate = config.monitor.band.min,
            max_rate = config.monitor.band.max,
            "Frame-rate monitor started"
        );

        Ok(Self {
            shared,
            allocator: IdentifierAllocator::new(),
            worker: Mutex::new(Some(Worker { handle, stop })),
        })
    }

    /// Count one frame for `key` in the detail report.
    #[inline]
    pub fn increment(&self, key: RateKey) -> u64 {
        self.shared.table.increment(key)
    }

    /// Count one frame for `key`, choosing whether it shows in the detail
    /// report.
    #[inline]
    pub fn increment_with(&self, key: RateKey, reportable: bool) -> u64 {
        self.shared.table.increment_with(key, reportable)
    }

    /// Register `key` and return a handle for lock-free counting.
    pub fn counter(&self, key: RateKey, reportable: bool) -> CounterHandle {
        self.shared.table.register(key, reportable)
    }

    /// Rate from the last completed cycle; `0.0` for unknown keys.
    pub fn current_rate(&self, key: RateKey) -> f32 {
        self.shared.table.last_rate(key)
    }

    /// Id for a string-keyed session; the key is registered for reporting.
    pub fn acquire_id(&self, name: &str) -> RateKey {
        let key = self.allocator.acquire(name);
        self.shared.table.register(key, true);
        key
    }

    /// Give back one use of an id from [`acquire_id`](Self::acquire_id).
    pub fn release_id(&self, key: RateKey) {
        self.allocator.release(key);
    }

    pub fn allocator(&self) -> &IdentifierAllocator {
        &self.allocator
    }

    /// Aggregate and report right now instead of waiting for the worker.
    ///
    /// Returns `None` when no time has passed since the previous cycle.
    /// Report lines are queued, not written, when this returns.
    pub fn flush_now(&self) -> Option<Cycle> {
        self.shared.run_cycle()
    }

    /// Copy of every counter in key order.
    pub fn snapshot(&self) -> Vec<CounterView> {
        self.shared.table.snapshot()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.shared.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.table.is_empty()
    }

    /// Block until every report line queued so far has reached the sink.
    pub fn wait_for_reports(&self) {
        self.shared.sink.wait();
    }

    /// Whether the report worker is still running.
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Stop the worker after a final aggregation and report, then write
    /// out the queued report lines.
    ///
    /// Safe to call any number of times, from any thread; only the first
    /// call flushes and joins.
    pub fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        drop(worker.stop);
        if worker.handle.join().is_err() {
            tracing::error!("Frame-rate report worker panicked");
        }
        self.shared.sink.close();
        tracing::info!(keys = self.len(), "Frame-rate monitor stopped");
    }
}

impl Drop for FpsMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: &Shared, interval: Duration, stopped: &Receiver<()>) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(stopped) -> _ => break,
            recv(ticker) -> _ => {
                shared.run_cycle();
            },
        }
    }
    shared.run_cycle();
}
