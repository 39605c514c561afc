//! End-to-end monitor behaviour: counting, rates, reports and shutdown.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{assert_rate, TestMonitor};
use fpsmon_lib::core::{Clock, ConfigBuilder, ManualClock, RateBand, RateKey, SinkKind};
use fpsmon_lib::monitoring::FpsMonitor;
use fpsmon_lib::sink::{LineSink, MemorySink, SinkId};
use parking_lot::Mutex;

#[test]
fn test_hundred_frames_in_one_second() {
    let t = TestMonitor::new();
    let key = RateKey::new(0, 1, 0);
    for _ in 0..100 {
        t.monitor.increment(key);
    }

    t.cycle_after(1_000);
    assert_rate(t.monitor.current_rate(key), 100.0);

    // A quiet interval drops the rate to zero
    t.cycle_after(1_000);
    assert_rate(t.monitor.current_rate(key), 0.0);
}

#[test]
fn test_rate_matches_delta_over_elapsed() {
    let t = TestMonitor::new();
    let handle = t.monitor.counter(RateKey::new(0, 2, 0), true);

    handle.add(30);
    t.cycle_after(1_500);
    assert_rate(handle.rate(), 20.0);

    handle.add(7);
    t.cycle_after(700);
    assert_rate(handle.rate(), 10.0);
}

#[test]
fn test_unknown_key_rate_is_zero_and_not_created() {
    let t = TestMonitor::new();
    assert_eq!(t.monitor.current_rate(RateKey::new(3, 3, 3)), 0.0);
    assert!(t.monitor.is_empty());

    t.cycle_after(1_000);
    assert!(t.monitor.snapshot().is_empty());
}

#[test]
fn test_no_elapsed_time_means_no_cycle() {
    let t = TestMonitor::new();
    t.monitor.increment(RateKey::new(0, 1, 0));

    assert!(t.monitor.flush_now().is_none());
    t.monitor.wait_for_reports();
    assert!(t.sink.is_empty());

    let view = t.monitor.snapshot()[0];
    assert_eq!(view.previous_count, 0);
    assert_eq!(view.last_rate, 0.0);
}

#[test]
fn test_clock_going_backwards_skips_cycle() {
    let t = TestMonitor::new();
    let key = RateKey::new(0, 1, 0);
    for _ in 0..10 {
        t.monitor.increment(key);
    }
    t.cycle_after(1_000);

    t.monitor.increment(key);
    t.clock.set(200);
    assert!(t.monitor.flush_now().is_none());
    assert_rate(t.monitor.current_rate(key), 10.0);
    assert_eq!(t.monitor.snapshot()[0].previous_count, 10);
}

#[test]
fn test_report_lines_for_valid_and_invalid_streams() {
    let t = TestMonitor::with_band(RateBand::STRICT_30);
    let good = t.monitor.counter(RateKey::new(0, 1, 0), true);
    let slow = t.monitor.counter(RateKey::new(0, 1, 1), true);
    good.add(250);
    slow.add(20);

    t.cycle_after(10_000);

    let summary = t.summary();
    assert!(summary.contains(&"Total channels (x2) 2".to_string()));
    assert!(summary
        .iter()
        .any(|l| l.ends_with(" Valid   (x2) (0001) : 0000.0001.0000|")));
    assert!(summary
        .iter()
        .any(|l| l.ends_with(" Invalid (x2) (0001) : 0000.0001.0001|")));
    assert!(summary.last().unwrap().ends_with(" --------------"));

    let data = t.detail().pop().unwrap();
    assert!(data.contains(" 0000.0001.0000      25.0|"));
    assert!(data.contains(" 0000.0001.0001       2.0|"));
}

#[test]
fn test_hidden_streams_only_count_toward_total() {
    let t = TestMonitor::new();
    t.monitor.increment_with(RateKey::new(0, 1, 0), false);
    t.monitor.increment(RateKey::new(0, 2, 0));

    t.cycle_after(1_000);

    assert!(t.summary().contains(&"Total channels (x2) 2".to_string()));
    let data = t.detail().pop().unwrap();
    assert!(!data.contains("0000.0001.0000"));
    assert!(data.contains("0000.0002.0000"));
}

#[test]
fn test_header_repeats_when_streams_appear() {
    let t = TestMonitor::new();
    t.monitor.increment(RateKey::new(0, 1, 0));
    t.cycle_after(1_000);
    t.cycle_after(1_000);

    let totals = |t: &TestMonitor| {
        t.summary()
            .iter()
            .filter(|l| l.starts_with("Total channels"))
            .count()
    };
    assert_eq!(totals(&t), 1);

    t.monitor.increment(RateKey::new(0, 2, 0));
    t.cycle_after(1_000);
    assert_eq!(totals(&t), 2);
    assert!(t.summary().contains(&"Total channels (x2) 2".to_string()));
}

#[test]
fn test_key_list_omitted_at_cap() {
    let t = TestMonitor::build(RateBand::RELAXED, 2);
    for group in 1..=2 {
        t.monitor.increment(RateKey::new(0, group, 0));
    }
    t.cycle_after(1_000);

    assert!(t
        .summary()
        .iter()
        .any(|l| l.ends_with(" Invalid (x2) (0002) ")));
}

#[test]
fn test_shutdown_flushes_final_interval() {
    let t = TestMonitor::new();
    let key = RateKey::new(0, 1, 0);
    for _ in 0..40 {
        t.monitor.increment(key);
    }
    t.clock.advance(2_000);

    t.monitor.shutdown();
    assert!(!t.monitor.is_running());
    assert_rate(t.monitor.current_rate(key), 20.0);

    // Repeated shutdown neither flushes again nor blocks
    t.clock.advance(1_000);
    t.monitor.shutdown();
    let separators = t
        .summary()
        .iter()
        .filter(|l| l.ends_with("--------------"))
        .count();
    assert_eq!(separators, 1);
}

#[test]
fn test_session_ids_feed_the_report() {
    let t = TestMonitor::new();
    let first = t.monitor.acquire_id("10.1.1.5:554");
    let second = t.monitor.acquire_id("10.1.1.5:554");
    assert_eq!(first, RateKey::new(0, 1, 0));
    assert_eq!(second, RateKey::new(0, 1, 1));

    // Sessions sharing the string share the reporting bucket
    for _ in 0..15 {
        t.monitor.increment(first);
    }
    t.cycle_after(1_000);
    assert_rate(t.monitor.current_rate(first), 15.0);

    t.monitor.release_id(second);
    t.monitor.release_id(first);
    assert!(t.monitor.allocator().binding("10.1.1.5:554").unwrap().retired);

    assert_eq!(t.monitor.acquire_id("10.1.1.5:554"), first);
}

/// Sink whose writes wait until the test opens the gate.
#[derive(Default)]
struct GatedSink {
    gate: Mutex<()>,
    lines: MemorySink,
}

impl LineSink for GatedSink {
    fn write_line(&self, id: SinkId, text: &str) -> fpsmon_lib::Result<()> {
        let _open = self.gate.lock();
        self.lines.write_line(id, text)
    }
}

#[test]
fn test_worker_keeps_cycling_while_sink_is_stuck() {
    let config = ConfigBuilder::new()
        .interval(Duration::from_millis(20))
        .sink_kind(SinkKind::Null)
        .build()
        .unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let sink = Arc::new(GatedSink::default());
    let closed = sink.gate.lock();
    let monitor = FpsMonitor::with_clock(
        &config,
        Arc::clone(&sink) as Arc<dyn LineSink>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .unwrap();

    let key = RateKey::new(0, 1, 0);
    let handle = monitor.counter(key, true);
    let deadline = Instant::now() + Duration::from_secs(10);

    // Each step is one worker cycle; its rate only appears once the cycle ran
    for frames in 1..=5u64 {
        handle.add(frames);
        clock.advance(1_000);
        while (monitor.current_rate(key) - frames as f32).abs() > 1e-3 {
            assert!(Instant::now() < deadline, "worker stalled at step {}", frames);
            std::thread::sleep(Duration::from_millis(2));
        }
    }
    assert!(sink.lines.is_empty());

    drop(closed);
    monitor.shutdown();
    let separators = sink
        .lines
        .lines(SinkId::Summary)
        .iter()
        .filter(|l| l.ends_with("--------------"))
        .count();
    assert!(separators >= 5, "only {} reports written", separators);
}
