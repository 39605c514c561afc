//! Text report formatting.
//!
//! Line layouts are consumed by existing log parsers and must not drift:
//!
//! ```text
//! detail:  Time     App .Chn .Thr        Fps|Time     App .Chn .Thr        Fps|
//!          24-03-05 0000.0001.0000       fps|24-03-05 0000.0001.0001       fps|
//!          12:00:10 0000.0001.0000      25.0|12:00:10 0000.0001.0001       9.8|
//! summary: Total channels (x2) 2
//!          12:00:10 Valid   (x2) (0001) : 0000.0001.0000|
//!          12:00:10 Invalid (x2) (0001) : 0000.0001.0001|
//!          12:00:10 --------------
//! ```

use crate::core::RateKey;
use crate::metrics::aggregator::Cycle;
use crate::metrics::counter::CounterView;
use crate::sink::{LineSink, SinkId};
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;

const BANNER_WIDTH: usize = 80;
const COLUMN_HEADER: &str = "Time     App .Chn .Thr        Fps|";

/// Turns aggregation cycles into report lines.
///
/// The only state is the key count seen at the last header, so a fresh
/// header goes out whenever streams appear.
#[derive(Debug, Clone)]
pub struct Reporter {
    list_cap: usize,
    header_key_count: Option<usize>,
}

impl Reporter {
    pub fn new(list_cap: usize) -> Self {
        Self {
            list_cap,
            header_key_count: None,
        }
    }

    /// Format `cycle` and push every line to `sink`.
    ///
    /// Sink failures are logged and dropped. Returns the number of lines
    /// the sink rejected.
    pub fn emit(&mut self, cycle: &Cycle, now: DateTime<Local>, sink: &dyn LineSink) -> usize {
        let mut dropped = 0;
        for (id, line) in self.render(cycle, now) {
            if let Err(e) = sink.write_line(id, &line) {
                tracing::debug!(sink = id.as_str(), error = %e, "Dropped report line");
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "Report sink rejected lines this cycle");
        }
        dropped
    }

    /// All lines for one cycle, in write order.
    pub fn render(&mut self, cycle: &Cycle, now: DateTime<Local>) -> Vec<(SinkId, String)> {
        let time = now.format("%H:%M:%S").to_string();
        let mut lines = Vec::new();

        if self.header_key_count != Some(cycle.total()) {
            self.header_key_count = Some(cycle.total());
            self.render_header(cycle, now, &mut lines);
        }

        let data = data_line(&time, cycle.reportable());
        if !data.is_empty() {
            lines.push((SinkId::Detail, data));
        }

        lines.push((
            SinkId::Summary,
            summary_line(&time, "Valid", &cycle.valid, self.list_cap),
        ));
        lines.push((
            SinkId::Summary,
            summary_line(&time, "Invalid", &cycle.invalid, self.list_cap),
        ));
        lines.push((SinkId::Summary, separator_line(&time)));
        lines
    }

    fn render_header(&self, cycle: &Cycle, now: DateTime<Local>, lines: &mut Vec<(SinkId, String)>) {
        let banner = banner(now.with_timezone(&Utc));
        let keys: Vec<RateKey> = cycle.reportable().map(|entry| entry.key).collect();

        if !keys.is_empty() {
            let date = now.format("%y-%m-%d").to_string();
            for line in &banner {
                lines.push((SinkId::Detail, line.clone()));
            }
            lines.push((SinkId::Detail, header_line(keys.len())));
            lines.push((SinkId::Detail, label_line(&date, &keys)));
        }

        for line in banner {
            lines.push((SinkId::Summary, line));
        }
        lines.push((SinkId::Summary, total_line(cycle.total())));
    }
}

/// Three-line box holding the UTC timestamp, opening each header block.
pub fn banner(now: DateTime<Utc>) -> [String; 3] {
    let rule = "─".repeat(BANNER_WIDTH);
    let stamp = now.format("UTC: %Y-%m-%d %H:%M:%S").to_string();
    [
        format!("┌{}┐", rule),
        format!("│{:^width$}│", stamp, width = BANNER_WIDTH),
        format!("└{}┘", rule),
    ]
}

/// One column header block per reportable key.
pub fn header_line(columns: usize) -> String {
    COLUMN_HEADER.repeat(columns)
}

/// Names each column under the header.
pub fn label_line(time: &str, keys: &[RateKey]) -> String {
    let mut line = String::new();
    for key in keys {
        let _ = write!(line, "{} {}       fps|", time, key);
    }
    line
}

/// Rate columns, one decimal place, right-aligned to nine characters.
pub fn data_line<'a>(time: &str, entries: impl IntoIterator<Item = &'a CounterView>) -> String {
    let mut line = String::new();
    for entry in entries {
        let _ = write!(line, "{} {} {:>9.1}|", time, entry.key, entry.last_rate);
    }
    line
}

/// `Valid`/`Invalid` count, followed by the keys while `0 < N < cap`.
pub fn summary_line(time: &str, label: &str, keys: &[RateKey], cap: usize) -> String {
    let mut line = format!("{} {:<7} (x2) ({:04}) ", time, label, keys.len());
    if !keys.is_empty() && keys.len() < cap {
        line.push(':');
        for key in keys {
            let _ = write!(line, " {}|", key);
        }
    }
    line
}

pub fn total_line(total: usize) -> String {
    format!("Total channels (x2) {}", total)
}

/// Closes one reporting cycle in the summary.
pub fn separator_line(time: &str) -> String {
    format!("{} --------------", time)
}
