//! Report line sinks.
//!
//! The reporter only needs "append this line to the detail or summary
//! stream". Everything about where lines end up (files, rotation,
//! forwarding to the log) lives behind [`LineSink`].

mod file;
mod queued;

pub use file::FileSink;
pub use queued::NonBlockingSink;

use crate::core::config::{SinkConfig, SinkKind};
use crate::core::Result;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Which report stream a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkId {
    /// Per-key rate columns
    Detail,
    /// Totals plus valid/invalid lists
    Summary,
}

impl SinkId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkId::Detail => "detail",
            SinkId::Summary => "summary",
        }
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for formatted report lines.
///
/// Implementations should return quickly; the reporter calls this from the
/// aggregation worker and ignores failures.
pub trait LineSink: Send + Sync {
    /// Append one line of text to the given stream.
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()>;
}

impl<T: LineSink + ?Sized> LineSink for Arc<T> {
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()> {
        (**self).write_line(sink, text)
    }
}

/// Build the stock sink selected by `config`.
pub fn from_config(config: &SinkConfig) -> Result<Arc<dyn LineSink>> {
    let sink: Arc<dyn LineSink> = match config.kind {
        SinkKind::File => Arc::new(FileSink::open(config)?),
        SinkKind::Tracing => Arc::new(TracingSink),
        SinkKind::Null => Arc::new(NullSink),
    };
    Ok(sink)
}

/// Forwards every line to `tracing` under the `fpsmon::report` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()> {
        tracing::info!(target: "fpsmon::report", sink = sink.as_str(), "{}", text);
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LineSink for NullSink {
    fn write_line(&self, _sink: SinkId, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Keeps every line in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(SinkId, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written to one stream.
    pub fn lines(&self, sink: SinkId) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(id, _)| *id == sink)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()> {
        self.lines.lock().push((sink, text.to_string()));
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_separates_streams() {
        let sink = MemorySink::new();
        sink.write_line(SinkId::Detail, "a").unwrap();
        sink.write_line(SinkId::Summary, "b").unwrap();
        sink.write_line(SinkId::Detail, "c").unwrap();

        assert_eq!(sink.lines(SinkId::Detail), vec!["a", "c"]);
        assert_eq!(sink.lines(SinkId::Summary), vec!["b"]);
        assert_eq!(sink.len(), 3);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_shared_sink_through_arc() {
        let sink = Arc::new(MemorySink::new());
        let as_dyn: Arc<dyn LineSink> = Arc::clone(&sink) as Arc<dyn LineSink>;
        as_dyn.write_line(SinkId::Summary, "total").unwrap();
        assert_eq!(sink.lines(SinkId::Summary), vec!["total"]);
    }

    #[test]
    fn test_sink_names() {
        assert_eq!(SinkId::Detail.to_string(), "detail");
        assert_eq!(SinkId::Summary.to_string(), "summary");
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_lines() {
        assert!(NullSink.write_line(SinkId::Detail, "x").is_ok());
        assert!(TracingSink.write_line(SinkId::Summary, "y").is_ok());
    }
}
