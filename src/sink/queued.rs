//! Off-thread delivery of report lines.
//!
//! The aggregation worker only enqueues. A dedicated writer thread owns the
//! wrapped sink and does the actual I/O, so a slow disk delays the report
//! files but never the next cycle. When the queue is full the line is
//! dropped instead of waited on.

use super::{LineSink, SinkId};
use crate::core::{FpsError, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum Message {
    Line(SinkId, String),
    /// Acknowledged once every earlier line has been handed to the sink
    Barrier(Sender<()>),
}

struct Writer {
    queue: Sender<Message>,
    handle: JoinHandle<()>,
}

/// Wraps a sink so `write_line` never blocks on it.
///
/// Lines still queued at [`close`](Self::close) are written before the
/// writer thread exits. Dropping the sink closes it.
pub struct NonBlockingSink {
    writer: Mutex<Option<Writer>>,
}

impl NonBlockingSink {
    /// Start a writer thread feeding `inner` from a queue of `capacity`
    /// lines.
    pub fn new(inner: Arc<dyn LineSink>, capacity: usize) -> Result<Self> {
        let (queue, messages) = bounded::<Message>(capacity.max(1));

        let handle = thread::Builder::new()
            .name("fps-report-writer".to_string())
            .spawn(move || {
                let mut failing = false;
                for message in messages {
                    match message {
                        Message::Line(id, text) => match inner.write_line(id, &text) {
                            Ok(()) if failing => {
                                failing = false;
                                tracing::info!(sink = id.as_str(), "Report sink recovered");
                            },
                            Ok(()) => {},
                            Err(e) => {
                                if !failing {
                                    failing = true;
                                    tracing::warn!(
                                        sink = id.as_str(),
                                        category = e.category(),
                                        error = %e,
                                        "Report sink failing, dropping lines"
                                    );
                                }
                                tracing::debug!(sink = id.as_str(), error = %e, "Dropped report line");
                            },
                        },
                        Message::Barrier(ack) => {
                            let _ = ack.send(());
                        },
                    }
                }
            })
            .map_err(|e| FpsError::worker(format!("failed to spawn report writer: {}", e)))?;

        Ok(Self {
            writer: Mutex::new(Some(Writer { queue, handle })),
        })
    }

    /// Block until every line queued before this call has reached the
    /// wrapped sink. Returns at once if the sink is closed.
    pub fn wait(&self) {
        let Some(queue) = self.writer.lock().as_ref().map(|w| w.queue.clone()) else {
            return;
        };
        let (ack, acked) = bounded(1);
        if queue.send(Message::Barrier(ack)).is_ok() {
            let _ = acked.recv();
        }
    }

    /// Write out the remaining queue and stop the writer thread.
    ///
    /// Later writes fail. Only the first call waits for the writer.
    pub fn close(&self) {
        let Some(writer) = self.writer.lock().take() else {
            return;
        };

        drop(writer.queue);
        if writer.handle.join().is_err() {
            tracing::error!("Report writer panicked");
        }
    }
}

impl LineSink for NonBlockingSink {
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()> {
        let writer = self.writer.lock();
        let Some(writer) = writer.as_ref() else {
            return Err(FpsError::sink("report writer closed"));
        };

        writer
            .queue
            .try_send(Message::Line(sink, text.to_string()))
            .map_err(|e| match e {
                TrySendError::Full(_) => FpsError::sink("report queue full"),
                TrySendError::Disconnected(_) => FpsError::sink("report writer stopped"),
            })
    }
}

impl Drop for NonBlockingSink {
    fn drop(&mut self) {
        self.close();
    }
}
