//! Destinations for report events.

use std::io::Write;

use tracing::{debug, warn};

use crate::event::DiffEvent;

/// Receives report events as they happen.
///
/// Sinks are infallible from the engine's point of view: a sink that cannot
/// deliver a line must deal with it itself.
pub trait DiffSink: Send {
    fn emit(&mut self, event: &DiffEvent);
}

impl DiffSink for Vec<DiffEvent> {
    fn emit(&mut self, event: &DiffEvent) {
        self.push(event.clone());
    }
}

/// Writes one rendered line per event.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DiffSink for WriterSink<W> {
    fn emit(&mut self, event: &DiffEvent) {
        let result = writeln!(self.writer, "{event}").and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!("Failed to write report line: {}", e);
        }
    }
}

/// Logs every event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiffSink for TracingSink {
    fn emit(&mut self, event: &DiffEvent) {
        debug!(target: "id_diff::report", "{}", event);
    }
}

/// Forwards every event to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: DiffSink, B: DiffSink> DiffSink for Tee<A, B> {
    fn emit(&mut self, event: &DiffEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Records rendered lines while forwarding events to another sink.
pub(crate) struct Recording<'a> {
    inner: &'a mut dyn DiffSink,
    lines: Vec<String>,
}

impl<'a> Recording<'a> {
    pub(crate) fn new(inner: &'a mut dyn DiffSink) -> Self {
        Self {
            inner,
            lines: Vec::new(),
        }
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl DiffSink for Recording<'_> {
    fn emit(&mut self, event: &DiffEvent) {
        self.lines.push(event.to_string());
        self.inner.emit(event);
    }
}
