use std::cell::Cell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::warn;

use super::Event;
use crate::error::{AdapterError, Result};
use crate::model::locale::LocaleId;
use crate::services::encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
}

/// Raw input plus what is known about it before tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub input: RawInput,
    /// Encoding label, or `auto` to detect it.
    pub encoding: String,
    pub source_locale: LocaleId,
    pub target_locale: Option<LocaleId>,
}

impl RawDocument {
    pub fn new(input: RawInput, encoding: impl Into<String>, source_locale: LocaleId) -> Self {
        RawDocument {
            input,
            encoding: encoding.into(),
            source_locale,
            target_locale: None,
        }
    }

    pub fn with_target_locale(mut self, locale: LocaleId) -> Self {
        self.target_locale = Some(locale);
        self
    }

    /// Reads and decodes the whole input.
    pub fn read_text(&self) -> Result<String> {
        match &self.input {
            RawInput::Text(text) => Ok(text.clone()),
            RawInput::Bytes(bytes) => encoding::decode(bytes, &self.encoding),
            RawInput::Path(path) => {
                let bytes = fs::read(path).map_err(|e| {
                    AdapterError::io(format!("failed to read {}", path.display()), e)
                })?;
                encoding::decode(&bytes, &self.encoding)
            }
        }
    }
}

/// Produces the structural events of one raw document.
///
/// A source is opened, drained, and closed exactly once per invocation.
pub trait EventSource {
    fn open(&mut self, doc: &RawDocument) -> Result<()>;

    fn next_event(&mut self) -> Option<Result<Event>>;

    fn close(&mut self);
}

/// Consumes events in read order and serializes them.
pub trait EventSink {
    fn handle_event(&mut self, event: &Event) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// An opened source, closed when dropped.
pub struct OpenSource<'a> {
    source: &'a mut dyn EventSource,
}

impl<'a> OpenSource<'a> {
    pub fn open(source: &'a mut dyn EventSource, doc: &RawDocument) -> Result<Self> {
        let guard = OpenSource { source };
        guard.source.open(doc)?;
        Ok(guard)
    }
}

impl Iterator for OpenSource<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_event()
    }
}

impl Drop for OpenSource<'_> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Closes the sink on every exit path; `finish` reports the close result.
pub struct SinkGuard<'a> {
    sink: &'a mut dyn EventSink,
    closed: bool,
}

impl<'a> SinkGuard<'a> {
    pub fn new(sink: &'a mut dyn EventSink) -> Self {
        SinkGuard { sink, closed: false }
    }

    pub fn handle(&mut self, event: &Event) -> Result<()> {
        self.sink.handle_event(event)
    }

    pub fn finish(mut self) -> Result<()> {
        self.closed = true;
        self.sink.close()
    }
}

impl Drop for SinkGuard<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.sink.close() {
                warn!("failed to close writer after aborted generation: {e}");
            }
        }
    }
}

/// Replays a prepared event sequence, ignoring the raw document.
///
/// The open and close counters are shared, so clones handed out before the
/// source is boxed keep observing it.
#[derive(Debug, Default)]
pub struct VecSource {
    prepared: Vec<Result<Event>>,
    queue: VecDeque<Result<Event>>,
    pub open_count: Rc<Cell<usize>>,
    pub close_count: Rc<Cell<usize>>,
}

impl VecSource {
    pub fn new(events: Vec<Event>) -> Self {
        VecSource {
            prepared: events.into_iter().map(Ok).collect(),
            ..VecSource::default()
        }
    }

    /// Appends a failure to the replayed sequence.
    pub fn fail_with(mut self, err: AdapterError) -> Self {
        self.prepared.push(Err(err));
        self
    }
}

impl EventSource for VecSource {
    fn open(&mut self, _doc: &RawDocument) -> Result<()> {
        self.open_count.set(self.open_count.get() + 1);
        self.queue = self.prepared.drain(..).collect();
        Ok(())
    }

    fn next_event(&mut self) -> Option<Result<Event>> {
        self.queue.pop_front()
    }

    fn close(&mut self) {
        self.close_count.set(self.close_count.get() + 1);
        self.queue.clear();
    }
}

/// Keeps every handled event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<Event>,
    pub closed: bool,
}

impl EventSink for CollectingSink {
    fn handle_event(&mut self, event: &Event) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> RawDocument {
        RawDocument::new(RawInput::Text(String::new()), "UTF-8", LocaleId::empty())
    }

    #[test]
    fn source_is_closed_when_iteration_stops_early() {
        let mut source = VecSource::new(vec![Event::Other("a".into()), Event::Other("b".into())]);
        {
            let mut open = OpenSource::open(&mut source, &doc()).unwrap();
            assert!(open.next().is_some());
        }
        assert_eq!(source.open_count.get(), 1);
        assert_eq!(source.close_count.get(), 1);
    }

    #[test]
    fn sink_guard_closes_on_drop_and_on_finish() {
        let mut sink = CollectingSink::default();
        {
            let mut guard = SinkGuard::new(&mut sink);
            guard.handle(&Event::Other("x".into())).unwrap();
        }
        assert!(sink.closed);

        let mut sink = CollectingSink::default();
        SinkGuard::new(&mut sink).finish().unwrap();
        assert!(sink.closed);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawDocument::new(
            RawInput::Path(dir.path().join("missing.ts")),
            "UTF-8",
            LocaleId::empty(),
        );
        assert!(matches!(raw.read_text(), Err(AdapterError::Io { .. })));
    }
}
