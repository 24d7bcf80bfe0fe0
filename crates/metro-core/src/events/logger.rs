//! Event Logger
//!
//! Append-only JSONL event logging.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use metro_events::{EventType, SimEvent};

/// Writes engine events to a JSONL file, one event per line
pub struct EventLogger {
    sink: Option<(PathBuf, BufWriter<File>)>,
    written: u64,
}

impl EventLogger {
    /// Truncates `path` and starts a fresh log there.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        tracing::debug!(path = %path.display(), "event log opened");
        Ok(Self {
            sink: Some((path, BufWriter::new(file))),
            written: 0,
        })
    }

    /// A logger that only counts
    pub fn null() -> Self {
        Self { sink: None, written: 0 }
    }

    pub fn event_count(&self) -> u64 {
        self.written
    }

    pub fn log(&mut self, event: &SimEvent) -> io::Result<()> {
        if let Some((_, writer)) = &mut self.sink {
            serde_json::to_writer(&mut *writer, event)?;
            writer.write_all(b"\n")?;
        }
        self.written += 1;
        Ok(())
    }

    /// Logs a tick's events in emission order and returns how many there were.
    pub fn log_batch(&mut self, events: &[SimEvent]) -> io::Result<usize> {
        events.iter().try_for_each(|event| self.log(event))?;
        Ok(events.len())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Some((_, writer)) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            if let Some((path, _)) = &self.sink {
                tracing::warn!(path = %path.display(), error = %e, "event log not flushed");
            }
        }
    }
}

/// Events emitted during the current tick, in emission order
#[derive(Debug)]
pub struct TickEvents {
    events: Vec<SimEvent>,
    next_event_id: u64,
}

impl Default for TickEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl TickEvents {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_event_id: 1,
        }
    }

    /// Generate the next event ID
    pub fn next_id(&mut self) -> String {
        let id = metro_events::generate_event_id(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.events.iter().filter(|e| e.event_type() == event_type).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metro_events::{EventKind, SimTimestamp, StationId, WagonId};
    use std::io::BufRead;

    fn stop_event(id: String) -> SimEvent {
        SimEvent::new(
            id,
            SimTimestamp::from_tick(30),
            EventKind::WagonStopped {
                wagon: WagonId(2),
                station: StationId(1),
            },
        )
    }

    #[test]
    fn test_event_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut logger = EventLogger::new(&path).unwrap();
        let mut pending = TickEvents::new();
        let event = stop_event(pending.next_id());
        logger.log(&event).unwrap();
        logger.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 1);

        let parsed = SimEvent::from_jsonl(&lines[0]).unwrap();
        assert_eq!(parsed.event_id, "evt_00000001");
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_null_logger() {
        let mut logger = EventLogger::null();
        let batch = vec![stop_event("evt_1".to_string()), stop_event("evt_2".to_string())];
        assert_eq!(logger.log_batch(&batch).unwrap(), 2);
        assert_eq!(logger.event_count(), 2);
        logger.flush().unwrap();
    }

    #[test]
    fn test_event_id_generation() {
        let mut pending = TickEvents::new();
        assert_eq!(pending.next_id(), "evt_00000001");
        assert_eq!(pending.next_id(), "evt_00000002");
    }

    #[test]
    fn test_tick_events_drain() {
        let mut pending = TickEvents::new();
        assert!(pending.is_empty());

        let id = pending.next_id();
        pending.push(stop_event(id));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.count_of(EventType::Stop), 1);
        assert_eq!(pending.count_of(EventType::Couple), 0);

        let drained = pending.drain();
        assert_eq!(drained.len(), 1);
        assert!(pending.is_empty());
        // ids keep counting across drains
        assert_eq!(pending.next_id(), "evt_00000002");
    }
}
