//! Event Types
//!
//! Discrete engine events: wagon life-cycle transitions, platform exchanges
//! and demand generation. Events are emitted by the engine each tick and
//! written one per line by the event logger.

use serde::{Deserialize, Serialize};

use crate::{PassengerId, SimTimestamp, StationId, TrainId, WagonId};

/// Primary event type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Decouple,
    Stop,
    Departure,
    Couple,
    Alighting,
    Boarding,
    Demand,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Decouple,
            EventType::Stop,
            EventType::Departure,
            EventType::Couple,
            EventType::Alighting,
            EventType::Boarding,
            EventType::Demand,
        ]
    }
}

/// What happened, with the entities involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// The trailing wagon of a train crossed a decouple point.
    WagonDecoupled {
        wagon: WagonId,
        train: TrainId,
        station: StationId,
        /// Station the wagon had been assigned to serve
        assigned_station: StationId,
    },
    /// A decelerating wagon came to rest at the platform.
    WagonStopped { wagon: WagonId, station: StationId },
    /// A waiting wagon saw the recouple trigger and began accelerating.
    WagonDeparting {
        wagon: WagonId,
        station: StationId,
        dwell_ticks: u64,
    },
    /// A wagon reached line speed and joined the front of a train.
    WagonCoupled {
        wagon: WagonId,
        train: TrainId,
        station: StationId,
        assigned_station: StationId,
        passengers: usize,
    },
    /// Passengers left a waiting wagon.
    PassengersAlighted {
        wagon: WagonId,
        station: StationId,
        arrived: Vec<PassengerId>,
        failed: Vec<PassengerId>,
    },
    /// Passengers boarded a waiting wagon.
    PassengersBoarded {
        wagon: WagonId,
        station: StationId,
        passengers: Vec<PassengerId>,
    },
    /// New passengers appeared on a platform.
    DemandGenerated {
        station: StationId,
        generated: usize,
        discarded: usize,
    },
}

impl EventKind {
    /// Returns the category of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::WagonDecoupled { .. } => EventType::Decouple,
            EventKind::WagonStopped { .. } => EventType::Stop,
            EventKind::WagonDeparting { .. } => EventType::Departure,
            EventKind::WagonCoupled { .. } => EventType::Couple,
            EventKind::PassengersAlighted { .. } => EventType::Alighting,
            EventKind::PassengersBoarded { .. } => EventType::Boarding,
            EventKind::DemandGenerated { .. } => EventType::Demand,
        }
    }

    /// Returns the station involved in this event.
    pub fn station(&self) -> StationId {
        match self {
            EventKind::WagonDecoupled { station, .. }
            | EventKind::WagonStopped { station, .. }
            | EventKind::WagonDeparting { station, .. }
            | EventKind::WagonCoupled { station, .. }
            | EventKind::PassengersAlighted { station, .. }
            | EventKind::PassengersBoarded { station, .. }
            | EventKind::DemandGenerated { station, .. } => *station,
        }
    }
}

/// A single engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Unique identifier (e.g., "evt_00042371")
    pub event_id: String,
    /// When the event occurred
    pub timestamp: SimTimestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimEvent {
    /// Create a new event.
    pub fn new(event_id: impl Into<String>, timestamp: SimTimestamp, kind: EventKind) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            kind,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Serializes the event to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_event_id() {
        assert_eq!(generate_event_id(1), "evt_00000001");
        assert_eq!(generate_event_id(42371), "evt_00042371");
    }

    #[test]
    fn test_event_jsonl_shape() {
        let event = SimEvent::new(
            generate_event_id(7),
            SimTimestamp::from_tick(120),
            EventKind::WagonDecoupled {
                wagon: WagonId(3),
                train: TrainId(1),
                station: StationId(2),
                assigned_station: StationId(2),
            },
        );

        let line = event.to_jsonl().unwrap();
        assert!(line.contains(r#""event":"wagon_decoupled""#));
        assert!(line.contains(r#""wagon":3"#));
        assert!(!line.contains('\n'));

        let parsed = SimEvent::from_jsonl(&line).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.event_type(), EventType::Decouple);
    }

    #[test]
    fn test_event_station_accessor() {
        let kind = EventKind::DemandGenerated {
            station: StationId(5),
            generated: 2,
            discarded: 0,
        };
        assert_eq!(kind.station(), StationId(5));
        assert_eq!(kind.event_type(), EventType::Demand);
        assert_eq!(EventType::all().len(), 7);
    }
}
