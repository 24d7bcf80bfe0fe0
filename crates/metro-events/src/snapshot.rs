//! Snapshot Types
//!
//! Read-only per-tick views of the line handed to rendering and reporting
//! consumers. Snapshots carry positions and occupant counts only; they never
//! expose passengers themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SimTimestamp, StationId, TrainId, WagonId};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Kinematic life-cycle state of a wagon.
///
/// Legal transitions form a single cycle:
/// `Cruising -> Decelerating -> Waiting -> Accelerating -> Cruising`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WagonState {
    /// Attached to a train, moving at line speed
    Cruising,
    /// Detached and braking toward the platform
    Decelerating,
    /// At rest at the platform, exchanging passengers
    Waiting,
    /// Leaving the platform to catch the next train
    Accelerating,
}

impl WagonState {
    /// The only state reachable from this one.
    pub fn successor(self) -> Self {
        match self {
            WagonState::Cruising => WagonState::Decelerating,
            WagonState::Decelerating => WagonState::Waiting,
            WagonState::Waiting => WagonState::Accelerating,
            WagonState::Accelerating => WagonState::Cruising,
        }
    }

    pub fn can_transition_to(self, next: WagonState) -> bool {
        self.successor() == next
    }

    /// True while the wagon belongs to a station rather than a train.
    pub fn is_dwelling(self) -> bool {
        !matches!(self, WagonState::Cruising)
    }
}

impl fmt::Display for WagonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WagonState::Cruising => write!(f, "cruising"),
            WagonState::Decelerating => write!(f, "decelerating"),
            WagonState::Waiting => write!(f, "waiting"),
            WagonState::Accelerating => write!(f, "accelerating"),
        }
    }
}

/// One wagon, wherever it currently is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagonSnapshot {
    pub wagon_id: WagonId,
    /// Track position in metres, wrapped to the loop
    pub position: f64,
    pub occupants: usize,
    pub state: WagonState,
    pub assigned_station: StationId,
}

/// A train and its attached wagons, front first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSnapshot {
    pub train_id: TrainId,
    pub position: f64,
    pub wagons: Vec<WagonSnapshot>,
}

impl TrainSnapshot {
    /// Total passengers aboard the train.
    pub fn occupants(&self) -> usize {
        self.wagons.iter().map(|w| w.occupants).sum()
    }
}

/// A station, its platform queue and its dwelling wagons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub station_id: StationId,
    pub name: String,
    pub position: f64,
    pub waiting: usize,
    pub arrived: usize,
    pub failed: usize,
    #[serde(default)]
    pub wagons: Vec<WagonSnapshot>,
}

/// Complete line snapshot for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub timestamp: SimTimestamp,
    pub trains: Vec<TrainSnapshot>,
    pub stations: Vec<StationSnapshot>,
}

impl TickSnapshot {
    /// Creates an empty snapshot for the given tick.
    pub fn new(timestamp: SimTimestamp) -> Self {
        Self {
            timestamp,
            trains: Vec::new(),
            stations: Vec::new(),
        }
    }

    /// Finds a wagon by ID, whether attached or dwelling.
    pub fn find_wagon(&self, wagon_id: WagonId) -> Option<&WagonSnapshot> {
        self.trains
            .iter()
            .flat_map(|t| t.wagons.iter())
            .chain(self.stations.iter().flat_map(|s| s.wagons.iter()))
            .find(|w| w.wagon_id == wagon_id)
    }

    /// Finds a station by ID.
    pub fn find_station(&self, station_id: StationId) -> Option<&StationSnapshot> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    /// Passengers aboard any wagon.
    pub fn passengers_aboard(&self) -> usize {
        let attached: usize = self.trains.iter().map(TrainSnapshot::occupants).sum();
        let dwelling: usize = self
            .stations
            .iter()
            .flat_map(|s| s.wagons.iter())
            .map(|w| w.occupants)
            .sum();
        attached + dwelling
    }

    /// Passengers queued on platforms.
    pub fn passengers_waiting(&self) -> usize {
        self.stations.iter().map(|s| s.waiting).sum()
    }

    /// Number of wagons in the snapshot.
    pub fn wagon_count(&self) -> usize {
        self.trains.iter().map(|t| t.wagons.len()).sum::<usize>()
            + self.stations.iter().map(|s| s.wagons.len()).sum::<usize>()
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the snapshot to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wagon(id: u32, occupants: usize, state: WagonState) -> WagonSnapshot {
        WagonSnapshot {
            wagon_id: WagonId(id),
            position: 100.0,
            occupants,
            state,
            assigned_station: StationId(0),
        }
    }

    fn sample() -> TickSnapshot {
        let mut snapshot = TickSnapshot::new(SimTimestamp::from_tick(42));
        snapshot.trains.push(TrainSnapshot {
            train_id: TrainId(0),
            position: 500.0,
            wagons: vec![
                wagon(0, 10, WagonState::Cruising),
                wagon(1, 4, WagonState::Cruising),
            ],
        });
        snapshot.stations.push(StationSnapshot {
            station_id: StationId(0),
            name: "Central".to_string(),
            position: 1000.0,
            waiting: 7,
            arrived: 3,
            failed: 1,
            wagons: vec![wagon(2, 5, WagonState::Waiting)],
        });
        snapshot
    }

    #[test]
    fn test_generate_snapshot_id() {
        assert_eq!(generate_snapshot_id(1), "snap_000001");
        assert_eq!(generate_snapshot_id(999999), "snap_999999");
    }

    #[test]
    fn test_state_cycle() {
        let mut state = WagonState::Cruising;
        for _ in 0..4 {
            let next = state.successor();
            assert!(state.can_transition_to(next));
            assert!(!state.can_transition_to(state));
            state = next;
        }
        assert_eq!(state, WagonState::Cruising);
        assert!(!WagonState::Waiting.can_transition_to(WagonState::Cruising));
        assert!(WagonState::Waiting.is_dwelling());
        assert!(!WagonState::Cruising.is_dwelling());
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = sample();
        assert_eq!(snapshot.passengers_aboard(), 19);
        assert_eq!(snapshot.passengers_waiting(), 7);
        assert_eq!(snapshot.wagon_count(), 3);
        assert_eq!(snapshot.trains[0].occupants(), 14);
    }

    #[test]
    fn test_find_wagon_searches_trains_and_stations() {
        let snapshot = sample();
        assert_eq!(
            snapshot.find_wagon(WagonId(2)).map(|w| w.state),
            Some(WagonState::Waiting)
        );
        assert!(snapshot.find_wagon(WagonId(9)).is_none());
        assert_eq!(snapshot.find_station(StationId(0)).unwrap().name, "Central");
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""state":"waiting""#));
        assert!(json.contains(r#""clock":"00:00:42""#));

        let parsed = TickSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
