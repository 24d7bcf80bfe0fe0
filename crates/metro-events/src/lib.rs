//! Shared data types for the continuous metro simulation.
//!
//! This crate contains pure data structures with no simulation logic:
//! identifiers, simulation time, engine events, per-tick snapshots and
//! end-of-run records. Rendering and reporting tools depend on it without
//! pulling in the engine.

pub mod event;
pub mod ids;
pub mod record;
pub mod snapshot;
pub mod timestamp;

pub use ids::{PassengerId, StationId, TrainId, WagonId};

pub use timestamp::{ParseClockError, SimClock, SimTimestamp, TICKS_PER_HOUR, TICKS_PER_MINUTE};

pub use event::{generate_event_id, EventKind, EventType, SimEvent};

pub use snapshot::{
    generate_snapshot_id, StationSnapshot, TickSnapshot, TrainSnapshot, WagonSnapshot, WagonState,
};

pub use record::{
    station_difference, stations_traversed, Outcome, PassengerRecord, RunReport, StationSummary,
};
