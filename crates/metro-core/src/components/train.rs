//! Train Components
//!
//! A train is an ordered run of wagons (index 0 at the front) moving at line
//! speed around the loop.

use metro_events::{PassengerId, TrainId, WagonId};

use super::wagon::PositionTrace;

#[derive(Debug, Clone)]
pub struct Train {
    pub id: TrainId,
    /// Departure delay in ticks
    pub headway_offset: f64,
    pub wagons: Vec<WagonId>,
    /// Passengers handed over by coupled wagons
    pub backlog: Vec<PassengerId>,
    pub trace: PositionTrace,
    pub acquired_wagons: u64,
}

impl Train {
    pub fn new(id: TrainId, headway_offset: f64, wagons: Vec<WagonId>) -> Self {
        Self {
            id,
            headway_offset,
            wagons,
            backlog: Vec::new(),
            trace: PositionTrace::default(),
            acquired_wagons: 0,
        }
    }

    /// Front position at `tick`; zero until the train departs.
    ///
    /// Each acquired wagon pushes the front forward by one wagon length so
    /// the wagons already attached keep their track positions.
    pub fn position_at(&self, tick: u64, speed: f64, wagon_length: f64, track_length: f64) -> f64 {
        let elapsed = tick as f64 - self.headway_offset;
        if elapsed < 0.0 {
            return 0.0;
        }
        (elapsed * speed + wagon_length * self.acquired_wagons as f64).rem_euclid(track_length)
    }

    pub fn has_departed(&self, tick: u64) -> bool {
        tick as f64 > self.headway_offset
    }

    pub fn leading_wagon(&self) -> Option<WagonId> {
        self.wagons.first().copied()
    }

    pub fn trailing_wagon(&self) -> Option<WagonId> {
        self.wagons.last().copied()
    }

    /// Attaches a wagon at the front and shifts the recorded position ahead.
    pub fn push_front(&mut self, wagon: WagonId, wagon_length: f64) {
        self.wagons.insert(0, wagon);
        self.acquired_wagons += 1;
        self.trace.current += wagon_length;
    }
}
