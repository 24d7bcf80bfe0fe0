//! Passenger Components
//!
//! The unit of demand: who is travelling where, how long they have been in
//! the system, and where they stand inside a wagon.

use metro_events::{Outcome, PassengerId, PassengerRecord, StationId, TrainId, WagonId};
use serde::{Deserialize, Serialize};

/// Lateral walking direction inside a train.
///
/// Column indices and train indices both grow toward the rear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    TowardRear,
    TowardFront,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::TowardRear => Direction::TowardFront,
            Direction::TowardFront => Direction::TowardRear,
        }
    }
}

/// A cell of a wagon's occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: PassengerId,
    pub origin: StationId,
    pub destination: StationId,
    /// Ticks spent queued on the origin platform
    pub wait_ticks: u64,
    /// Ticks spent aboard a wagon
    pub ride_ticks: u64,
    /// Non-owning back-reference to the wagon carrying this passenger
    pub wagon: Option<WagonId>,
    /// Train that last picked up this passenger's wagon
    pub train: Option<TrainId>,
    pub cell: Option<Cell>,
    pub direction: Direction,
    /// Set on boarding; exempts the passenger from alighting and diffusion
    /// until the wagon next departs
    pub recently_boarded: bool,
    pub distance_moved: f64,
}

impl Passenger {
    /// Creates a passenger queued at `origin` with its timer started.
    pub fn new(id: PassengerId, origin: StationId, destination: StationId) -> Self {
        Self {
            id,
            origin,
            destination,
            wait_ticks: 0,
            ride_ticks: 0,
            wagon: None,
            train: None,
            cell: None,
            direction: Direction::TowardRear,
            recently_boarded: false,
            distance_moved: 0.0,
        }
    }

    /// Total ticks since the passenger appeared.
    pub fn travel_ticks(&self) -> u64 {
        self.wait_ticks + self.ride_ticks
    }

    pub fn is_aboard(&self) -> bool {
        self.wagon.is_some()
    }

    /// Advance the travel timer by one tick.
    pub fn tick_timer(&mut self) {
        if self.is_aboard() {
            self.ride_ticks += 1;
        } else {
            self.wait_ticks += 1;
        }
    }

    /// Clears wagon-related state when the passenger leaves a wagon.
    pub fn leave_wagon(&mut self) {
        self.wagon = None;
        self.train = None;
        self.cell = None;
        self.recently_boarded = false;
    }

    /// Builds the end-of-run record for a resolved passenger.
    pub fn to_record(&self, alighted_at: StationId, outcome: Outcome) -> PassengerRecord {
        PassengerRecord {
            passenger_id: self.id,
            origin: self.origin,
            destination: self.destination,
            alighted_at,
            outcome,
            travel_time_s: self.travel_ticks(),
            wait_time_s: self.wait_ticks,
            ride_time_s: self.ride_ticks,
            distance_moved: self.distance_moved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_splits_wait_and_ride() {
        let mut p = Passenger::new(PassengerId(1), StationId(0), StationId(2));
        p.tick_timer();
        p.tick_timer();
        p.wagon = Some(WagonId(4));
        p.tick_timer();

        assert_eq!(p.wait_ticks, 2);
        assert_eq!(p.ride_ticks, 1);
        assert_eq!(p.travel_ticks(), 3);
    }

    #[test]
    fn test_record_from_passenger() {
        let mut p = Passenger::new(PassengerId(7), StationId(1), StationId(3));
        p.wait_ticks = 30;
        p.ride_ticks = 90;
        p.distance_moved = 4.0;

        let record = p.to_record(StationId(3), Outcome::Arrived);
        assert_eq!(record.travel_time_s, 120);
        assert_eq!(record.alighted_at, StationId(3));
        assert!(record.arrived());
    }

    #[test]
    fn test_direction_reversed() {
        assert_eq!(Direction::TowardRear.reversed(), Direction::TowardFront);
        assert_eq!(Direction::TowardFront.reversed(), Direction::TowardRear);
    }
}
