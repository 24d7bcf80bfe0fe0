//! Platform Exchange
//!
//! Alighting and boarding at a waiting wagon, and where boarding passengers
//! are placed on the wagon floor.

use metro_events::PassengerId;
use rand::Rng;

use crate::components::{Cell, Passenger, Station, Wagon};
use crate::error::SimError;

/// Most passengers a waiting wagon takes on per tick.
pub const MAX_BOARDING_PER_TICK: usize = 6;

/// Passengers that left a wagon at a platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alighted {
    pub arrived: Vec<PassengerId>,
    pub failed: Vec<PassengerId>,
}

impl Alighted {
    pub fn is_empty(&self) -> bool {
        self.arrived.is_empty() && self.failed.is_empty()
    }
}

/// Puts every settled passenger off the wagon.
///
/// Passengers for this station arrive; everyone else is recorded as failing
/// to alight. Passengers who boarded during this stop stay aboard.
pub fn alight(wagon: &mut Wagon, station: &mut Station) -> Result<Alighted, SimError> {
    let leaving: Vec<PassengerId> = wagon
        .passengers
        .iter()
        .filter(|p| !p.recently_boarded)
        .map(|p| p.id)
        .collect();

    let mut outcome = Alighted::default();
    for id in leaving {
        let Some(mut passenger) = wagon.release(id)? else {
            continue;
        };
        passenger.leave_wagon();
        if passenger.destination == station.id {
            outcome.arrived.push(id);
            station.arrived.push(passenger);
        } else {
            outcome.failed.push(id);
            station.failed.push(passenger);
        }
    }
    Ok(outcome)
}

/// Takes up to [`MAX_BOARDING_PER_TICK`] random passengers off the platform.
///
/// The queue order of those left behind is preserved.
pub fn board<R: Rng + ?Sized>(
    wagon: &mut Wagon,
    station: &mut Station,
    rng: &mut R,
) -> Result<Vec<PassengerId>, SimError> {
    let count = MAX_BOARDING_PER_TICK
        .min(station.waiting.len())
        .min(wagon.free_capacity());

    let mut boarded = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = rng.gen_range(0..station.waiting.len());
        let mut passenger = station.waiting.remove(idx);
        let Some(cell) = boarding_cell(wagon, &passenger) else {
            station.waiting.insert(idx, passenger);
            return Err(SimError::WagonFull {
                wagon: wagon.id,
                capacity: wagon.capacity(),
            });
        };
        passenger.distance_moved += walk_from_door(cell, wagon.grid.length());
        passenger.train = None;
        passenger.recently_boarded = true;
        let id = passenger.id;
        wagon.admit(passenger, cell)?;
        boarded.push(id);
    }
    Ok(boarded)
}

/// First free cell for a boarding passenger.
///
/// Passengers riding this wagon to its own station fill from the rear
/// corner; everyone else fills from the front.
pub fn boarding_cell(wagon: &Wagon, passenger: &Passenger) -> Option<Cell> {
    if passenger.destination == wagon.assigned_station {
        wagon.grid.first_free_backward()
    } else {
        wagon.grid.first_free_forward()
    }
}

/// Distance from the mid-wagon door to `cell`.
pub fn walk_from_door(cell: Cell, length: usize) -> f64 {
    let row = cell.row as f64;
    let col = cell.col as f64 - length as f64 / 2.0;
    (row * row + col * col).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{KinematicPoints, OccupancyGrid};
    use metro_events::{StationId, TrainId, WagonId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn station(id: u32) -> Station {
        Station::new(
            StationId(id),
            "Test",
            500.0,
            100,
            vec![0.0, 0.0, 0.0],
            KinematicPoints {
                decouple: 400.0,
                recouple_trigger: 300.0,
                couple: 600.0,
            },
        )
    }

    fn wagon(width: usize, length: usize, capacity: u32, assigned: u32) -> Wagon {
        Wagon::attached(
            WagonId(0),
            OccupancyGrid::new(width, length, capacity),
            TrainId(0),
            StationId(assigned),
            0.0,
            500.0,
        )
    }

    fn queue(station: &mut Station, count: u64, destination: u32) {
        for i in 0..count {
            station
                .waiting
                .push(Passenger::new(PassengerId(i), station.id, StationId(destination)));
        }
    }

    #[test]
    fn test_boarding_capped_per_tick_and_by_space() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut station = station(0);
        queue(&mut station, 20, 1);
        let mut wagon = wagon(5, 2, 1, 2);

        let first = board(&mut wagon, &mut station, &mut rng).unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(station.waiting.len(), 14);

        let second = board(&mut wagon, &mut station, &mut rng).unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(wagon.free_capacity(), 0);

        let third = board(&mut wagon, &mut station, &mut rng).unwrap();
        assert!(third.is_empty());
        assert_eq!(station.waiting.len(), 10);
        wagon.check_occupancy().unwrap();
    }

    #[test]
    fn test_boarding_preserves_queue_order() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut station = station(0);
        queue(&mut station, 20, 1);
        let mut wagon = wagon(2, 14, 5, 1);

        board(&mut wagon, &mut station, &mut rng).unwrap();
        let left: Vec<u64> = station.waiting.iter().map(|p| p.id.0).collect();
        let mut sorted = left.clone();
        sorted.sort_unstable();
        assert_eq!(left, sorted);
        assert!(wagon.passengers.iter().all(|p| p.recently_boarded));
    }

    #[test]
    fn test_placement_by_destination() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut station = station(0);
        queue(&mut station, 1, 2);
        let mut wagon = wagon(3, 4, 1, 2);
        board(&mut wagon, &mut station, &mut rng).unwrap();
        assert_eq!(wagon.passengers[0].cell, Some(Cell::new(2, 3)));
        // sqrt(2^2 + (3 - 2)^2)
        assert!((wagon.passengers[0].distance_moved - 5f64.sqrt()).abs() < 1e-12);

        queue(&mut station, 1, 1);
        board(&mut wagon, &mut station, &mut rng).unwrap();
        assert_eq!(wagon.passengers[1].cell, Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_alighting_splits_arrived_and_failed() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut origin = station(0);
        origin.waiting.push(Passenger::new(PassengerId(1), StationId(0), StationId(1)));
        origin.waiting.push(Passenger::new(PassengerId(2), StationId(0), StationId(2)));
        let mut wagon = wagon(2, 4, 2, 1);
        board(&mut wagon, &mut origin, &mut rng).unwrap();

        // still flagged from boarding: nobody leaves
        let mut target = station(1);
        assert!(alight(&mut wagon, &mut target).unwrap().is_empty());

        for p in &mut wagon.passengers {
            p.recently_boarded = false;
        }
        let outcome = alight(&mut wagon, &mut target).unwrap();
        assert_eq!(outcome.arrived, vec![PassengerId(1)]);
        assert_eq!(outcome.failed, vec![PassengerId(2)]);
        assert_eq!(wagon.occupants(), 0);
        assert_eq!(wagon.grid.total(), 0);
        assert!(target.arrived[0].wagon.is_none());
        assert_eq!(target.failed.len(), 1);
    }
}
