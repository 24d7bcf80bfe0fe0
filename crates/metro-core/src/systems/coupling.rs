//! Wagon Transfer
//!
//! The only two places a wagon changes owner: a train dropping its trailing
//! wagon at a station, and a station handing an up-to-speed wagon to the
//! next train.

use metro_events::{StationId, TrainId, WagonId, WagonState};
use tracing::{debug, warn};

use crate::components::{Owner, Station, Train, WagonArena};
use crate::error::SimError;

/// Detaches the trailing wagon of `train` into `station`.
///
/// Returns the wagon and the station it had been assigned to serve.
pub fn decouple_trailing_wagon(
    train: &mut Train,
    station: &mut Station,
    arena: &mut WagonArena,
    tick: u64,
) -> Result<Option<(WagonId, StationId)>, SimError> {
    let Some(id) = train.trailing_wagon() else {
        return Ok(None);
    };
    let wagon = arena.try_get_mut(id)?;
    if wagon.owner != Owner::Train(train.id) {
        return Err(SimError::Ownership {
            wagon: id,
            detail: format!("listed by {} but owned by {:?}", train.id, wagon.owner),
        });
    }
    wagon.set_state(WagonState::Decelerating)?;
    train.wagons.pop();

    wagon.last_train = Some(train.id);
    wagon.owner = Owner::Station(station.id);
    wagon.advanced_tick = Some(tick);
    station.wagons.push(id);

    if wagon.assigned_station != station.id {
        warn!(
            wagon = %id,
            station = %station.id,
            assigned = %wagon.assigned_station,
            "wagon decoupled away from its assigned station"
        );
    }
    debug!(wagon = %id, train = %train.id, station = %station.id, tick, "decoupled");
    Ok(Some((id, wagon.assigned_station)))
}

/// Train that picks up a wagon last carried by `last_train`.
pub fn next_train(last_train: Option<TrainId>, train_count: usize) -> TrainId {
    match last_train {
        None => TrainId(0),
        Some(train) => TrainId(((train.index() + 1) % train_count.max(1)) as u32),
    }
}

/// A completed station-to-train hand-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coupled {
    pub wagon: WagonId,
    pub train: TrainId,
    pub assigned_station: StationId,
    pub passengers: usize,
}

/// Hands a wagon that reached line speed from `station` to its next train.
///
/// The wagon goes to the front of the train and is assigned the station
/// after the one the train's current leading wagon serves.
pub fn couple_wagon(
    id: WagonId,
    station: &mut Station,
    trains: &mut [Train],
    arena: &mut WagonArena,
    station_count: usize,
    wagon_length: f64,
) -> Result<Coupled, SimError> {
    let last_train = arena.try_get(id)?.last_train;
    let target_id = next_train(last_train, trains.len());
    let Some(target) = trains.get_mut(target_id.index()) else {
        return Err(SimError::Ownership {
            wagon: id,
            detail: format!("no {} to couple to", target_id),
        });
    };

    let lead_station = match target.leading_wagon() {
        Some(lead) => Some(arena.try_get(lead)?.assigned_station),
        None => None,
    };

    if !station.remove_wagon(id) {
        return Err(SimError::Ownership {
            wagon: id,
            detail: format!("not dwelling at {}", station.id),
        });
    }

    let wagon = arena.try_get_mut(id)?;
    match lead_station {
        Some(lead) if lead.index() < station_count => {
            wagon.assigned_station = StationId(((lead.index() + 1) % station_count) as u32);
        }
        Some(lead) => {
            warn!(wagon = %id, lead = %lead, "leading wagon serves an unknown station, keeping assignment");
        }
        None => {
            warn!(wagon = %id, train = %target.id, "coupling to an empty train, keeping assignment");
        }
    }

    for passenger in &mut wagon.passengers {
        passenger.train = Some(target.id);
        target.backlog.push(passenger.id);
    }
    wagon.owner = Owner::Train(target.id);
    wagon.is_initial = false;
    target.push_front(id, wagon_length);

    debug!(wagon = %id, train = %target.id, assigned = %wagon.assigned_station, "coupled");
    Ok(Coupled {
        wagon: id,
        train: target.id,
        assigned_station: wagon.assigned_station,
        passengers: wagon.passengers.len(),
    })
}
