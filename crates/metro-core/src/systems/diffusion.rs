//! Intra-train Diffusion
//!
//! Each tick every settled passenger takes at most one step toward the wagon
//! assigned to their destination. Columns grow toward the rear of a wagon and
//! wagon indices grow toward the rear of the train.

use std::collections::HashSet;

use metro_events::{PassengerId, StationId, WagonId};

use crate::components::{Cell, Direction, Wagon, WagonArena};
use crate::error::SimError;

/// Moves passengers inside and between the wagons of one train.
///
/// `wagons` is the train's wagon order, front first. Returns the number of
/// passengers that changed cell.
pub fn diffuse_train(wagons: &[WagonId], arena: &mut WagonArena) -> Result<usize, SimError> {
    let assigned: Vec<StationId> = wagons
        .iter()
        .map(|&id| arena.try_get(id).map(|w| w.assigned_station))
        .collect::<Result<_, _>>()?;

    let mut seen: HashSet<PassengerId> = HashSet::new();
    let mut moves = 0;

    for (index, &wagon_id) in wagons.iter().enumerate() {
        let ids: Vec<PassengerId> = arena.try_get(wagon_id)?.passengers.iter().map(|p| p.id).collect();

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            let wagon = arena.try_get_mut(wagon_id)?;
            let Some(idx) = wagon.passenger_index(id) else {
                continue;
            };
            let passenger = &wagon.passengers[idx];
            if passenger.recently_boarded {
                continue;
            }
            let Some(cell) = passenger.cell else {
                continue;
            };

            if passenger.destination == wagon.assigned_station {
                if settle_in_wagon(wagon, idx, cell)? {
                    moves += 1;
                }
                continue;
            }

            if !assigned.contains(&passenger.destination) {
                wagon.passengers[idx].direction = Direction::TowardFront;
            }
            let direction = wagon.passengers[idx].direction;
            let length = wagon.grid.length();

            let stepped = match direction {
                Direction::TowardRear if cell.col + 1 < length => {
                    step_toward_rear(wagon, idx, cell)?
                }
                Direction::TowardRear => match wagons.get(index + 1) {
                    Some(&next) => transfer(arena, wagon_id, next, id, cell, Direction::TowardRear)?,
                    None => false,
                },
                Direction::TowardFront if cell.col > 0 => step_toward_front(wagon, idx, cell)?,
                Direction::TowardFront => match index.checked_sub(1).map(|i| wagons[i]) {
                    Some(prev) => transfer(arena, wagon_id, prev, id, cell, Direction::TowardFront)?,
                    None => false,
                },
            };
            if stepped {
                moves += 1;
            }
        }
    }
    Ok(moves)
}

/// Walk inside the destination wagon: down first, then along the current
/// direction, turning around at a blocked cell.
fn settle_in_wagon(wagon: &mut Wagon, idx: usize, cell: Cell) -> Result<bool, SimError> {
    if wagon.shift(idx, Cell::new(cell.row + 1, cell.col))? {
        wagon.passengers[idx].distance_moved += 1.0;
        return Ok(true);
    }

    let direction = wagon.passengers[idx].direction;
    let target = match direction {
        Direction::TowardRear => Some(Cell::new(cell.row, cell.col + 1)),
        Direction::TowardFront => cell.col.checked_sub(1).map(|col| Cell::new(cell.row, col)),
    };
    let moved = match target {
        Some(to) => wagon.shift(idx, to)?,
        None => false,
    };

    if !moved {
        wagon.passengers[idx].direction = direction.reversed();
        return Ok(false);
    }
    // steps along the last row are not counted
    if cell.row + 1 != wagon.grid.width() {
        wagon.passengers[idx].distance_moved += 1.0;
    }
    Ok(true)
}

fn step_toward_rear(wagon: &mut Wagon, idx: usize, cell: Cell) -> Result<bool, SimError> {
    let col = cell.col + 1;
    let mut candidates = Vec::with_capacity(3);
    if let Some(up) = cell.row.checked_sub(1) {
        candidates.push(Cell::new(up, col));
    }
    candidates.push(Cell::new(cell.row, col));
    candidates.push(Cell::new(cell.row + 1, col));
    step_to_first_free(wagon, idx, &candidates)
}

fn step_toward_front(wagon: &mut Wagon, idx: usize, cell: Cell) -> Result<bool, SimError> {
    let col = cell.col - 1;
    let mut candidates = Vec::with_capacity(3);
    candidates.push(Cell::new(cell.row + 1, col));
    candidates.push(Cell::new(cell.row, col));
    if let Some(up) = cell.row.checked_sub(1) {
        candidates.push(Cell::new(up, col));
    }
    step_to_first_free(wagon, idx, &candidates)
}

fn step_to_first_free(wagon: &mut Wagon, idx: usize, candidates: &[Cell]) -> Result<bool, SimError> {
    for &to in candidates {
        if wagon.shift(idx, to)? {
            wagon.passengers[idx].distance_moved += 1.0;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Moves a passenger across the gangway into a neighbouring wagon, trying
/// the same row, then the row above, then the row below.
fn transfer(
    arena: &mut WagonArena,
    from: WagonId,
    to: WagonId,
    passenger: PassengerId,
    cell: Cell,
    direction: Direction,
) -> Result<bool, SimError> {
    let (source, target) = arena.pair_mut(from, to)?;
    let col = match direction {
        Direction::TowardRear => 0,
        Direction::TowardFront => target.grid.length().saturating_sub(1),
    };

    let mut rows = vec![cell.row];
    if let Some(up) = cell.row.checked_sub(1) {
        rows.push(up);
    }
    rows.push(cell.row + 1);

    let Some(landing) = rows
        .into_iter()
        .map(|row| Cell::new(row, col))
        .find(|&c| target.grid.has_room(c))
    else {
        return Ok(false);
    };

    let Some(mut moving) = source.release(passenger)? else {
        return Ok(false);
    };
    moving.distance_moved += 1.0;
    target.admit(moving, landing)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{OccupancyGrid, Passenger};
    use metro_events::TrainId;

    fn arena(assigned: &[u32], width: usize, length: usize, capacity: u32) -> (WagonArena, Vec<WagonId>) {
        let mut arena = WagonArena::new();
        let mut ids = Vec::new();
        for &station in assigned {
            let id = arena.next_id();
            arena.insert(Wagon::attached(
                id,
                OccupancyGrid::new(width, length, capacity),
                TrainId(0),
                StationId(station),
                10.0,
                0.0,
            ));
            ids.push(id);
        }
        (arena, ids)
    }

    fn seat(arena: &mut WagonArena, wagon: WagonId, id: u64, destination: u32, cell: Cell) {
        let passenger = Passenger::new(PassengerId(id), StationId(9), StationId(destination));
        arena.get_mut(wagon).unwrap().admit(passenger, cell).unwrap();
    }

    fn find(arena: &WagonArena, id: u64) -> (WagonId, Cell, f64) {
        arena
            .iter()
            .flat_map(|w| w.passengers.iter().map(move |p| (w.id, p)))
            .find(|(_, p)| p.id == PassengerId(id))
            .map(|(w, p)| (w, p.cell.unwrap(), p.distance_moved))
            .unwrap()
    }

    #[test]
    fn test_settles_down_then_along() {
        let (mut arena, ids) = arena(&[1], 2, 3, 1);
        seat(&mut arena, ids[0], 1, 1, Cell::new(0, 0));

        diffuse_train(&ids, &mut arena).unwrap();
        assert_eq!(find(&arena, 1), (ids[0], Cell::new(1, 0), 1.0));

        // walking along the last row costs nothing
        diffuse_train(&ids, &mut arena).unwrap();
        assert_eq!(find(&arena, 1), (ids[0], Cell::new(1, 1), 1.0));
    }

    #[test]
    fn test_blocked_walk_turns_around() {
        let (mut arena, ids) = arena(&[1], 1, 2, 1);
        seat(&mut arena, ids[0], 1, 1, Cell::new(0, 1));

        diffuse_train(&ids, &mut arena).unwrap();
        let wagon = arena.get(ids[0]).unwrap();
        assert_eq!(wagon.passengers[0].direction, Direction::TowardFront);
        assert_eq!(wagon.passengers[0].cell, Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_walks_rear_into_next_wagon() {
        let (mut arena, ids) = arena(&[0, 2], 3, 2, 1);
        seat(&mut arena, ids[0], 1, 2, Cell::new(1, 0));

        diffuse_train(&ids, &mut arena).unwrap();
        // up-right is tried first
        assert_eq!(find(&arena, 1).1, Cell::new(0, 1));

        diffuse_train(&ids, &mut arena).unwrap();
        let (wagon, cell, distance) = find(&arena, 1);
        assert_eq!((wagon, cell), (ids[1], Cell::new(0, 0)));
        assert_eq!(distance, 2.0);
        assert_eq!(arena.get(ids[0]).unwrap().grid.total(), 0);
        assert_eq!(arena.get(ids[1]).unwrap().passenger_index(PassengerId(1)), Some(0));
    }

    #[test]
    fn test_transfer_falls_back_to_adjacent_rows() {
        let (mut arena, ids) = arena(&[0, 2], 3, 1, 1);
        seat(&mut arena, ids[0], 1, 2, Cell::new(1, 0));
        seat(&mut arena, ids[1], 2, 2, Cell::new(1, 0));
        arena.get_mut(ids[1]).unwrap().passengers[0].recently_boarded = true;

        diffuse_train(&ids, &mut arena).unwrap();
        assert_eq!(find(&arena, 1), (ids[1], Cell::new(0, 0), 1.0));
    }

    #[test]
    fn test_absent_destination_heads_front_and_stops_at_first_wagon() {
        let (mut arena, ids) = arena(&[0, 1], 1, 3, 1);
        seat(&mut arena, ids[1], 1, 5, Cell::new(0, 1));

        for _ in 0..10 {
            diffuse_train(&ids, &mut arena).unwrap();
        }
        let (wagon, cell, _) = find(&arena, 1);
        assert_eq!((wagon, cell), (ids[0], Cell::new(0, 0)));
        let passenger = &arena.get(ids[0]).unwrap().passengers[0];
        assert_eq!(passenger.direction, Direction::TowardFront);
    }

    #[test]
    fn test_each_passenger_moves_once_per_tick() {
        let (mut arena, ids) = arena(&[0, 1, 2], 1, 1, 1);
        seat(&mut arena, ids[0], 1, 2, Cell::new(0, 0));

        diffuse_train(&ids, &mut arena).unwrap();
        assert_eq!(find(&arena, 1).0, ids[1]);
        diffuse_train(&ids, &mut arena).unwrap();
        assert_eq!(find(&arena, 1).0, ids[2]);
    }

    #[test]
    fn test_recently_boarded_passengers_stay_put() {
        let (mut arena, ids) = arena(&[1], 2, 2, 1);
        seat(&mut arena, ids[0], 1, 1, Cell::new(0, 0));
        arena.get_mut(ids[0]).unwrap().passengers[0].recently_boarded = true;

        assert_eq!(diffuse_train(&ids, &mut arena).unwrap(), 0);
        assert_eq!(find(&arena, 1).1, Cell::new(0, 0));
    }
}
