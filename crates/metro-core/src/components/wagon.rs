//! Wagon Components
//!
//! Occupancy grid, kinematic state and passenger list of a wagon, plus the
//! arena that owns every wagon on the line.

use metro_events::{PassengerId, StationId, TrainId, WagonId, WagonState};

use super::passenger::{Cell, Passenger};
use crate::error::SimError;

/// Per-cell passenger counts of a wagon floor.
///
/// Rows run across the wagon (width), columns along it (length), with the
/// last column at the rear.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    width: usize,
    length: usize,
    cell_capacity: u32,
    cells: Vec<u32>,
}

impl OccupancyGrid {
    pub fn new(width: usize, length: usize, cell_capacity: u32) -> Self {
        Self {
            width,
            length,
            cell_capacity,
            cells: vec![0; width * length],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn cell_capacity(&self) -> u32 {
        self.cell_capacity
    }

    /// Total passengers the grid can hold.
    pub fn capacity(&self) -> usize {
        self.width * self.length * self.cell_capacity as usize
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.width && cell.col < self.length
    }

    /// Count at a cell; zero outside the grid.
    pub fn count(&self, cell: Cell) -> u32 {
        if self.contains(cell) {
            self.cells[cell.row * self.length + cell.col]
        } else {
            0
        }
    }

    /// True if the cell exists and is under capacity.
    pub fn has_room(&self, cell: Cell) -> bool {
        self.contains(cell) && self.count(cell) < self.cell_capacity
    }

    pub fn total(&self) -> usize {
        self.cells.iter().map(|&c| c as usize).sum()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.length.max(1))
    }

    pub(crate) fn add(&mut self, wagon: WagonId, cell: Cell) -> Result<(), SimError> {
        if !self.contains(cell) {
            return Err(SimError::CellOutOfBounds {
                wagon,
                row: cell.row,
                col: cell.col,
                width: self.width,
                length: self.length,
            });
        }
        let idx = cell.row * self.length + cell.col;
        if self.cells[idx] >= self.cell_capacity {
            return Err(SimError::CellFull {
                wagon,
                row: cell.row,
                col: cell.col,
                capacity: self.cell_capacity,
            });
        }
        self.cells[idx] += 1;
        Ok(())
    }

    pub(crate) fn remove(&mut self, wagon: WagonId, cell: Cell) -> Result<(), SimError> {
        if !self.contains(cell) {
            return Err(SimError::CellOutOfBounds {
                wagon,
                row: cell.row,
                col: cell.col,
                width: self.width,
                length: self.length,
            });
        }
        let idx = cell.row * self.length + cell.col;
        if self.cells[idx] == 0 {
            return Err(SimError::CellEmpty {
                wagon,
                row: cell.row,
                col: cell.col,
            });
        }
        self.cells[idx] -= 1;
        Ok(())
    }

    /// First under-capacity cell scanning from the front-left corner.
    pub fn first_free_forward(&self) -> Option<Cell> {
        (0..self.width)
            .flat_map(|row| (0..self.length).map(move |col| Cell::new(row, col)))
            .find(|&cell| self.has_room(cell))
    }

    /// First under-capacity cell scanning back from the last row and column.
    pub fn first_free_backward(&self) -> Option<Cell> {
        (0..self.width)
            .rev()
            .flat_map(|row| (0..self.length).rev().map(move |col| Cell::new(row, col)))
            .find(|&cell| self.has_room(cell))
    }
}

/// Current and previous track position, enough to detect crossings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionTrace {
    pub current: f64,
    pub previous: f64,
}

impl PositionTrace {
    pub fn at(position: f64) -> Self {
        Self {
            current: position,
            previous: position,
        }
    }

    pub fn advance(&mut self, position: f64) {
        self.previous = self.current;
        self.current = position;
    }

    /// Records a tick spent standing still.
    pub fn hold(&mut self) {
        self.previous = self.current;
    }
}

/// The single parent of a wagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Train(TrainId),
    Station(StationId),
}

#[derive(Debug, Clone)]
pub struct Wagon {
    pub id: WagonId,
    pub grid: OccupancyGrid,
    state: WagonState,
    pub speed: f64,
    pub trace: PositionTrace,
    pub passengers: Vec<Passenger>,
    pub assigned_station: StationId,
    /// Ticks spent in the current WAITING phase
    pub dwell_ticks: u64,
    /// Completed dwell durations
    pub dwell_history: Vec<u64>,
    /// Train this wagon last rode with; `None` for a wagon that has never
    /// left its starting station
    pub last_train: Option<TrainId>,
    pub is_initial: bool,
    pub owner: Owner,
    /// Tick in which the wagon last moved, so it moves once per tick
    pub advanced_tick: Option<u64>,
}

impl Wagon {
    /// A wagon attached to a train, cruising at `speed`.
    pub fn attached(
        id: WagonId,
        grid: OccupancyGrid,
        train: TrainId,
        assigned_station: StationId,
        speed: f64,
        position: f64,
    ) -> Self {
        Self {
            id,
            grid,
            state: WagonState::Cruising,
            speed,
            trace: PositionTrace::at(position),
            passengers: Vec::new(),
            assigned_station,
            dwell_ticks: 0,
            dwell_history: Vec::new(),
            last_train: None,
            is_initial: false,
            owner: Owner::Train(train),
            advanced_tick: None,
        }
    }

    /// A wagon parked at its own station from tick 0, waiting for a train.
    pub fn initial(id: WagonId, grid: OccupancyGrid, station: StationId, position: f64) -> Self {
        Self {
            id,
            grid,
            state: WagonState::Waiting,
            speed: 0.0,
            trace: PositionTrace::at(position),
            passengers: Vec::new(),
            assigned_station: station,
            dwell_ticks: 0,
            dwell_history: Vec::new(),
            last_train: None,
            is_initial: true,
            owner: Owner::Station(station),
            advanced_tick: None,
        }
    }

    pub fn state(&self) -> WagonState {
        self.state
    }

    /// Moves to the next life-cycle state, rejecting anything off the cycle.
    pub fn set_state(&mut self, next: WagonState) -> Result<(), SimError> {
        if !self.state.can_transition_to(next) {
            return Err(SimError::IllegalTransition {
                wagon: self.id,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn occupants(&self) -> usize {
        self.passengers.len()
    }

    pub fn capacity(&self) -> usize {
        self.grid.capacity()
    }

    pub fn free_capacity(&self) -> usize {
        self.capacity().saturating_sub(self.occupants())
    }

    /// Places a passenger in `cell` and takes ownership of it.
    pub fn admit(&mut self, mut passenger: Passenger, cell: Cell) -> Result<(), SimError> {
        self.grid.add(self.id, cell)?;
        passenger.wagon = Some(self.id);
        passenger.cell = Some(cell);
        self.passengers.push(passenger);
        Ok(())
    }

    /// Removes a passenger and frees its cell.
    pub fn release(&mut self, passenger_id: PassengerId) -> Result<Option<Passenger>, SimError> {
        let Some(idx) = self.passengers.iter().position(|p| p.id == passenger_id) else {
            return Ok(None);
        };
        if let Some(cell) = self.passengers[idx].cell {
            self.grid.remove(self.id, cell)?;
        }
        Ok(Some(self.passengers.remove(idx)))
    }

    /// Moves the passenger at `idx` to `to` inside this wagon if there is room.
    pub fn shift(&mut self, idx: usize, to: Cell) -> Result<bool, SimError> {
        if !self.grid.has_room(to) {
            return Ok(false);
        }
        let Some(from) = self.passengers[idx].cell else {
            return Ok(false);
        };
        self.grid.remove(self.id, from)?;
        self.grid.add(self.id, to)?;
        self.passengers[idx].cell = Some(to);
        Ok(true)
    }

    pub fn passenger_index(&self, passenger_id: PassengerId) -> Option<usize> {
        self.passengers.iter().position(|p| p.id == passenger_id)
    }

    /// Checks that grid counts agree with the passenger list.
    pub fn check_occupancy(&self) -> Result<(), SimError> {
        let grid = self.grid.total();
        if grid != self.passengers.len() {
            return Err(SimError::OccupancyMismatch {
                wagon: self.id,
                grid,
                listed: self.passengers.len(),
            });
        }
        for (row, counts) in self.grid.rows().enumerate() {
            for (col, &count) in counts.iter().enumerate() {
                if count > self.grid.cell_capacity() {
                    return Err(SimError::CellFull {
                        wagon: self.id,
                        row,
                        col,
                        capacity: self.grid.cell_capacity(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Owns every wagon; trains and stations refer to wagons by id.
#[derive(Debug, Clone, Default)]
pub struct WagonArena {
    wagons: Vec<Wagon>,
}

impl WagonArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id that `insert` will accept.
    pub fn next_id(&self) -> WagonId {
        WagonId(self.wagons.len() as u32)
    }

    /// Adds a wagon; its id must be `next_id()`.
    pub fn insert(&mut self, wagon: Wagon) -> WagonId {
        debug_assert_eq!(wagon.id, self.next_id());
        let id = wagon.id;
        self.wagons.push(wagon);
        id
    }

    pub fn get(&self, id: WagonId) -> Option<&Wagon> {
        self.wagons.get(id.index())
    }

    pub fn get_mut(&mut self, id: WagonId) -> Option<&mut Wagon> {
        self.wagons.get_mut(id.index())
    }

    pub fn try_get(&self, id: WagonId) -> Result<&Wagon, SimError> {
        self.get(id).ok_or(SimError::UnknownWagon(id))
    }

    pub fn try_get_mut(&mut self, id: WagonId) -> Result<&mut Wagon, SimError> {
        self.get_mut(id).ok_or(SimError::UnknownWagon(id))
    }

    /// Two distinct wagons borrowed mutably at once.
    pub fn pair_mut(&mut self, a: WagonId, b: WagonId) -> Result<(&mut Wagon, &mut Wagon), SimError> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib {
            return Err(SimError::Ownership {
                wagon: a,
                detail: "wagon paired with itself".to_string(),
            });
        }
        if ia.max(ib) >= self.wagons.len() {
            return Err(SimError::UnknownWagon(if ia >= self.wagons.len() { a } else { b }));
        }
        if ia < ib {
            let (left, right) = self.wagons.split_at_mut(ib);
            Ok((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.wagons.split_at_mut(ia);
            Ok((&mut right[0], &mut left[ib]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wagon> {
        self.wagons.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Wagon> {
        self.wagons.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.wagons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wagons.is_empty()
    }
}
