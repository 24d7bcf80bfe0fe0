//! Simulation Components
//!
//! Plain data for passengers, wagons, stations and trains.

pub mod ids;
pub mod passenger;
pub mod station;
pub mod train;
pub mod wagon;

pub use ids::IdGenerator;
pub use passenger::{Cell, Direction, Passenger};
pub use station::{KinematicPoints, Station};
pub use train::Train;
pub use wagon::{OccupancyGrid, Owner, PositionTrace, Wagon, WagonArena};
