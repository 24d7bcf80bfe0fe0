//! Continuous Metro Simulation Engine Library
//!
//! Trains loop a closed line without stopping. Wagons detach ahead of their
//! station, brake, exchange passengers and reattach to a later train. Each
//! wagon carries an occupancy grid that passengers diffuse across toward the
//! wagon that will drop them off.

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod output;
pub mod setup;
pub mod systems;

pub use config::Config;
pub use engine::{SimRng, SimulationEngine};
pub use error::{ConfigError, SimError};
