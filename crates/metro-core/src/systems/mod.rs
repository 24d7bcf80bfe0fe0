//! Simulation Systems
//!
//! Per-tick rules for kinematics, wagon transfer, platform exchange,
//! intra-train diffusion and demand.

pub mod coupling;
pub mod demand;
pub mod diffusion;
pub mod kinematics;
pub mod platform;

pub use coupling::{couple_wagon, decouple_trailing_wagon, next_train, Coupled};
pub use demand::{generate_demand, Demand};
pub use diffusion::diffuse_train;
pub use kinematics::{crossed_forward, crossed_inclusive, Kinematics};
pub use platform::{alight, board, boarding_cell, walk_from_door, Alighted, MAX_BOARDING_PER_TICK};
