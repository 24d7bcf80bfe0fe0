//! Error types for configuration and engine defects.

use metro_events::{StationId, WagonId, WagonState};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A parameter is out of range
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Invariant violations detected by the engine.
///
/// These are defects, not simulated outcomes: a passenger failing to reach
/// the destination is recorded, never raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("{wagon} cell ({row}, {col}) is at capacity {capacity}")]
    CellFull {
        wagon: WagonId,
        row: usize,
        col: usize,
        capacity: u32,
    },

    #[error("{wagon} cell ({row}, {col}) is outside the {width}x{length} grid")]
    CellOutOfBounds {
        wagon: WagonId,
        row: usize,
        col: usize,
        width: usize,
        length: usize,
    },

    #[error("{wagon} cell ({row}, {col}) is already empty")]
    CellEmpty { wagon: WagonId, row: usize, col: usize },

    #[error("{wagon} has no free cell (capacity {capacity})")]
    WagonFull { wagon: WagonId, capacity: usize },

    #[error("{station} platform holds {waiting} passengers, capacity {capacity}")]
    StationOverCapacity {
        station: StationId,
        waiting: usize,
        capacity: usize,
    },

    #[error("{wagon} cannot move from {from} to {to}")]
    IllegalTransition {
        wagon: WagonId,
        from: WagonState,
        to: WagonState,
    },

    #[error("{wagon} grid holds {grid} passengers but its list holds {listed}")]
    OccupancyMismatch {
        wagon: WagonId,
        grid: usize,
        listed: usize,
    },

    #[error("{wagon} ownership is inconsistent: {detail}")]
    Ownership { wagon: WagonId, detail: String },

    #[error("unknown {0}")]
    UnknownWagon(WagonId),

    #[error("passenger count drifted: generated {generated}, accounted {accounted}")]
    Conservation { generated: u64, accounted: u64 },
}
