//! Identifier newtypes shared by the engine and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Passenger identifier, handed out monotonically by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerId(pub u64);

/// Wagon identifier; doubles as the wagon's slot in the engine arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WagonId(pub u32);

/// Station identifier; equals the station's index in fixed line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

/// Train identifier; equals the train's index in departure order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub u32);

impl WagonId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl StationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TrainId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "passenger_{:06}", self.0)
    }
}

impl fmt::Display for WagonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wagon_{:03}", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "station_{:02}", self.0)
    }
}

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "train_{:02}", self.0)
    }
}
