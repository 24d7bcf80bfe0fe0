//! Simulation Timestamp Types
//!
//! One tick is one simulated second. Timestamps carry both the raw tick and a
//! human-readable clock reading.
//!
//! # Example
//!
//! ```
//! use metro_events::{SimClock, SimTimestamp};
//!
//! let ts = SimTimestamp::from_tick(3725);
//! assert_eq!(ts.tick, 3725);
//! assert_eq!(ts.clock.to_string(), "01:02:05");
//! assert_eq!(ts.clock, SimClock::new(1, 2, 5));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of ticks in one simulated hour.
pub const TICKS_PER_HOUR: u64 = 3600;

/// Number of ticks in one simulated minute.
pub const TICKS_PER_MINUTE: u64 = 60;

/// Elapsed wall-clock reading of the simulation.
///
/// Serializes to strings like "02:15:09". Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimClock {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl SimClock {
    /// Creates a new SimClock.
    pub fn new(hours: u64, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Converts an elapsed tick count into a clock reading.
    pub fn from_ticks(ticks: u64) -> Self {
        Self {
            hours: ticks / TICKS_PER_HOUR,
            minutes: ((ticks % TICKS_PER_HOUR) / TICKS_PER_MINUTE) as u8,
            seconds: (ticks % TICKS_PER_MINUTE) as u8,
        }
    }

    /// Total number of ticks represented by this reading.
    pub fn as_ticks(&self) -> u64 {
        self.hours * TICKS_PER_HOUR + self.minutes as u64 * TICKS_PER_MINUTE + self.seconds as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Error type for parsing SimClock from strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseClockError {
    #[error("invalid clock format: '{0}', expected 'HH:MM:SS'")]
    InvalidFormat(String),
    #[error("invalid hours: '{0}'")]
    InvalidHours(String),
    #[error("invalid minutes: '{0}'")]
    InvalidMinutes(String),
    #[error("invalid seconds: '{0}'")]
    InvalidSeconds(String),
}

impl FromStr for SimClock {
    type Err = ParseClockError;

    /// Parses a SimClock from a string like "02:15:09".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(ParseClockError::InvalidFormat(s.to_string()));
        }

        let hours = parts[0]
            .parse::<u64>()
            .map_err(|_| ParseClockError::InvalidHours(parts[0].to_string()))?;

        let minutes = parts[1]
            .parse::<u8>()
            .ok()
            .filter(|m| *m < 60)
            .ok_or_else(|| ParseClockError::InvalidMinutes(parts[1].to_string()))?;

        let seconds = parts[2]
            .parse::<u8>()
            .ok()
            .filter(|s| *s < 60)
            .ok_or_else(|| ParseClockError::InvalidSeconds(parts[2].to_string()))?;

        Ok(SimClock::new(hours, minutes, seconds))
    }
}

// Serialized as a string so snapshots stay readable
impl Serialize for SimClock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SimClock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A point in simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTimestamp {
    /// Monotonically increasing simulation tick.
    pub tick: u64,
    /// Human-readable elapsed time.
    pub clock: SimClock,
}

impl SimTimestamp {
    /// Creates a timestamp for the given tick.
    pub fn from_tick(tick: u64) -> Self {
        Self {
            tick,
            clock: SimClock::from_ticks(tick),
        }
    }
}

impl fmt::Display for SimTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {} ({})", self.tick, self.clock)
    }
}
