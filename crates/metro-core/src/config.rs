//! Configuration System
//!
//! Loads line and run parameters from a TOML file. Every section has defaults
//! reproducing the ten-station reference line, so a partial file only needs
//! the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::systems::Kinematics;

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "metro.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub line: LineConfig,
    pub wagon: WagonConfig,
    pub stations: Vec<StationConfig>,
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Measured ticks, after warm-up
    pub duration_ticks: u64,
    /// Ticks without demand at the start; derived from the line when unset
    pub warmup_ticks: Option<u64>,
    pub snapshot_interval: u64,
}

/// Rolling stock and kinematics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub speed_kmh: f64,
    pub train_count: usize,
    pub wagons_per_train: usize,
    /// m/s²
    pub acceleration: f64,
    /// m/s²
    pub deceleration: f64,
    /// Track beyond the last station, in metres
    pub track_margin: f64,
}

/// Wagon floor, one cell per square metre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WagonConfig {
    pub length: usize,
    pub width: usize,
    /// Passengers per cell
    pub cell_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub name: String,
    /// Metres from the track origin
    pub position: f64,
    #[serde(default = "default_station_capacity")]
    pub capacity: usize,
    /// Hourly passengers toward each station, in line order
    pub flows: Vec<f64>,
}

fn default_station_capacity() -> usize {
    500
}

const REFERENCE_STATIONS: [&str; 10] = [
    "Cerrillos",
    "Lo Valledor",
    "Pedro Aguirre Cerda",
    "Franklin L6",
    "Bio Bio",
    "Nuble L6",
    "Estadio Nacional",
    "Nunoa L6",
    "Ines de Suarez",
    "Los Leones L6",
];

const REFERENCE_SPACING: f64 = 1670.0;

const REFERENCE_FLOWS: [[f64; 10]; 10] = [
    [0.0, 106.0, 28.0, 84.0, 76.0, 81.0, 185.0, 81.0, 68.0, 51.0],
    [40.0, 0.0, 22.0, 20.0, 26.0, 38.0, 68.0, 24.0, 25.0, 32.0],
    [19.0, 51.0, 0.0, 11.0, 21.0, 18.0, 33.0, 22.0, 23.0, 37.0],
    [139.0, 152.0, 44.0, 0.0, 16.0, 34.0, 55.0, 44.0, 27.0, 40.0],
    [64.0, 67.0, 18.0, 4.0, 0.0, 16.0, 26.0, 14.0, 11.0, 20.0],
    [162.0, 180.0, 29.0, 29.0, 22.0, 0.0, 38.0, 63.0, 54.0, 102.0],
    [132.0, 169.0, 48.0, 24.0, 27.0, 42.0, 0.0, 12.0, 21.0, 30.0],
    [179.0, 191.0, 72.0, 47.0, 58.0, 91.0, 24.0, 0.0, 34.0, 73.0],
    [199.0, 238.0, 61.0, 45.0, 75.0, 63.0, 53.0, 35.0, 0.0, 45.0],
    [193.0, 172.0, 106.0, 99.0, 68.0, 168.0, 115.0, 139.0, 58.0, 0.0],
];

/// The ten-station reference line.
pub fn reference_stations() -> Vec<StationConfig> {
    REFERENCE_STATIONS
        .iter()
        .zip(REFERENCE_FLOWS.iter())
        .enumerate()
        .map(|(i, (name, flows))| StationConfig {
            name: name.to_string(),
            position: REFERENCE_SPACING * (i + 1) as f64,
            capacity: default_station_capacity(),
            flows: flows.to_vec(),
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            line: LineConfig::default(),
            wagon: WagonConfig::default(),
            stations: reference_stations(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_ticks: 10_800,
            warmup_ticks: None,
            snapshot_interval: 600,
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            speed_kmh: 60.0,
            train_count: 5,
            wagons_per_train: 5,
            acceleration: 1.0,
            deceleration: 1.0,
            track_margin: 200.0,
        }
    }
}

impl Default for WagonConfig {
    fn default() -> Self {
        Self {
            length: 14,
            width: 5,
            cell_capacity: 5,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::debug!("could not load {}: {}, using defaults", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Line speed in m/s.
    pub fn speed(&self) -> f64 {
        self.line.speed_kmh * 1000.0 / 3600.0
    }

    /// Loop length: the farthest station plus the margin.
    pub fn track_length(&self) -> f64 {
        self.farthest_station() + self.line.track_margin
    }

    fn farthest_station(&self) -> f64 {
        self.stations.iter().map(|s| s.position).fold(0.0, f64::max)
    }

    /// Ticks before demand starts.
    ///
    /// Defaults to the time a train needs to reach the farthest station.
    pub fn warmup(&self) -> u64 {
        self.simulation
            .warmup_ticks
            .unwrap_or_else(|| (self.farthest_station() / self.speed()).ceil() as u64)
    }

    pub fn total_ticks(&self) -> u64 {
        self.simulation.duration_ticks + self.warmup()
    }

    /// Seconds between successive trains.
    pub fn headway(&self) -> f64 {
        self.track_length() / self.line.train_count as f64 / self.speed()
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            speed: self.speed(),
            acceleration: self.line.acceleration,
            deceleration: self.line.deceleration,
            wagon_length: self.wagon.length as f64,
            track_length: self.track_length(),
        }
    }

    /// Rejects parameters the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let line = &self.line;
        positive("line.speed_kmh", line.speed_kmh)?;
        positive("line.acceleration", line.acceleration)?;
        positive("line.deceleration", line.deceleration)?;
        if !(line.track_margin >= 0.0 && line.track_margin.is_finite()) {
            return Err(ConfigError::invalid(
                "line.track_margin",
                format!("must be a non-negative length, got {}", line.track_margin),
            ));
        }
        if line.train_count == 0 {
            return Err(ConfigError::invalid("line.train_count", "must be at least 1"));
        }
        if line.wagons_per_train == 0 {
            return Err(ConfigError::invalid("line.wagons_per_train", "must be at least 1"));
        }

        if self.wagon.length == 0 || self.wagon.width == 0 {
            return Err(ConfigError::invalid(
                "wagon",
                format!("grid {}x{} has no cells", self.wagon.width, self.wagon.length),
            ));
        }
        if self.wagon.cell_capacity == 0 {
            return Err(ConfigError::invalid("wagon.cell_capacity", "must be at least 1"));
        }

        if self.stations.is_empty() {
            return Err(ConfigError::invalid("stations", "line has no stations"));
        }
        let count = self.stations.len();
        let track = self.track_length();
        positive("track length", track)?;

        let kinematics = self.kinematics();
        let mut previous: Option<f64> = None;
        for station in &self.stations {
            if !station.position.is_finite() || station.position < 0.0 || station.position >= track {
                return Err(ConfigError::invalid(
                    "stations.position",
                    format!("{} at {} is outside the {} m track", station.name, station.position, track),
                ));
            }
            if let Some(prev) = previous {
                if station.position <= prev {
                    return Err(ConfigError::invalid(
                        "stations.position",
                        format!("{} at {} does not follow {}", station.name, station.position, prev),
                    ));
                }
            }
            previous = Some(station.position);

            if station.flows.len() != count {
                return Err(ConfigError::invalid(
                    "stations.flows",
                    format!("{} has {} flows for {} stations", station.name, station.flows.len(), count),
                ));
            }
            if let Some(bad) = station.flows.iter().find(|f| !f.is_finite() || **f < 0.0) {
                return Err(ConfigError::invalid(
                    "stations.flows",
                    format!("{} has flow {}", station.name, bad),
                ));
            }

            let trigger = kinematics.points_for(station.position).recouple_trigger;
            if trigger <= 0.0 {
                return Err(ConfigError::invalid(
                    "stations.position",
                    format!("{} is too close to the origin to restart wagons (trigger at {:.1} m)", station.name, trigger),
                ));
            }
        }

        if self.simulation.snapshot_interval == 0 {
            return Err(ConfigError::invalid("simulation.snapshot_interval", "must be at least 1"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
    }
}
