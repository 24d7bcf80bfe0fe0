//! Line Setup
//!
//! Builds stations, trains and the wagon fleet from configuration.

use metro_events::{StationId, TrainId};
use rand::Rng;

use crate::components::{OccupancyGrid, Station, Train, Wagon, WagonArena};
use crate::config::{Config, StationConfig};

/// Everything on the line at tick 0.
#[derive(Debug, Clone)]
pub struct Line {
    pub stations: Vec<Station>,
    pub trains: Vec<Train>,
    pub wagons: WagonArena,
}

/// Stations are spaced this far apart on a synthetic line.
pub const SYNTHETIC_SPACING: f64 = 2000.0;

/// Creates the stations, trains and wagons described by `config`.
///
/// Each train departs one headway after the previous one. Its wagons are
/// assigned stations in line order counting from the rear wagon, and every
/// station starts with one idle wagon of its own.
pub fn build_line(config: &Config) -> Line {
    let kinematics = config.kinematics();
    let station_count = config.stations.len();

    let mut stations: Vec<Station> = config
        .stations
        .iter()
        .enumerate()
        .map(|(i, sc)| {
            Station::new(
                StationId(i as u32),
                sc.name.clone(),
                sc.position,
                sc.capacity,
                sc.flows.clone(),
                kinematics.points_for(sc.position),
            )
        })
        .collect();

    let grid = OccupancyGrid::new(config.wagon.width, config.wagon.length, config.wagon.cell_capacity);
    let mut wagons = WagonArena::new();
    let headway = config.headway();
    let per_train = config.line.wagons_per_train;

    let trains = (0..config.line.train_count)
        .map(|t| {
            let train_id = TrainId(t as u32);
            let ids = (0..per_train)
                .map(|index| {
                    let from_rear = per_train - 1 - index;
                    let assigned = StationId((from_rear % station_count) as u32);
                    let position = -(index as f64) * kinematics.wagon_length;
                    wagons.insert(Wagon::attached(
                        wagons.next_id(),
                        grid.clone(),
                        train_id,
                        assigned,
                        kinematics.speed,
                        position,
                    ))
                })
                .collect();
            Train::new(train_id, headway * t as f64, ids)
        })
        .collect();

    for station in &mut stations {
        let id = wagons.insert(Wagon::initial(wagons.next_id(), grid.clone(), station.id, station.position));
        station.wagons.push(id);
    }

    Line {
        stations,
        trains,
        wagons,
    }
}

/// A line of `count` stations with random flows, for experiments.
///
/// Flows toward every other station are drawn from 1000 to 2000 per hour.
pub fn synthetic_stations<R: Rng + ?Sized>(count: usize, capacity: usize, rng: &mut R) -> Vec<StationConfig> {
    (0..count)
        .map(|s| StationConfig {
            name: format!("Station {}", s + 1),
            position: SYNTHETIC_SPACING * (s + 1) as f64,
            capacity,
            flows: (0..count)
                .map(|d| if d == s { 0.0 } else { rng.gen_range(1000..=2000) as f64 })
                .collect(),
        })
        .collect()
}
