//! End-of-run records
//!
//! Per-passenger outcome records and the aggregate run report consumed by
//! export and plotting tools.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{PassengerId, StationId};

/// How a passenger's journey ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Alighted at the destination
    Arrived,
    /// Forced off at another station
    FailedToAlight,
}

/// One resolved passenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub passenger_id: PassengerId,
    pub origin: StationId,
    pub destination: StationId,
    /// Station where the passenger actually left the system
    pub alighted_at: StationId,
    pub outcome: Outcome,
    /// Platform wait plus riding time, in seconds
    pub travel_time_s: u64,
    pub wait_time_s: u64,
    pub ride_time_s: u64,
    /// Cumulative in-wagon distance walked
    pub distance_moved: f64,
}

impl PassengerRecord {
    pub fn arrived(&self) -> bool {
        self.outcome == Outcome::Arrived
    }
}

/// Stations passed between two names along a fixed loop order.
///
/// Returns `None` if either name is missing from `order`. Destinations behind
/// the origin wrap around the end of the list.
pub fn stations_traversed(order: &[String], from: &str, to: &str) -> Option<usize> {
    let start = order.iter().position(|s| s == from)?;
    let end = order.iter().position(|s| s == to)?;
    Some(station_difference(start, end, order.len()))
}

/// Modular index difference along a loop of `station_count` stations.
pub fn station_difference(start: usize, end: usize, station_count: usize) -> usize {
    if end >= start {
        end - start
    } else {
        station_count - start + end
    }
}

/// Per-station totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub name: String,
    pub arrived: usize,
    pub failed: usize,
    pub still_waiting: usize,
}

/// Aggregate figures for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub total_ticks: u64,
    pub warmup_ticks: u64,
    /// Hours of operation after warm-up
    pub measured_hours: f64,
    pub headway_s: f64,
    pub passengers_generated: u64,
    pub passengers_discarded: u64,
    pub passengers_arrived: usize,
    pub passengers_failed: usize,
    pub passengers_in_flight: usize,
    pub arrivals_per_hour: f64,
    /// Mean in-wagon distance walked by arrived passengers
    pub mean_distance_moved: f64,
    pub mean_travel_time_s: f64,
    /// Median of completed wagon dwell times, in seconds
    pub median_dwell_s: f64,
    pub decouples: u64,
    pub couples: u64,
    pub stations: BTreeMap<StationId, StationSummary>,
}

impl RunReport {
    /// Serializes the report to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Share of resolved passengers who reached their destination.
    pub fn success_rate(&self) -> f64 {
        let resolved = self.passengers_arrived + self.passengers_failed;
        if resolved == 0 {
            0.0
        } else {
            self.passengers_arrived as f64 / resolved as f64
        }
    }
}
