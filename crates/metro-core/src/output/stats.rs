//! Statistics Output
//!
//! Event-derived run statistics and the end-of-run files.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use metro_events::{EventKind, EventType, PassengerRecord, RunReport, SimEvent};

use super::OutputError;

/// Summary of one tick for the history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub event_count: usize,
    pub boarded: usize,
    pub arrived: usize,
    pub failed: usize,
    pub generated: usize,
}

/// Event statistics for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub total_events: usize,
    pub events_by_type: BTreeMap<EventType, usize>,
    pub average_events_per_tick: f64,
    pub peak_boarding_tick: Option<u64>,
    pub tick_history: Vec<TickSummary>,
}

/// Accumulates statistics from each tick's events
#[derive(Debug, Default)]
pub struct StatsCollector {
    pub total_events: usize,
    pub events_by_type: BTreeMap<EventType, usize>,
    pub tick_history: Vec<TickSummary>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events from a tick
    pub fn record_tick(&mut self, tick: u64, events: &[SimEvent]) {
        let mut summary = TickSummary {
            tick,
            event_count: events.len(),
            ..TickSummary::default()
        };

        for event in events {
            self.total_events += 1;
            *self.events_by_type.entry(event.event_type()).or_insert(0) += 1;

            match &event.kind {
                EventKind::PassengersBoarded { passengers, .. } => summary.boarded += passengers.len(),
                EventKind::PassengersAlighted { arrived, failed, .. } => {
                    summary.arrived += arrived.len();
                    summary.failed += failed.len();
                }
                EventKind::DemandGenerated { generated, .. } => summary.generated += generated,
                _ => {}
            }
        }

        self.tick_history.push(summary);
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events_by_type.get(&event_type).copied().unwrap_or(0)
    }

    pub fn finish(&self, total_ticks: u64) -> SimulationStats {
        let peak_boarding_tick = self
            .tick_history
            .iter()
            .filter(|t| t.boarded > 0)
            .max_by_key(|t| (t.boarded, std::cmp::Reverse(t.tick)))
            .map(|t| t.tick);

        SimulationStats {
            total_ticks,
            total_events: self.total_events,
            events_by_type: self.events_by_type.clone(),
            average_events_per_tick: if total_ticks > 0 {
                self.total_events as f64 / total_ticks as f64
            } else {
                0.0
            },
            peak_boarding_tick,
            tick_history: self.tick_history.clone(),
        }
    }
}

/// Write run statistics as pretty JSON
pub fn write_stats(stats: &SimulationStats, path: &Path) -> Result<(), OutputError> {
    fs::write(path, serde_json::to_string_pretty(stats)?)?;
    Ok(())
}

pub fn write_report(report: &RunReport, path: &Path) -> Result<(), OutputError> {
    fs::write(path, report.to_json_pretty()?)?;
    Ok(())
}

/// Write every resolved passenger as a JSON array
pub fn write_records(records: &[PassengerRecord], path: &Path) -> Result<(), OutputError> {
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metro_events::{Outcome, PassengerId, SimTimestamp, StationId, WagonId};

    fn event(tick: u64, kind: EventKind) -> SimEvent {
        SimEvent::new(format!("evt_{}", tick), SimTimestamp::from_tick(tick), kind)
    }

    #[test]
    fn test_record_tick_counts_passengers() {
        let mut stats = StatsCollector::new();
        stats.record_tick(
            5,
            &[
                event(
                    5,
                    EventKind::PassengersBoarded {
                        wagon: WagonId(0),
                        station: StationId(1),
                        passengers: vec![PassengerId(1), PassengerId(2)],
                    },
                ),
                event(
                    5,
                    EventKind::PassengersAlighted {
                        wagon: WagonId(0),
                        station: StationId(1),
                        arrived: vec![PassengerId(3)],
                        failed: vec![PassengerId(4), PassengerId(5)],
                    },
                ),
            ],
        );
        stats.record_tick(6, &[]);

        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.count(EventType::Boarding), 1);
        assert_eq!(stats.count(EventType::Couple), 0);
        assert_eq!(
            stats.tick_history[0],
            TickSummary {
                tick: 5,
                event_count: 2,
                boarded: 2,
                arrived: 1,
                failed: 2,
                generated: 0,
            }
        );

        let summary = stats.finish(10);
        assert_eq!(summary.peak_boarding_tick, Some(5));
        assert!((summary.average_events_per_tick - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_write_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passengers.json");
        let records = vec![PassengerRecord {
            passenger_id: PassengerId(1),
            origin: StationId(0),
            destination: StationId(1),
            alighted_at: StationId(1),
            outcome: Outcome::Arrived,
            travel_time_s: 90,
            wait_time_s: 30,
            ride_time_s: 60,
            distance_moved: 3.0,
        }];
        write_records(&records, &path).unwrap();

        let parsed: Vec<PassengerRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        write_stats(&StatsCollector::new().finish(0), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"total_events\": 0"));
    }
}
