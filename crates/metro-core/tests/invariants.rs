//! Invariant tests
//!
//! Long runs checking occupancy, ownership and passenger conservation after
//! every tick.

use metro_core::setup::synthetic_stations;
use metro_core::{Config, SimRng, SimulationEngine};
use metro_events::{EventKind, EventType, StationId};

fn run_checked(config: &Config) -> (SimulationEngine, Vec<metro_events::SimEvent>) {
    let mut engine = SimulationEngine::new(config).unwrap();
    let mut events = Vec::new();
    engine.check_invariants().unwrap();
    while !engine.is_finished() {
        engine.tick().unwrap();
        if let Err(e) = engine.check_invariants() {
            panic!("invariant broken after tick {}: {}", engine.current_tick(), e);
        }
        events.extend(engine.drain_events());
    }
    (engine, events)
}

#[test]
fn test_reference_line_holds_invariants() {
    let mut config = Config::default();
    config.simulation.warmup_ticks = Some(0);
    config.simulation.duration_ticks = 3_600;

    let (engine, events) = run_checked(&config);
    let report = engine.report();

    assert!(report.passengers_generated > 0);
    assert_eq!(
        report.passengers_arrived + report.passengers_failed + report.passengers_in_flight,
        report.passengers_generated as usize
    );

    let decouples = events.iter().filter(|e| e.event_type() == EventType::Decouple).count() as u64;
    let couples = events.iter().filter(|e| e.event_type() == EventType::Couple).count() as u64;
    assert_eq!(decouples, report.decouples);
    assert_eq!(couples, report.couples);
    assert!(decouples > 0);
    // every coupled wagon was either decoupled earlier or started at a station
    assert!(couples <= decouples + engine.stations().len() as u64);

    // the fleet size never changes
    let attached: usize = engine.trains().iter().map(|t| t.wagons.len()).sum();
    let dwelling: usize = engine.stations().iter().map(|s| s.wagons.len()).sum();
    assert_eq!(attached + dwelling, 35);
}

#[test]
fn test_synthetic_line_holds_invariants() {
    let mut config = Config::default();
    config.simulation.warmup_ticks = Some(0);
    config.simulation.duration_ticks = 2_400;
    config.line.train_count = 3;
    config.line.wagons_per_train = 4;
    let mut rng = SimRng::from_seed(9);
    config.stations = synthetic_stations(6, 300, &mut rng.0);
    config.validate().unwrap();

    let (engine, _) = run_checked(&config);
    assert!(engine.total_generated() > 0);
    for station in engine.stations() {
        assert!(station.waiting.len() <= station.capacity);
    }
}

#[test]
fn test_zero_flow_station_generates_nothing() {
    let mut config = Config::default();
    config.simulation.warmup_ticks = Some(0);
    config.simulation.duration_ticks = 3_000;
    let silent = StationId(4);
    config.stations[silent.index()].flows = vec![0.0; 10];

    let (engine, events) = run_checked(&config);

    assert!(engine.total_generated() > 0);
    assert!(!events.iter().any(|e| matches!(
        e.kind,
        EventKind::DemandGenerated { station, .. } if station == silent
    )));
    assert!(engine.stations()[silent.index()].waiting.is_empty());
    assert!(engine.passenger_records().iter().all(|r| r.origin != silent));
}

#[test]
fn test_full_platform_discards_excess() {
    let mut config = Config::default();
    config.simulation.warmup_ticks = Some(0);
    config.simulation.duration_ticks = 1_200;
    for station in &mut config.stations {
        station.capacity = 5;
        for flow in &mut station.flows {
            *flow *= 10.0;
        }
    }

    let (engine, _) = run_checked(&config);
    assert!(engine.total_discarded() > 0);
    for station in engine.stations() {
        assert!(station.waiting.len() <= 5);
    }
}
