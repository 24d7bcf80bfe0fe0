//! Continuous Metro Simulation
//!
//! Runs the wagon-exchange line for a fixed number of ticks and writes the
//! event log, periodic snapshots, passenger records and the run report.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use metro_core::config::{Config, DEFAULT_CONFIG_PATH};
use metro_core::events::EventLogger;
use metro_core::output::{self, SnapshotGenerator, StatsCollector};
use metro_core::setup::synthetic_stations;
use metro_core::{SimRng, SimulationEngine};
use metro_events::{EventType, TICKS_PER_HOUR};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "metro_sim")]
#[command(about = "A continuous metro simulation with wagon exchange")]
struct Args {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Measured ticks after warm-up
    #[arg(long)]
    duration: Option<u64>,

    /// Number of trains on the loop
    #[arg(long)]
    trains: Option<usize>,

    /// Wagons per train
    #[arg(long)]
    wagons: Option<usize>,

    /// Interval between line snapshots (in ticks)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Replace the configured stations with a random line of this many stations
    #[arg(long)]
    synthetic_stations: Option<usize>,

    /// Output directory
    #[arg(long, default_value = "output")]
    out: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Config, metro_core::ConfigError> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(duration) = args.duration {
        config.simulation.duration_ticks = duration;
    }
    if let Some(trains) = args.trains {
        config.line.train_count = trains;
    }
    if let Some(wagons) = args.wagons {
        config.line.wagons_per_train = wagons;
    }
    if let Some(interval) = args.snapshot_interval {
        config.simulation.snapshot_interval = interval;
    }
    if let Some(count) = args.synthetic_stations {
        let capacity = config.stations.first().map(|s| s.capacity).unwrap_or(500);
        let mut rng = SimRng::from_seed(config.simulation.seed);
        config.stations = synthetic_stations(count, capacity, &mut rng.0);
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;

    println!("Continuous Metro Simulation");
    println!("===========================");
    println!("Seed: {}", config.simulation.seed);
    println!("Stations: {}", config.stations.len());
    println!(
        "Trains: {} x {} wagons",
        config.line.train_count, config.line.wagons_per_train
    );
    println!("Track length: {:.0} m", config.track_length());
    println!("Headway: {:.1} s", config.headway());
    println!(
        "Ticks: {} ({} warm-up + {} measured)",
        config.total_ticks(),
        config.warmup(),
        config.simulation.duration_ticks
    );
    println!("Snapshot interval: {}", config.simulation.snapshot_interval);
    println!();

    fs::create_dir_all(&args.out)?;
    let mut engine = SimulationEngine::new(&config)?;
    let mut logger = EventLogger::new(args.out.join("events.jsonl"))?;
    let mut stats = StatsCollector::new();
    let mut snapshots = SnapshotGenerator::new(config.simulation.snapshot_interval);

    snapshots.write(&args.out, &engine.snapshot())?;

    println!("Starting simulation...");
    while !engine.is_finished() {
        let tick = engine.current_tick();
        engine.tick()?;

        let events = engine.drain_events();
        logger.log_batch(&events)?;
        stats.record_tick(tick, &events);

        let completed = engine.current_tick();
        if snapshots.should_snapshot(completed) {
            snapshots.write(&args.out, &engine.snapshot())?;
        }
        if completed % TICKS_PER_HOUR == 0 {
            let snapshot = engine.snapshot();
            println!(
                "Tick {} / {}: {} waiting, {} aboard",
                completed,
                engine.total_ticks(),
                snapshot.passengers_waiting(),
                snapshot.passengers_aboard()
            );
        }
    }

    if snapshots.last_snapshot_tick() != Some(engine.current_tick()) {
        snapshots.write(&args.out, &engine.snapshot())?;
    }
    logger.flush()?;
    engine.check_invariants()?;

    let report = engine.report();
    output::write_report(&report, &args.out.join("report.json"))?;
    output::write_records(&engine.passenger_records(), &args.out.join("passengers.json"))?;
    output::write_stats(&stats.finish(engine.current_tick()), &args.out.join("stats.json"))?;

    println!();
    println!("Simulation complete. Ran {} ticks.", engine.current_tick());
    println!(
        "Logged {} events ({} decouples, {} couples). Generated {} snapshots.",
        logger.event_count(),
        stats.count(EventType::Decouple),
        stats.count(EventType::Couple),
        snapshots.snapshot_count()
    );
    println!();
    for summary in report.stations.values() {
        println!(
            "  {:<24} arrived {:>6}  failed {:>5}  waiting {:>4}",
            summary.name, summary.arrived, summary.failed, summary.still_waiting
        );
    }
    println!();
    println!("Passengers generated: {}", report.passengers_generated);
    println!("Passengers discarded: {}", report.passengers_discarded);
    println!(
        "Arrived over {:.2} h: {} ({:.0} per hour, {:.1}% success)",
        report.measured_hours,
        report.passengers_arrived,
        report.arrivals_per_hour,
        report.success_rate() * 100.0
    );
    println!("Mean distance moved: {:.2} cells", report.mean_distance_moved);
    println!("Mean travel time: {:.0} s", report.mean_travel_time_s);
    println!("Headway: {:.1} s", report.headway_s);
    println!("Median dwell: {:.1} s", report.median_dwell_s);
    println!("Output written to {}", args.out.display());
    Ok(())
}
