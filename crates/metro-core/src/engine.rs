//! Simulation Engine
//!
//! Owns the line and advances it one tick at a time. A tick runs, in order:
//! train motion, decouple detection, dwelling wagons (braking, platform
//! exchange, restarting, coupling), intra-train diffusion, passenger timers
//! and, once warm-up is over, demand.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use metro_events::{
    EventKind, Outcome, PassengerId, PassengerRecord, RunReport, SimEvent, SimTimestamp, StationId, StationSnapshot,
    StationSummary, TickSnapshot, TrainSnapshot, WagonId, WagonSnapshot, WagonState, TICKS_PER_HOUR,
};

use crate::components::{IdGenerator, Owner, Passenger, Station, Train, Wagon, WagonArena};
use crate::config::Config;
use crate::error::{ConfigError, SimError};
use crate::events::TickEvents;
use crate::setup::build_line;
use crate::systems::{self, crossed_forward, crossed_inclusive, Kinematics};

/// Seeded random number generator shared by every stochastic rule
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

pub struct SimulationEngine {
    kinematics: Kinematics,
    headway: f64,
    warmup_ticks: u64,
    total_ticks: u64,
    /// Ticks completed so far
    tick: u64,
    stations: Vec<Station>,
    trains: Vec<Train>,
    wagons: WagonArena,
    ids: IdGenerator,
    rng: SimRng,
    events: TickEvents,
    generated: u64,
    discarded: u64,
    decouples: u64,
    couples: u64,
}

impl SimulationEngine {
    /// Validates `config` and lays out the line at tick 0.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let line = build_line(config);
        info!(
            stations = line.stations.len(),
            trains = line.trains.len(),
            wagons = line.wagons.len(),
            track_m = config.track_length(),
            headway_s = config.headway(),
            "line built"
        );
        Ok(Self {
            kinematics: config.kinematics(),
            headway: config.headway(),
            warmup_ticks: config.warmup(),
            total_ticks: config.total_ticks(),
            tick: 0,
            stations: line.stations,
            trains: line.trains,
            wagons: line.wagons,
            ids: IdGenerator::new(),
            rng: SimRng::from_seed(config.simulation.seed),
            events: TickEvents::new(),
            generated: 0,
            discarded: 0,
            decouples: 0,
            couples: 0,
        })
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn warmup_ticks(&self) -> u64 {
        self.warmup_ticks
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.total_ticks
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn wagons(&self) -> &WagonArena {
        &self.wagons
    }

    pub fn wagon(&self, id: WagonId) -> Option<&Wagon> {
        self.wagons.get(id)
    }

    /// Passengers ever enqueued on a platform.
    pub fn total_generated(&self) -> u64 {
        self.generated
    }

    pub fn total_discarded(&self) -> u64 {
        self.discarded
    }

    /// Enqueues a passenger at `origin` outside of demand generation.
    pub fn spawn_passenger(&mut self, origin: StationId, destination: StationId) -> Option<PassengerId> {
        let station = self.stations.get_mut(origin.index())?;
        if station.is_full() {
            return None;
        }
        let id = self.ids.next_passenger();
        station
            .waiting
            .push(Passenger::new(id, origin, destination));
        self.generated += 1;
        Some(id)
    }

    /// Takes the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Runs the remaining ticks.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.is_finished() {
            self.tick()?;
        }
        Ok(())
    }

    /// Advances the line by one tick.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let tick = self.tick;
        self.advance_trains(tick);
        self.detect_decouples(tick)?;
        self.advance_dwelling(tick)?;
        self.diffuse()?;
        self.advance_timers();
        if tick >= self.warmup_ticks {
            if tick == self.warmup_ticks {
                info!(tick, "warm-up complete, demand starts");
            }
            self.generate_demand(tick);
        }
        self.tick += 1;
        Ok(())
    }

    fn emit(&mut self, tick: u64, kind: EventKind) {
        let id = self.events.next_id();
        self.events.push(SimEvent::new(id, SimTimestamp::from_tick(tick), kind));
    }

    fn advance_trains(&mut self, tick: u64) {
        let k = self.kinematics;
        for train in &mut self.trains {
            let position = train.position_at(tick, k.speed, k.wagon_length, k.track_length);
            train.trace.advance(position);
            for (index, &id) in train.wagons.iter().enumerate() {
                if let Some(wagon) = self.wagons.get_mut(id) {
                    wagon.trace.advance(position - index as f64 * k.wagon_length);
                    wagon.speed = k.speed;
                } else {
                    warn!(wagon = %id, train = %train.id, "train lists an unknown wagon");
                }
            }
        }
    }

    fn detect_decouples(&mut self, tick: u64) -> Result<(), SimError> {
        for t in 0..self.trains.len() {
            let train = &self.trains[t];
            if !train.has_departed(tick) {
                continue;
            }
            let Some(trailing) = train.trailing_wagon() else {
                continue;
            };
            let trace = self.wagons.try_get(trailing)?.trace;
            let Some(s) = self
                .stations
                .iter()
                .position(|station| crossed_forward(trace.previous, trace.current, station.points.decouple))
            else {
                continue;
            };

            let train_id = self.trains[t].id;
            let decoupled = systems::decouple_trailing_wagon(
                &mut self.trains[t],
                &mut self.stations[s],
                &mut self.wagons,
                tick,
            )?;
            if let Some((wagon, assigned_station)) = decoupled {
                self.decouples += 1;
                let station = self.stations[s].id;
                self.emit(
                    tick,
                    EventKind::WagonDecoupled {
                        wagon,
                        train: train_id,
                        station,
                        assigned_station,
                    },
                );
            }
        }
        Ok(())
    }

    fn advance_dwelling(&mut self, tick: u64) -> Result<(), SimError> {
        for s in 0..self.stations.len() {
            let dwelling = self.stations[s].wagons.clone();
            for id in dwelling {
                let wagon = self.wagons.try_get_mut(id)?;
                if wagon.advanced_tick == Some(tick) {
                    continue;
                }
                wagon.advanced_tick = Some(tick);
                match wagon.state() {
                    WagonState::Decelerating => self.brake(s, id, tick)?,
                    WagonState::Waiting => self.dwell(s, id, tick)?,
                    WagonState::Accelerating => self.restart(s, id, tick)?,
                    WagonState::Cruising => {
                        return Err(SimError::Ownership {
                            wagon: id,
                            detail: format!("cruising while dwelling at {}", self.stations[s].id),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    fn brake(&mut self, s: usize, id: WagonId, tick: u64) -> Result<(), SimError> {
        let k = self.kinematics;
        let wagon = self.wagons.try_get_mut(id)?;
        let (position, speed) = k.decelerate(wagon.trace.current, wagon.speed);
        wagon.trace.advance(position);
        wagon.speed = speed;
        if speed <= 0.0 {
            wagon.speed = 0.0;
            wagon.set_state(WagonState::Waiting)?;
            debug!(wagon = %id, position, tick, "stopped at platform");
            let station = self.stations[s].id;
            self.emit(tick, EventKind::WagonStopped { wagon: id, station });
        }
        Ok(())
    }

    fn dwell(&mut self, s: usize, id: WagonId, tick: u64) -> Result<(), SimError> {
        let station = &mut self.stations[s];
        let wagon = self.wagons.try_get_mut(id)?;
        wagon.trace.hold();
        wagon.dwell_ticks += 1;

        let alighted = systems::alight(wagon, station)?;
        let boarded = systems::board(wagon, station, &mut self.rng.0)?;

        let trigger = station.points.recouple_trigger;
        let restart = self
            .trains
            .iter()
            .any(|train| crossed_inclusive(train.trace.previous, train.trace.current, trigger));

        let station_id = station.id;
        let mut departing = None;
        if restart {
            let dwell_ticks = wagon.dwell_ticks;
            wagon.dwell_history.push(dwell_ticks);
            wagon.dwell_ticks = 0;
            for passenger in &mut wagon.passengers {
                passenger.recently_boarded = false;
            }
            wagon.set_state(WagonState::Accelerating)?;
            debug!(wagon = %id, station = %station_id, dwell_ticks, "leaving platform");
            departing = Some(dwell_ticks);
        }

        if !alighted.is_empty() {
            self.emit(
                tick,
                EventKind::PassengersAlighted {
                    wagon: id,
                    station: station_id,
                    arrived: alighted.arrived,
                    failed: alighted.failed,
                },
            );
        }
        if !boarded.is_empty() {
            self.emit(
                tick,
                EventKind::PassengersBoarded {
                    wagon: id,
                    station: station_id,
                    passengers: boarded,
                },
            );
        }
        if let Some(dwell_ticks) = departing {
            self.emit(
                tick,
                EventKind::WagonDeparting {
                    wagon: id,
                    station: station_id,
                    dwell_ticks,
                },
            );
        }
        Ok(())
    }

    fn restart(&mut self, s: usize, id: WagonId, tick: u64) -> Result<(), SimError> {
        let k = self.kinematics;
        let wagon = self.wagons.try_get_mut(id)?;
        let (position, speed) = k.accelerate(wagon.trace.current, wagon.speed);
        wagon.trace.advance(position);
        wagon.speed = speed;
        if speed < k.speed {
            return Ok(());
        }
        wagon.speed = k.speed;
        wagon.set_state(WagonState::Cruising)?;

        let station_count = self.stations.len();
        let coupled = systems::couple_wagon(
            id,
            &mut self.stations[s],
            &mut self.trains,
            &mut self.wagons,
            station_count,
            k.wagon_length,
        )?;
        self.couples += 1;
        let station = self.stations[s].id;
        self.emit(
            tick,
            EventKind::WagonCoupled {
                wagon: id,
                train: coupled.train,
                station,
                assigned_station: coupled.assigned_station,
                passengers: coupled.passengers,
            },
        );
        Ok(())
    }

    fn diffuse(&mut self) -> Result<(), SimError> {
        for train in &self.trains {
            systems::diffuse_train(&train.wagons, &mut self.wagons)?;
        }
        Ok(())
    }

    fn advance_timers(&mut self) {
        for station in &mut self.stations {
            for passenger in &mut station.waiting {
                passenger.tick_timer();
            }
        }
        for wagon in self.wagons.iter_mut() {
            for passenger in &mut wagon.passengers {
                passenger.tick_timer();
            }
        }
    }

    fn generate_demand(&mut self, tick: u64) {
        for s in 0..self.stations.len() {
            let demand = systems::generate_demand(&mut self.stations[s], &mut self.ids, &mut self.rng.0);
            if demand.is_empty() {
                continue;
            }
            self.generated += demand.generated as u64;
            self.discarded += demand.discarded as u64;
            let station = self.stations[s].id;
            self.emit(
                tick,
                EventKind::DemandGenerated {
                    station,
                    generated: demand.generated,
                    discarded: demand.discarded,
                },
            );
        }
    }

    /// Checks every cross-entity invariant of the current state.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        self.check_occupancy()?;
        self.check_ownership()?;
        self.check_conservation()
    }

    pub fn check_occupancy(&self) -> Result<(), SimError> {
        for wagon in self.wagons.iter() {
            wagon.check_occupancy()?;
        }
        for station in &self.stations {
            if station.waiting.len() > station.capacity {
                return Err(SimError::StationOverCapacity {
                    station: station.id,
                    waiting: station.waiting.len(),
                    capacity: station.capacity,
                });
            }
        }
        Ok(())
    }

    /// Every wagon is listed by exactly one parent and its owner tag agrees.
    pub fn check_ownership(&self) -> Result<(), SimError> {
        let mut parents: Vec<Option<Owner>> = vec![None; self.wagons.len()];
        let listed = self
            .trains
            .iter()
            .flat_map(|t| t.wagons.iter().map(move |&w| (w, Owner::Train(t.id))))
            .chain(
                self.stations
                    .iter()
                    .flat_map(|s| s.wagons.iter().map(move |&w| (w, Owner::Station(s.id)))),
            );

        for (id, parent) in listed {
            let wagon = self.wagons.try_get(id)?;
            let slot = &mut parents[id.index()];
            if let Some(first) = slot {
                return Err(SimError::Ownership {
                    wagon: id,
                    detail: format!("listed by both {:?} and {:?}", first, parent),
                });
            }
            if wagon.owner != parent {
                return Err(SimError::Ownership {
                    wagon: id,
                    detail: format!("listed by {:?} but tagged {:?}", parent, wagon.owner),
                });
            }
            *slot = Some(parent);
        }

        if let Some(orphan) = parents.iter().position(Option::is_none) {
            return Err(SimError::Ownership {
                wagon: WagonId(orphan as u32),
                detail: "no parent lists it".to_string(),
            });
        }
        Ok(())
    }

    /// Passengers on platforms, in wagons and resolved add up to all generated.
    pub fn check_conservation(&self) -> Result<(), SimError> {
        let at_stations: usize = self.stations.iter().map(Station::passenger_count).sum();
        let aboard: usize = self.wagons.iter().map(Wagon::occupants).sum();
        let accounted = (at_stations + aboard) as u64;
        if accounted != self.generated {
            return Err(SimError::Conservation {
                generated: self.generated,
                accounted,
            });
        }
        Ok(())
    }

    /// Read-only view of the line at the current tick.
    pub fn snapshot(&self) -> TickSnapshot {
        let mut snapshot = TickSnapshot::new(SimTimestamp::from_tick(self.tick));
        snapshot.trains = self
            .trains
            .iter()
            .map(|train| TrainSnapshot {
                train_id: train.id,
                position: self.kinematics.wrap(train.trace.current),
                wagons: self.wagon_snapshots(&train.wagons),
            })
            .collect();
        snapshot.stations = self
            .stations
            .iter()
            .map(|station| StationSnapshot {
                station_id: station.id,
                name: station.name.clone(),
                position: station.position,
                waiting: station.waiting.len(),
                arrived: station.arrived.len(),
                failed: station.failed.len(),
                wagons: self.wagon_snapshots(&station.wagons),
            })
            .collect();
        snapshot
    }

    fn wagon_snapshots(&self, ids: &[WagonId]) -> Vec<WagonSnapshot> {
        ids.iter()
            .filter_map(|&id| self.wagons.get(id))
            .map(|wagon| WagonSnapshot {
                wagon_id: wagon.id,
                position: self.kinematics.wrap(wagon.trace.current),
                occupants: wagon.occupants(),
                state: wagon.state(),
                assigned_station: wagon.assigned_station,
            })
            .collect()
    }

    /// One record per resolved passenger, in id order.
    pub fn passenger_records(&self) -> Vec<PassengerRecord> {
        let mut records: Vec<PassengerRecord> = self
            .stations
            .iter()
            .flat_map(|station| {
                let arrived = station
                    .arrived
                    .iter()
                    .map(move |p| p.to_record(station.id, Outcome::Arrived));
                let failed = station
                    .failed
                    .iter()
                    .map(move |p| p.to_record(station.id, Outcome::FailedToAlight));
                arrived.chain(failed)
            })
            .collect();
        records.sort_by_key(|r| r.passenger_id);
        records
    }

    /// Aggregate figures for the run so far.
    pub fn report(&self) -> RunReport {
        let arrived: Vec<_> = self.stations.iter().flat_map(|s| s.arrived.iter()).collect();
        let passengers_arrived = arrived.len();
        let passengers_failed: usize = self.stations.iter().map(|s| s.failed.len()).sum();
        let waiting: usize = self.stations.iter().map(|s| s.waiting.len()).sum();
        let aboard: usize = self.wagons.iter().map(Wagon::occupants).sum();

        let measured_ticks = self.tick.saturating_sub(self.warmup_ticks);
        let measured_hours = measured_ticks as f64 / TICKS_PER_HOUR as f64;
        let arrivals_per_hour = if measured_hours > 0.0 {
            passengers_arrived as f64 / measured_hours
        } else {
            0.0
        };

        let mut dwell: Vec<u64> = self
            .wagons
            .iter()
            .flat_map(|w| w.dwell_history.iter().copied())
            .collect();
        dwell.sort_unstable();

        let stations: BTreeMap<StationId, StationSummary> = self
            .stations
            .iter()
            .map(|s| {
                (
                    s.id,
                    StationSummary {
                        name: s.name.clone(),
                        arrived: s.arrived.len(),
                        failed: s.failed.len(),
                        still_waiting: s.waiting.len(),
                    },
                )
            })
            .collect();

        RunReport {
            total_ticks: self.tick,
            warmup_ticks: self.warmup_ticks,
            measured_hours,
            headway_s: self.headway,
            passengers_generated: self.generated,
            passengers_discarded: self.discarded,
            passengers_arrived,
            passengers_failed,
            passengers_in_flight: waiting + aboard,
            arrivals_per_hour,
            mean_distance_moved: mean(arrived.iter().map(|p| p.distance_moved)),
            mean_travel_time_s: mean(arrived.iter().map(|p| p.travel_ticks() as f64)),
            median_dwell_s: median(&dwell),
            decouples: self.decouples,
            couples: self.couples,
            stations,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Median of sorted values; zero when empty.
fn median(sorted: &[u64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}
