//! Demand Generation
//!
//! Poisson passenger arrivals at each platform, with destinations drawn from
//! the station's row of the flow matrix.

use metro_events::StationId;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use tracing::trace;

use crate::components::{IdGenerator, Passenger, Station};

/// Passengers produced by one station in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demand {
    /// Enqueued on the platform
    pub generated: usize,
    /// Drawn but turned away by a full platform
    pub discarded: usize,
}

impl Demand {
    pub fn is_empty(&self) -> bool {
        self.generated == 0 && self.discarded == 0
    }
}

/// Generates one tick of arrivals at `station`.
///
/// A full platform draws nothing. Arrivals beyond the free space are the
/// most recent ones and are discarded. Draws of the station itself as the
/// destination are dropped.
pub fn generate_demand<R: Rng + ?Sized>(
    station: &mut Station,
    ids: &mut IdGenerator,
    rng: &mut R,
) -> Demand {
    let mut demand = Demand::default();
    if station.is_full() {
        return demand;
    }

    let rate = station.arrival_rate();
    if rate <= 0.0 || !rate.is_finite() {
        return demand;
    }
    let Ok(poisson) = Poisson::new(rate) else {
        return demand;
    };
    let Ok(destinations) = WeightedIndex::new(&station.destination_probabilities) else {
        return demand;
    };

    let draws = poisson.sample(rng) as u64;
    for _ in 0..draws {
        let destination = StationId(destinations.sample(rng) as u32);
        if destination == station.id {
            continue;
        }
        if station.waiting.len() >= station.capacity {
            demand.discarded += 1;
            continue;
        }
        let passenger = Passenger::new(ids.next_passenger(), station.id, destination);
        station.waiting.push(passenger);
        demand.generated += 1;
    }

    if !demand.is_empty() {
        trace!(
            station = %station.id,
            generated = demand.generated,
            discarded = demand.discarded,
            "demand"
        );
    }
    demand
}
