//! Station Components
//!
//! Fixed track points that own dwelling wagons and queue passengers.

use metro_events::{StationId, WagonId};

use super::passenger::Passenger;

/// Track positions derived once from line kinematics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPoints {
    /// Where a cruising wagon must detach to stop at the platform
    pub decouple: f64,
    /// Train position at which a waiting wagon starts accelerating
    pub recouple_trigger: f64,
    /// Where an accelerating wagon reaches line speed
    pub couple: f64,
}

#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub position: f64,
    /// Maximum platform queue
    pub capacity: usize,
    /// Hourly passengers toward each station, in line order
    pub flows: Vec<f64>,
    pub outbound_flow: f64,
    pub destination_probabilities: Vec<f64>,
    pub waiting: Vec<Passenger>,
    pub arrived: Vec<Passenger>,
    pub failed: Vec<Passenger>,
    /// Dwelling wagons, in decouple order
    pub wagons: Vec<WagonId>,
    pub points: KinematicPoints,
}

impl Station {
    pub fn new(
        id: StationId,
        name: impl Into<String>,
        position: f64,
        capacity: usize,
        flows: Vec<f64>,
        points: KinematicPoints,
    ) -> Self {
        let outbound_flow: f64 = flows.iter().sum();
        let destination_probabilities = if outbound_flow > 0.0 {
            flows.iter().map(|f| f / outbound_flow).collect()
        } else {
            vec![0.0; flows.len()]
        };
        Self {
            id,
            name: name.into(),
            position,
            capacity,
            flows,
            outbound_flow,
            destination_probabilities,
            waiting: Vec::new(),
            arrived: Vec::new(),
            failed: Vec::new(),
            wagons: Vec::new(),
            points,
        }
    }

    /// Expected new passengers per tick.
    pub fn arrival_rate(&self) -> f64 {
        self.outbound_flow / metro_events::TICKS_PER_HOUR as f64
    }

    pub fn is_full(&self) -> bool {
        self.waiting.len() >= self.capacity
    }

    /// Passengers this station holds in any list.
    pub fn passenger_count(&self) -> usize {
        self.waiting.len() + self.arrived.len() + self.failed.len()
    }

    pub fn remove_wagon(&mut self, wagon: WagonId) -> bool {
        match self.wagons.iter().position(|&w| w == wagon) {
            Some(idx) => {
                self.wagons.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> KinematicPoints {
        KinematicPoints {
            decouple: 0.0,
            recouple_trigger: 0.0,
            couple: 0.0,
        }
    }

    #[test]
    fn test_probabilities_normalize_flows() {
        let station = Station::new(StationId(0), "A", 100.0, 10, vec![0.0, 30.0, 10.0], points());
        assert_eq!(station.outbound_flow, 40.0);
        assert_eq!(station.destination_probabilities, vec![0.0, 0.75, 0.25]);
        assert!((station.arrival_rate() - 40.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_flow_station() {
        let station = Station::new(StationId(1), "B", 100.0, 10, vec![0.0, 0.0], points());
        assert_eq!(station.arrival_rate(), 0.0);
        assert!(station.destination_probabilities.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_remove_wagon() {
        let mut station = Station::new(StationId(0), "A", 0.0, 0, vec![0.0], points());
        station.wagons = vec![WagonId(3), WagonId(5)];
        assert!(station.is_full());
        assert!(station.remove_wagon(WagonId(3)));
        assert!(!station.remove_wagon(WagonId(3)));
        assert_eq!(station.wagons, vec![WagonId(5)]);
    }
}
