//! Kinematics
//!
//! Constant-acceleration motion of detached wagons and the track points
//! derived from it. One tick is one second.

use crate::components::KinematicPoints;

/// Line-wide motion parameters, in metres and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Line speed
    pub speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub wagon_length: f64,
    pub track_length: f64,
}

impl Kinematics {
    /// Distance needed to reach line speed from rest.
    pub fn acceleration_distance(&self) -> f64 {
        self.speed * self.speed / (2.0 * self.acceleration)
    }

    pub fn time_to_line_speed(&self) -> f64 {
        self.speed / self.acceleration
    }

    /// Decouple, recouple-trigger and couple points for a platform at `position`.
    pub fn points_for(&self, position: f64) -> KinematicPoints {
        let ramp = self.acceleration_distance();
        let cruise_during_ramp = self.speed * self.time_to_line_speed();
        KinematicPoints {
            decouple: position - ramp,
            recouple_trigger: position - (cruise_during_ramp - ramp) - self.wagon_length,
            couple: position + ramp,
        }
    }

    /// One braking tick: returns the new position and speed.
    pub fn decelerate(&self, position: f64, speed: f64) -> (f64, f64) {
        let next_position = position + speed - 0.5 * self.deceleration;
        let next_speed = (speed - self.deceleration).max(0.0);
        (next_position, next_speed)
    }

    /// One accelerating tick: returns the new position and speed.
    pub fn accelerate(&self, position: f64, speed: f64) -> (f64, f64) {
        let next_position = position + speed + 0.5 * self.acceleration;
        let next_speed = (speed + self.acceleration).min(self.speed);
        (next_position, next_speed)
    }

    pub fn wrap(&self, position: f64) -> f64 {
        position.rem_euclid(self.track_length)
    }
}

/// True when a forward move from `previous` to `current` passes `point`.
///
/// A backwards jump is the loop seam and never counts, so a point the
/// seam skips over is missed.
pub fn crossed_forward(previous: f64, current: f64, point: f64) -> bool {
    current >= previous && previous < point && point <= current
}

/// True when `point` lies in `[previous, current]`.
pub fn crossed_inclusive(previous: f64, current: f64, point: f64) -> bool {
    previous <= point && point <= current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Kinematics {
        Kinematics {
            speed: 10.0,
            acceleration: 1.0,
            deceleration: 1.0,
            wagon_length: 14.0,
            track_length: 5000.0,
        }
    }

    #[test]
    fn test_points_for_station() {
        let points = line().points_for(1000.0);
        assert_eq!(points.decouple, 950.0);
        assert_eq!(points.couple, 1050.0);
        // 1000 - (10 * 10 - 50) - 14
        assert_eq!(points.recouple_trigger, 936.0);
    }

    #[test]
    fn test_braking_stops_at_platform() {
        let k = line();
        let (mut position, mut speed) = (950.0, 10.0);
        let mut ticks = 0;
        while speed > 0.0 {
            (position, speed) = k.decelerate(position, speed);
            ticks += 1;
        }
        assert_eq!(ticks, 10);
        assert!((position - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_acceleration_clamps_to_line_speed() {
        let k = line();
        let (mut position, mut speed) = (1000.0, 0.0);
        while speed < k.speed {
            (position, speed) = k.accelerate(position, speed);
        }
        assert_eq!(speed, 10.0);
        assert!((position - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossed_forward() {
        assert!(crossed_forward(940.0, 960.0, 950.0));
        assert!(crossed_forward(940.0, 950.0, 950.0));
        assert!(!crossed_forward(950.0, 960.0, 950.0));
        // stalled exactly on the point
        assert!(!crossed_forward(950.0, 950.0, 950.0));
    }

    #[test]
    fn test_seam_wrap_never_crosses() {
        assert!(!crossed_forward(995.0, 11.0, 1000.0));
        assert!(!crossed_forward(995.0, 11.0, 5.0));
    }

    #[test]
    fn test_crossed_inclusive() {
        assert!(crossed_inclusive(10.0, 10.0, 10.0));
        assert!(crossed_inclusive(5.0, 10.0, 5.0));
        assert!(!crossed_inclusive(5.0, 10.0, 11.0));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(line().wrap(5100.0), 100.0);
        assert_eq!(line().wrap(-14.0), 4986.0);
    }
}
