//! Ground truth oracle for simulation.
//!
//! The Oracle maintains the "God's eye view" of the simulated walker:
//! - True position in the local frame of a geographic origin
//! - Kinematics (constant speed, optional constant turn rate)
//! - A breadcrumb trail of true positions for path scenarios

use geoar_core::filters::normalized_degrees;
use geoar_core::geodesy;
use geoar_core::GeoPoint;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Walker kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkProfile {
    /// Ground speed in m/s
    pub speed_mps: f64,

    /// Initial course, degrees clockwise from north
    pub initial_heading_deg: f64,

    /// Course change in degrees per second (positive turns right)
    pub turn_rate_deg_s: f64,
}

impl Default for WalkProfile {
    fn default() -> Self {
        Self {
            speed_mps: 1.4, // brisk walk
            initial_heading_deg: 45.0,
            turn_rate_deg_s: 0.0,
        }
    }
}

/// The Oracle - ground truth for one device walking around an origin.
#[derive(Debug, Clone)]
pub struct Oracle {
    /// Geographic anchor of the local frame
    origin: GeoPoint,

    walk: WalkProfile,

    /// Position in meters: x = east, y = up, z = north
    position: Vector3<f64>,

    /// Current course, degrees
    heading_deg: f64,

    /// Current simulation time (seconds)
    current_time: f64,

    /// True positions sampled every `trail_interval_secs`
    trail: Vec<Vector3<f64>>,
    trail_interval_secs: f64,
    next_trail_time: f64,

    distance_walked: f64,
}

impl Oracle {
    pub fn new(origin: GeoPoint, walk: WalkProfile) -> Self {
        Self {
            origin,
            walk,
            position: Vector3::zeros(),
            heading_deg: normalized_degrees(walk.initial_heading_deg),
            current_time: 0.0,
            trail: vec![Vector3::zeros()],
            trail_interval_secs: 5.0,
            next_trail_time: 5.0,
            distance_walked: 0.0,
        }
    }

    /// Sets how often a breadcrumb is dropped.
    pub fn set_trail_interval(&mut self, secs: f64) {
        self.trail_interval_secs = secs;
        self.next_trail_time = self.current_time + secs;
    }

    /// Advances the walker by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.heading_deg = normalized_degrees(self.heading_deg + self.walk.turn_rate_deg_s * dt);

        let (s, c) = self.heading_deg.to_radians().sin_cos();
        let velocity = Vector3::new(s, 0.0, c) * self.walk.speed_mps;

        self.position += velocity * dt;
        self.distance_walked += self.walk.speed_mps * dt;
        self.current_time += dt;

        if self.current_time >= self.next_trail_time {
            self.trail.push(self.position);
            self.next_trail_time += self.trail_interval_secs;
        }
    }

    pub fn origin(&self) -> &GeoPoint {
        &self.origin
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// True course, degrees in `[0, 360)`.
    pub fn heading(&self) -> f64 {
        self.heading_deg
    }

    pub fn time(&self) -> f64 {
        self.current_time
    }

    pub fn distance_walked(&self) -> f64 {
        self.distance_walked
    }

    pub fn trail(&self) -> &[Vector3<f64>] {
        &self.trail
    }

    /// Geographic location of a local position.
    pub fn location_of(&self, position: &Vector3<f64>) -> GeoPoint {
        geodesy::point_from_enu(&self.origin, position.x, position.z, 0.0)
    }

    /// True geographic location of the walker.
    pub fn true_location(&self) -> GeoPoint {
        self.location_of(&self.position)
    }

    /// Breadcrumbs as geographic locations.
    pub fn trail_locations(&self) -> Vec<GeoPoint> {
        self.trail.iter().map(|p| self.location_of(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn origin() -> GeoPoint {
        GeoPoint::new(52.52, 13.405, 0.0)
    }

    #[test]
    fn test_straight_walk() {
        let walk = WalkProfile {
            speed_mps: 2.0,
            initial_heading_deg: 90.0,
            turn_rate_deg_s: 0.0,
        };
        let mut oracle = Oracle::new(origin(), walk);

        for _ in 0..100 {
            oracle.step(0.1);
        }

        assert_relative_eq!(oracle.time(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.position().x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.position().z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.distance_walked(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_true_location_matches_local_offset() {
        let mut oracle = Oracle::new(origin(), WalkProfile::default());
        for _ in 0..300 {
            oracle.step(0.1);
        }

        let d = geodesy::horizontal_distance(oracle.origin(), &oracle.true_location());
        let local = oracle.position().xz().norm();
        assert_relative_eq!(d, local, epsilon = 1e-3);
    }

    #[test]
    fn test_turning_wraps_heading() {
        let walk = WalkProfile {
            speed_mps: 1.0,
            initial_heading_deg: 350.0,
            turn_rate_deg_s: 5.0,
        };
        let mut oracle = Oracle::new(origin(), walk);

        for _ in 0..40 {
            oracle.step(0.1);
        }

        assert_relative_eq!(oracle.heading(), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_trail_breadcrumbs() {
        let mut oracle = Oracle::new(origin(), WalkProfile::default());
        oracle.set_trail_interval(1.0);

        for _ in 0..50 {
            oracle.step(0.1);
        }

        // Origin plus one crumb per second
        assert!(oracle.trail().len() >= 5);
        assert_eq!(oracle.trail()[0], Vector3::zeros());
        assert_eq!(oracle.trail_locations().len(), oracle.trail().len());
    }
}
