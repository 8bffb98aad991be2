//! Geographic points and device sensor readings.
//!
//! A `GeoPoint` is a place in the world (where content should appear); a
//! `LocationReading` / `HeadingReading` is an immutable sample produced by a
//! platform driver (where the device thinks it is, and where it is facing).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// How the altitude of a `GeoPoint` should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AltitudeMode {
    /// Relative to the nearest detected ground plane
    #[default]
    GroundRelative,

    /// Relative to the device's initial position
    DeviceRelative,

    /// Absolute, relative to sea level
    Absolute,

    /// Altitude is ignored (treated as zero in all distance/placement math)
    Ignore,
}

/// A geographical location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters
    #[serde(default)]
    pub altitude: f64,

    /// Altitude interpretation
    #[serde(default)]
    pub altitude_mode: AltitudeMode,

    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeoPoint {
    /// Creates a new point with `GroundRelative` altitude and no label.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            altitude_mode: AltitudeMode::GroundRelative,
            label: None,
        }
    }

    /// Sets the altitude mode.
    pub fn with_altitude_mode(mut self, mode: AltitudeMode) -> Self {
        self.altitude_mode = mode;
        self
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True when the altitude must not contribute to any distance.
    pub fn ignore_altitude(&self) -> bool {
        self.altitude_mode == AltitudeMode::Ignore
    }

    /// The altitude as seen by distance/placement math.
    ///
    /// `Ignore` mode forces this to zero regardless of the stored value.
    pub fn effective_altitude(&self) -> f64 {
        if self.ignore_altitude() {
            0.0
        } else {
            self.altitude
        }
    }

    /// Packs the point as `(longitude, altitude, latitude)`.
    pub fn to_vector3(&self) -> Vector3<f64> {
        Vector3::new(self.longitude, self.altitude, self.latitude)
    }

    /// Component-wise comparison of latitude, longitude and altitude.
    pub fn approx_eq(&self, other: &GeoPoint, eps: f64) -> bool {
        (self.latitude - other.latitude).abs() <= eps
            && (self.longitude - other.longitude).abs() <= eps
            && (self.altitude - other.altitude).abs() <= eps
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.latitude, self.longitude, self.altitude)
    }
}

/// An immutable location sample from the platform driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    /// Radius of uncertainty, in meters
    pub accuracy: f64,

    /// Floor index (-1 = unknown)
    pub floor: i32,

    /// Epoch time in milliseconds
    pub timestamp: i64,
}

impl LocationReading {
    /// Creates a reading with unknown floor.
    pub fn new(latitude: f64, longitude: f64, altitude: f64, accuracy: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            accuracy,
            floor: -1,
            timestamp,
        }
    }

    /// The reading's position as a `GroundRelative` point.
    pub fn to_geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude, self.altitude)
    }

    /// Horizontal distance between two readings, in meters.
    pub fn horizontal_distance(a: &LocationReading, b: &LocationReading) -> f64 {
        crate::geodesy::horizontal_distance(&a.to_geo_point(), &b.to_geo_point())
    }
}

impl Default for LocationReading {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            accuracy: 0.0,
            floor: -1,
            timestamp: 0,
        }
    }
}

impl std::fmt::Display for LocationReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LocationReading {{ lat={:.7}, lon={:.7}, alt={:.2}, accuracy={:.1}, floor={}, t={} }}",
            self.latitude, self.longitude, self.altitude, self.accuracy, self.floor, self.timestamp
        )
    }
}

/// An immutable compass sample from the platform driver.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadingReading {
    /// True heading, degrees
    pub heading: f64,

    /// Magnetic heading, degrees
    pub magnetic_heading: f64,

    /// Heading accuracy, degrees
    pub accuracy: f64,

    /// Epoch time in milliseconds
    pub timestamp: i64,

    pub is_magnetic_heading_available: bool,
}

impl std::fmt::Display for HeadingReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HeadingReading {{ heading={:.1}, magnetic={:.1}, accuracy={:.1}, t={}, magnetic_available={} }}",
            self.heading,
            self.magnetic_heading,
            self.accuracy,
            self.timestamp,
            self.is_magnetic_heading_available
        )
    }
}
