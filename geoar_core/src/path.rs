//! Geographic paths.
//!
//! A `LocationPath` is a list of geographic waypoints plus the spline used
//! to interpolate them. Waypoints are projected into the local ENU frame of
//! an origin (world axes x = east, y = up, z = north) before interpolation.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::geodesy;
use crate::location::GeoPoint;
use crate::spline::{build_spline, Spline, SplineType, DEFAULT_ALPHA};

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// Geographic locations joined by a spline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPath {
    pub locations: Vec<GeoPoint>,

    #[serde(default)]
    pub spline_type: SplineType,

    /// Catmull-Rom tension
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl LocationPath {
    pub fn new(locations: Vec<GeoPoint>, spline_type: SplineType) -> Self {
        Self {
            locations,
            spline_type,
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Waypoints as world positions relative to `origin`.
    ///
    /// Locations with `AltitudeMode::Ignore` are placed at height zero.
    pub fn world_points(&self, origin: &GeoPoint) -> Vec<Vector3<f64>> {
        self.locations
            .iter()
            .map(|loc| {
                geodesy::vector_from_to(origin, loc, loc.ignore_altitude()).to_world_vector()
            })
            .collect()
    }

    /// Builds the path's spline in the frame of `origin`, sampling each
    /// segment with `n` points.
    pub fn to_spline(
        &self,
        origin: &GeoPoint,
        n: usize,
    ) -> Result<Box<dyn Spline + Send + Sync>, ConfigError> {
        let points = self.world_points(origin);
        let spline = build_spline(self.spline_type, &points, n, self.alpha)?;

        debug!(
            waypoints = points.len(),
            length_m = spline.length(),
            kind = ?self.spline_type,
            "Built location path spline"
        );

        Ok(spline)
    }
}
