//! Field-condition scenarios for DST.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioId {
    /// GEO-001: Nominal walk, GPS acquires after a short cold start
    CityWalk,

    /// GEO-002: Location service never comes up
    ColdStartTimeout,

    /// GEO-003: GPS lost for a stretch of the walk (tunnel, underpass)
    GpsDenied,

    /// GEO-004: Multipath outliers that the accuracy radius must reject
    NoisyFix,

    /// GEO-005: Walker turns through north with a smoothed compass
    NorthCrossing,

    /// GEO-006: Breadcrumbs turned into a spline and traversed by arc length
    PathFollow,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::CityWalk,
            ScenarioId::ColdStartTimeout,
            ScenarioId::GpsDenied,
            ScenarioId::NoisyFix,
            ScenarioId::NorthCrossing,
            ScenarioId::PathFollow,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::CityWalk => "city_walk",
            ScenarioId::ColdStartTimeout => "cold_start_timeout",
            ScenarioId::GpsDenied => "gps_denied",
            ScenarioId::NoisyFix => "noisy_fix",
            ScenarioId::NorthCrossing => "north_crossing",
            ScenarioId::PathFollow => "path_follow",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::CityWalk => "60s walk, 3m GPS noise, verify acceptance cadence and position error",
            ScenarioId::ColdStartTimeout => "Service stuck initializing, verify 'Timed out' after the wait budget",
            ScenarioId::GpsDenied => "20s GPS blackout mid-walk, verify frames no-op and recovery",
            ScenarioId::NoisyFix => "30% outlier fixes, verify accuracy-radius rejection",
            ScenarioId::NorthCrossing => "Turning walk through 360°, verify smoothed heading has no wrap jump",
            ScenarioId::PathFollow => "Catmull-Rom path through accepted fixes, verify arc-length traversal",
        }
    }

    /// Returns true if the scenario expects the provider to fail to start.
    pub fn expects_start_failure(&self) -> bool {
        matches!(self, ScenarioId::ColdStartTimeout)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "city_walk" | "citywalk" | "geo-001" => Ok(ScenarioId::CityWalk),
            "cold_start_timeout" | "coldstarttimeout" | "cold_start" | "geo-002" => {
                Ok(ScenarioId::ColdStartTimeout)
            }
            "gps_denied" | "gpsdenied" | "geo-003" => Ok(ScenarioId::GpsDenied),
            "noisy_fix" | "noisyfix" | "geo-004" => Ok(ScenarioId::NoisyFix),
            "north_crossing" | "northcrossing" | "geo-005" => Ok(ScenarioId::NorthCrossing),
            "path_follow" | "pathfollow" | "geo-006" => Ok(ScenarioId::PathFollow),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
