//! Provider configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Acceptance rules for promoting a raw reading to the current location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationProviderOptions {
    /// Minimum time between accepted updates, in seconds
    pub time_between_updates_s: f32,

    /// Minimum horizontal distance between accepted updates, in meters
    pub min_distance_m: f64,

    /// Maximum accepted accuracy radius, in meters. `<= 0` disables the check.
    pub accuracy_radius_m: f64,

    /// Accepted updates before the provider pauses itself. `0` is unlimited.
    pub max_update_count: u32,
}

impl Default for LocationProviderOptions {
    fn default() -> Self {
        Self {
            time_between_updates_s: 2.0,
            min_distance_m: 0.0,
            accuracy_radius_m: 25.0,
            max_update_count: 0,
        }
    }
}

impl LocationProviderOptions {
    /// Minimum time between accepted updates, in whole milliseconds.
    pub fn min_interval_ms(&self) -> i64 {
        (self.time_between_updates_s * 1000.0) as i64
    }
}

/// Everything needed to construct and start a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub options: LocationProviderOptions,

    /// Start-up budget, in one-second polls
    pub max_wait_secs: u32,

    /// Delay before requesting updates, in seconds
    pub start_delay_secs: u32,

    /// Smoothing factor for the compass heading; `0` disables smoothing
    pub compass_low_pass_factor: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            options: LocationProviderOptions::default(),
            max_wait_secs: 10_000,
            start_delay_secs: 0,
            compass_low_pass_factor: 0.0,
        }
    }
}

impl ProviderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
