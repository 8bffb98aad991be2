//! SimWorld - a location provider wired to simulated sensors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geoar_core::{GeoPoint, LocationProvider, ProviderConfig, ProviderError};
use serde::{Deserialize, Serialize};

use crate::context::SimContext;
use crate::driver::SimDriver;
use crate::oracle::{Oracle, WalkProfile};

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Host frame rate in Hz
    pub tick_rate_hz: u32,

    /// Simulated duration after start-up, in seconds
    pub max_duration_secs: f64,

    /// Per-axis GPS error (1σ), meters
    pub position_noise_std_m: f64,

    /// Compass error (1σ), degrees
    pub heading_noise_std_deg: f64,

    /// Where the walk begins
    pub origin: GeoPoint,

    pub walk: WalkProfile,

    pub provider: ProviderConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 30,
            max_duration_secs: 60.0,
            position_noise_std_m: 3.0,
            heading_noise_std_deg: 2.0,
            origin: GeoPoint::new(48.8584, 2.2945, 35.0).with_label("Champ de Mars"),
            walk: WalkProfile::default(),
            provider: ProviderConfig {
                max_wait_secs: 30,
                ..ProviderConfig::default()
            },
        }
    }
}

/// Event tallies collected from provider handlers.
#[derive(Debug, Default)]
pub struct EventCounters {
    pub raw: AtomicU64,
    pub accepted: AtomicU64,
    pub headings: AtomicU64,
    pub enabled: AtomicU64,
    pub restarts: AtomicU64,
    failures: Mutex<Vec<String>>,
}

impl EventCounters {
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failure(&self, message: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(message.to_string());
        }
    }
}

/// The SimWorld - container for one simulated device.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared simulation context (virtual clock)
    pub context: Arc<SimContext>,

    /// Provider under test, reading from the simulated driver
    pub provider: LocationProvider<SimDriver, SimContext>,

    /// Event tallies
    pub counters: Arc<EventCounters>,

    /// Current tick count
    tick_count: u64,
}

impl SimWorld {
    /// Creates a world with a default-configured driver.
    pub fn new(config: SimConfig) -> Self {
        Self::with_driver(config, |driver| driver)
    }

    /// Creates a world, letting the caller customize the driver.
    pub fn with_driver(config: SimConfig, customize: impl FnOnce(SimDriver) -> SimDriver) -> Self {
        let context = SimContext::shared(config.seed);

        let oracle = Oracle::new(config.origin.clone(), config.walk);
        let noise = crate::driver::SensorNoise {
            position_std_m: config.position_noise_std_m,
            heading_std_deg: config.heading_noise_std_deg,
            ..Default::default()
        };
        let driver = customize(SimDriver::new(Arc::clone(&context), oracle).with_noise(noise));

        let mut provider = LocationProvider::from_config(driver, Arc::clone(&context), &config.provider);
        let counters = Arc::new(EventCounters::default());
        Self::attach_counters(&mut provider, &counters);

        Self {
            config,
            context,
            provider,
            counters,
            tick_count: 0,
        }
    }

    fn attach_counters(
        provider: &mut LocationProvider<SimDriver, SimContext>,
        counters: &Arc<EventCounters>,
    ) {
        let c = Arc::clone(counters);
        provider.on_location_updated_raw(move |_, _| EventCounters::bump(&c.raw));
        let c = Arc::clone(counters);
        provider.on_location_updated(move |_, _| EventCounters::bump(&c.accepted));
        let c = Arc::clone(counters);
        provider.on_heading_updated(move |_, _| EventCounters::bump(&c.headings));
        let c = Arc::clone(counters);
        provider.on_enabled(move || EventCounters::bump(&c.enabled));
        let c = Arc::clone(counters);
        provider.on_restart(move || EventCounters::bump(&c.restarts));
        let c = Arc::clone(counters);
        provider.on_failed(move |msg| c.record_failure(msg));
    }

    /// Starts the provider with the configured budget.
    pub async fn start(&mut self) -> Result<(), ProviderError> {
        let config = self.config.provider.clone();
        self.provider.start_with_config(&config).await
    }

    /// Frame duration.
    pub fn dt(&self) -> f64 {
        1.0 / self.config.tick_rate_hz.max(1) as f64
    }

    /// Advances simulation by one frame and runs the provider's update.
    pub fn tick(&mut self) {
        let dt = self.dt();

        // Advance virtual time
        self.context.advance_time(Duration::from_secs_f64(dt));

        // Advance ground truth
        self.provider.driver_mut().step(dt);

        self.provider.update();

        self.tick_count += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Frames needed to cover the configured duration.
    pub fn target_ticks(&self) -> u64 {
        (self.config.max_duration_secs * self.config.tick_rate_hz as f64) as u64
    }

    pub fn oracle(&self) -> &Oracle {
        self.provider.driver().oracle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoar_env::GeoArContext;

    #[tokio::test]
    async fn test_world_starts_and_ticks() {
        let mut world = SimWorld::new(SimConfig::default());
        world.start().await.unwrap();

        // Default driver initializes for three one-second polls
        assert_eq!(world.context.now(), Duration::from_secs(3));

        for _ in 0..world.target_ticks() {
            world.tick();
        }

        assert_eq!(world.tick_count(), 1800);
        assert_eq!(EventCounters::get(&world.counters.enabled), 1);
        assert!(EventCounters::get(&world.counters.accepted) > 10);
        assert!(world.oracle().distance_walked() > 80.0);
    }
}
