//! Simulated platform driver.
//!
//! Turns the oracle's ground truth into the readings a phone would
//! produce: GPS fixes at a fixed rate with Gaussian error and a reported
//! accuracy radius, a noisy compass every frame, a configurable start-up
//! latency, and optional outages.

use std::sync::Arc;
use std::time::Duration;

use geoar_core::filters::normalized_degrees;
use geoar_core::geodesy;
use geoar_core::{HeadingReading, LocationReading, PlatformLocationDriver, ProviderStatus};
use geoar_env::GeoArContext;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::context::SimContext;
use crate::oracle::Oracle;

/// RNG stream ids, one per noise source
const GPS_STREAM: u64 = 1;
const COMPASS_STREAM: u64 = 2;

/// How the simulated location service comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupBehavior {
    /// Started on the first status poll
    Immediate,

    /// Initializing for this many polls, then started
    Delayed { polls: u32 },

    /// Initializing for this many polls, then failed
    Fails { after_polls: u32 },

    /// Initializing forever
    Never,
}

/// Sensor error model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorNoise {
    /// Per-axis horizontal GPS error, meters (1σ)
    pub position_std_m: f64,

    /// Compass error, degrees (1σ)
    pub heading_std_deg: f64,

    /// Probability that a fix is an outlier
    pub outlier_probability: f64,

    /// Per-axis error of outlier fixes, meters (1σ)
    pub outlier_std_m: f64,
}

impl Default for SensorNoise {
    fn default() -> Self {
        Self {
            position_std_m: 3.0,
            heading_std_deg: 2.0,
            outlier_probability: 0.0,
            outlier_std_m: 50.0,
        }
    }
}

/// Window of simulated time, in seconds, during which GPS is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blackout {
    pub from_secs: f64,
    pub until_secs: f64,
}

impl Blackout {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.from_secs && t < self.until_secs
    }
}

/// Counters kept by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverStats {
    pub fixes: u64,
    pub outliers: u64,
    pub dropouts: u64,
    pub status_polls: u32,
}

/// `PlatformLocationDriver` over simulated ground truth.
pub struct SimDriver {
    ctx: Arc<SimContext>,
    oracle: Oracle,

    noise: SensorNoise,
    startup: StartupBehavior,
    blackout: Option<Blackout>,

    /// Time between GPS fixes
    fix_interval: Duration,

    gps_rng: ChaCha8Rng,
    compass_rng: ChaCha8Rng,

    status: ProviderStatus,
    requested: bool,

    /// Latest GPS fix and when the next one is due (virtual time)
    last_fix: Option<LocationReading>,
    next_fix_at: Duration,

    stats: DriverStats,
}

impl SimDriver {
    pub fn new(ctx: Arc<SimContext>, oracle: Oracle) -> Self {
        let gps_rng = ctx.derive_rng(GPS_STREAM);
        let compass_rng = ctx.derive_rng(COMPASS_STREAM);

        Self {
            ctx,
            oracle,
            noise: SensorNoise::default(),
            startup: StartupBehavior::Delayed { polls: 3 },
            blackout: None,
            fix_interval: Duration::from_secs(1),
            gps_rng,
            compass_rng,
            status: ProviderStatus::Idle,
            requested: false,
            last_fix: None,
            next_fix_at: Duration::ZERO,
            stats: DriverStats::default(),
        }
    }

    pub fn with_noise(mut self, noise: SensorNoise) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_startup(mut self, startup: StartupBehavior) -> Self {
        self.startup = startup;
        self
    }

    pub fn with_blackout(mut self, blackout: Blackout) -> Self {
        self.blackout = Some(blackout);
        self
    }

    pub fn with_fix_interval(mut self, interval: Duration) -> Self {
        self.fix_interval = interval;
        self
    }

    /// Replaces the outage window; `None` clears it.
    pub fn set_blackout(&mut self, blackout: Option<Blackout>) {
        self.blackout = blackout;
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut Oracle {
        &mut self.oracle
    }

    /// Advances ground truth by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.oracle.step(dt);
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn in_blackout(&self) -> bool {
        let t = self.ctx.time_secs();
        self.blackout.map(|b| b.contains(t)).unwrap_or(false)
    }

    fn gaussian(rng: &mut ChaCha8Rng, std: f64) -> f64 {
        if std <= 0.0 {
            return 0.0;
        }
        match Normal::new(0.0, std) {
            Ok(normal) => normal.sample(rng),
            Err(_) => 0.0,
        }
    }

    /// Draws a new GPS fix from ground truth.
    fn generate_fix(&mut self) -> LocationReading {
        let outlier = self.noise.outlier_probability > 0.0
            && self.gps_rng.gen_bool(self.noise.outlier_probability.min(1.0));

        let std = if outlier {
            self.stats.outliers += 1;
            self.noise.outlier_std_m
        } else {
            self.noise.position_std_m
        };

        let east = Self::gaussian(&mut self.gps_rng, std);
        let north = Self::gaussian(&mut self.gps_rng, std);

        let truth = self.oracle.true_location();
        let fix = geodesy::point_from_enu(&truth, east, north, 0.0);

        // Phones report roughly a 68% radius
        let accuracy = (std * std::f64::consts::SQRT_2).max(1.0);

        self.stats.fixes += 1;

        LocationReading::new(
            fix.latitude,
            fix.longitude,
            truth.altitude,
            accuracy,
            self.ctx.epoch_millis().as_millis(),
        )
    }
}

impl PlatformLocationDriver for SimDriver {
    fn name(&self) -> &str {
        "SimDriver"
    }

    fn is_compass_enabled(&self) -> bool {
        true
    }

    fn read_location(&mut self) -> Option<LocationReading> {
        if self.in_blackout() {
            self.stats.dropouts += 1;
            trace!(t = self.ctx.time_secs(), "GPS blackout");
            return None;
        }

        let now = self.ctx.now();
        if self.last_fix.is_none() || now >= self.next_fix_at {
            self.last_fix = Some(self.generate_fix());
            self.next_fix_at = now + self.fix_interval;
        }

        // Between fixes the platform keeps reporting the last one
        self.last_fix
    }

    fn read_heading(&mut self) -> Option<HeadingReading> {
        let noise = Self::gaussian(&mut self.compass_rng, self.noise.heading_std_deg);
        let heading = normalized_degrees(self.oracle.heading() + noise);

        Some(HeadingReading {
            heading,
            magnetic_heading: heading,
            accuracy: self.noise.heading_std_deg,
            timestamp: self.ctx.epoch_millis().as_millis(),
            is_magnetic_heading_available: true,
        })
    }

    fn request_updates(&mut self) {
        debug!(startup = ?self.startup, "Location updates requested");
        self.requested = true;
    }

    fn refresh_status(&mut self) -> ProviderStatus {
        if !self.requested {
            return self.status;
        }

        self.stats.status_polls += 1;
        let polls = self.stats.status_polls;

        self.status = match self.startup {
            StartupBehavior::Immediate => ProviderStatus::Started,
            StartupBehavior::Delayed { polls: n } if polls > n => ProviderStatus::Started,
            StartupBehavior::Fails { after_polls } if polls > after_polls => ProviderStatus::Failed,
            _ => ProviderStatus::Initializing,
        };

        self.status
    }
}
