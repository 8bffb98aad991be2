//! Scenario runner - executes field-condition test scenarios.

use crate::driver::{Blackout, SensorNoise, StartupBehavior};
use crate::exporter::{FramePosition, SimEvent, SimExport, SimFrame};
use crate::oracle::WalkProfile;
use crate::scenarios::ScenarioId;
use crate::world::{EventCounters, SimConfig, SimWorld};

use geoar_core::curve::DEFAULT_SAMPLE_SIZE;
use geoar_core::filters::normalized_degrees;
use geoar_core::geodesy;
use geoar_core::{
    LocationPath, LocationReading, MovingAveragePosition, ProviderConfig, ProviderError,
    ProviderStatus, SplineType,
};
use geoar_env::GeoArContext;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds, start-up included
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Raw location events
    pub raw_updates: u64,

    /// Accepted location events (the first reading included)
    pub accepted_updates: u64,

    pub heading_updates: u64,

    /// Raw readings that never became current
    pub rejected_updates: u64,

    /// Raw readings rejected for their accuracy radius
    pub inaccurate_rejections: u64,

    /// Frames without a GPS fix
    pub dropouts: u64,

    /// Outlier fixes generated by the driver
    pub outliers: u64,

    /// Virtual seconds spent in `start()`
    pub startup_secs: f64,

    /// Seconds since the provider started, at the end of the run
    pub time_since_start_secs: f64,

    /// RMS horizontal error of accepted locations (m)
    pub rms_error_m: f64,

    /// Worst horizontal error of accepted locations (m)
    pub max_error_m: f64,

    /// Error of the accuracy-weighted average position (m)
    pub smoothed_error_m: f64,

    pub distance_from_start_m: f64,

    /// Worst smoothed heading error against truth (deg)
    pub max_heading_error_deg: f64,

    /// Largest frame-to-frame change of the smoothed heading (deg)
    pub max_heading_step_deg: f64,

    /// Length of the spline through the trail (m)
    pub path_length_m: f64,
}

/// Assertion failures gathered during a run.
#[derive(Debug, Default)]
struct Checks(Vec<String>);

impl Checks {
    fn expect(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(message());
        }
    }

    fn fail(&mut self, message: String) {
        self.0.push(message);
    }
}

/// Error statistics over accepted location updates.
#[derive(Debug, Default)]
struct ErrorTracker {
    last_count: u32,
    samples: u64,
    sum_sq: f64,
    max_error: f64,
    max_accuracy: f64,
}

impl ErrorTracker {
    /// Returns true if the provider accepted a location this frame.
    fn observe(&mut self, world: &SimWorld) -> bool {
        let count = world.provider.location_update_count();
        if count == self.last_count {
            return false;
        }
        self.last_count = count;

        let current = world.provider.current_location();
        let error = geodesy::horizontal_distance(&current.to_geo_point(), &world.oracle().true_location());

        self.samples += 1;
        self.sum_sq += error * error;
        self.max_error = self.max_error.max(error);
        self.max_accuracy = self.max_accuracy.max(current.accuracy);
        true
    }

    fn rms(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_sq / self.samples as f64).sqrt()
    }

    fn fill(&self, metrics: &mut ScenarioMetrics) {
        metrics.rms_error_m = self.rms();
        metrics.max_error_m = self.max_error;
    }
}

/// Yields each new raw reading once.
#[derive(Debug, Default)]
struct RawWatch {
    last_timestamp: Option<i64>,
}

impl RawWatch {
    fn next(&mut self, world: &SimWorld) -> Option<LocationReading> {
        let state = world.provider.state();
        if !state.is_enabled {
            return None;
        }

        let raw = state.current_location_raw;
        if self.last_timestamp == Some(raw.timestamp) {
            return None;
        }
        self.last_timestamp = Some(raw.timestamp);
        Some(raw)
    }
}

/// Optional frame capture for `--export`.
struct Recorder {
    export: Option<SimExport>,
    interval: u64,
    pending: Vec<SimEvent>,
}

impl Recorder {
    fn disabled() -> Self {
        Self {
            export: None,
            interval: 1,
            pending: Vec::new(),
        }
    }

    fn enabled(scenario: ScenarioId, seed: u64, interval: u64) -> Self {
        Self {
            export: Some(SimExport::new(scenario.name(), seed)),
            interval: interval.max(1),
            pending: Vec::new(),
        }
    }

    fn event(&mut self, event: SimEvent) {
        if self.export.is_some() {
            self.pending.push(event);
        }
    }

    /// Records a frame every `interval` ticks, or sooner if events are pending.
    fn capture(&mut self, world: &SimWorld) {
        let Some(export) = self.export.as_mut() else {
            return;
        };
        if world.tick_count() % self.interval != 0 && self.pending.is_empty() {
            return;
        }

        let origin = world.oracle().origin();
        let local = |r: &LocationReading| {
            let offset = geodesy::vector_from_to(origin, &r.to_geo_point(), true);
            FramePosition::new(offset.to_world_vector()).with_accuracy(r.accuracy)
        };

        let state = world.provider.state();
        let (raw, accepted) = if state.is_enabled {
            (
                Some(local(&state.current_location_raw)),
                Some(local(&state.current_location)),
            )
        } else {
            (None, None)
        };

        export.add_frame(SimFrame {
            time_sec: world.context.time_secs(),
            status: world.provider.status().to_string(),
            truth: FramePosition::new(world.oracle().position()),
            raw,
            accepted,
            true_heading_deg: world.oracle().heading(),
            filtered_heading_deg: state.filtered_heading,
            events: std::mem::take(&mut self.pending),
        });
    }

    fn finish(self, scenario: ScenarioId, seed: u64) -> SimExport {
        self.export
            .unwrap_or_else(|| SimExport::new(scenario.name(), seed))
    }
}

/// Smallest angle between two headings, degrees in `[0, 180]`.
fn angle_between(a: f64, b: f64) -> f64 {
    let d = normalized_degrees(a - b);
    d.min(360.0 - d)
}

/// Runs the configured number of frames, calling `observe` after each.
fn drive<F>(world: &mut SimWorld, recorder: &mut Recorder, mut observe: F)
where
    F: FnMut(&SimWorld, &mut Recorder),
{
    let ticks_per_sec = u64::from(world.config.tick_rate_hz.max(1));

    for tick in 0..world.target_ticks() {
        world.tick();
        observe(world, recorder);
        recorder.capture(world);

        // Progress log every simulated second
        if tick % ticks_per_sec == 0 {
            debug!(
                "  t={:.1}s | status={} | raw={} | accepted={}",
                world.context.time_secs(),
                world.provider.status(),
                EventCounters::get(&world.counters.raw),
                world.provider.location_update_count(),
            );
        }
    }
}

fn collect_metrics(world: &SimWorld, metrics: &mut ScenarioMetrics) {
    let counters = &world.counters;
    metrics.raw_updates = EventCounters::get(&counters.raw);
    metrics.accepted_updates = EventCounters::get(&counters.accepted);
    metrics.heading_updates = EventCounters::get(&counters.headings);
    metrics.rejected_updates = metrics.raw_updates.saturating_sub(metrics.accepted_updates);

    let stats = world.provider.driver().stats();
    metrics.dropouts = stats.dropouts;
    metrics.outliers = stats.outliers;

    metrics.distance_from_start_m = world.provider.distance_from_start_point();
    metrics.time_since_start_secs = world.provider.time_since_start().as_secs_f64();
}

/// Runs location scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Walk duration in seconds, after start-up
    max_duration_secs: f64,

    /// Overrides the default provider configuration
    provider: Option<ProviderConfig>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 30,
            max_duration_secs: 60.0,
            provider: None,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the walk duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Runs every scenario with this provider configuration.
    pub fn with_provider_config(mut self, config: ProviderConfig) -> Self {
        self.provider = Some(config);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Base world configuration shared by all scenarios.
    pub fn config(&self) -> SimConfig {
        let mut config = SimConfig {
            seed: self.seed,
            tick_rate_hz: self.tick_rate_hz,
            max_duration_secs: self.max_duration_secs,
            ..SimConfig::default()
        };
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        config
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        let mut recorder = Recorder::disabled();
        self.execute(scenario, &mut recorder).await
    }

    /// Runs a scenario, capturing frames for playback.
    ///
    /// A frame is kept every `export_interval` ticks and whenever an event
    /// (start-up, blackout edge) happens.
    pub async fn run_with_export(
        &self,
        scenario: ScenarioId,
        export_interval: u64,
    ) -> (ScenarioResult, SimExport) {
        let mut recorder = Recorder::enabled(scenario, self.seed, export_interval);
        let result = self.execute(scenario, &mut recorder).await;

        let mut export = recorder.finish(scenario, self.seed);
        export.finalize(&result);
        (result, export)
    }

    async fn execute(&self, scenario: ScenarioId, recorder: &mut Recorder) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        match scenario {
            ScenarioId::CityWalk => self.run_city_walk(recorder).await,
            ScenarioId::ColdStartTimeout => self.run_cold_start_timeout(recorder).await,
            ScenarioId::GpsDenied => self.run_gps_denied(recorder).await,
            ScenarioId::NoisyFix => self.run_noisy_fix(recorder).await,
            ScenarioId::NorthCrossing => self.run_north_crossing(recorder).await,
            ScenarioId::PathFollow => self.run_path_follow(recorder).await,
        }
    }

    fn finish(
        &self,
        scenario: ScenarioId,
        world: &SimWorld,
        metrics: ScenarioMetrics,
        mut checks: Checks,
    ) -> ScenarioResult {
        let start_failed = world.provider.status() == ProviderStatus::Failed;
        checks.expect(start_failed == scenario.expects_start_failure(), || {
            format!(
                "provider ended {} (start failure expected: {})",
                world.provider.status(),
                scenario.expects_start_failure()
            )
        });

        let passed = checks.0.is_empty();
        if !passed {
            warn!(scenario = scenario.name(), failures = ?checks.0, "Scenario assertions failed");
        }

        ScenarioResult {
            scenario,
            seed: world.context.seed(),
            passed,
            total_ticks: world.tick_count(),
            final_time_secs: world.context.time_secs(),
            failure_reason: if passed { None } else { Some(checks.0.join("; ")) },
            metrics,
        }
    }

    /// Starts the provider, recording start-up time. `Err` aborts the scenario.
    async fn start(
        &self,
        scenario: ScenarioId,
        world: &mut SimWorld,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Result<(), ScenarioResult> {
        let outcome = world.start().await;
        metrics.startup_secs = world.context.time_secs();

        match outcome {
            Ok(()) => {
                recorder.event(SimEvent::info("Location provider started"));
                Ok(())
            }
            Err(err) => {
                let mut checks = Checks::default();
                checks.fail(format!("Provider failed to start: {}", err));
                Err(self.finish(scenario, world, metrics.clone(), checks))
            }
        }
    }

    /// GEO-001: CityWalk - nominal walk with ordinary GPS noise.
    ///
    /// Fixes arrive once a second and are promoted every other second.
    async fn run_city_walk(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-001: CityWalk - nominal walk");

        let mut world = SimWorld::new(self.config());
        let mut metrics = ScenarioMetrics::default();
        if let Err(result) = self.start(ScenarioId::CityWalk, &mut world, &mut metrics, recorder).await {
            return result;
        }

        let mut errors = ErrorTracker::default();
        drive(&mut world, recorder, |world, _| {
            errors.observe(world);
        });

        collect_metrics(&world, &mut metrics);
        errors.fill(&mut metrics);
        debug!("{}", world.provider.info_string());

        let radius = world.provider.options().accuracy_radius_m;
        let min_accepted = (self.max_duration_secs / 3.0) as u64;
        let tick = 1.0 / f64::from(self.tick_rate_hz);
        let max_rms = 12.0;

        let mut checks = Checks::default();
        let enabled = EventCounters::get(&world.counters.enabled);
        checks.expect(enabled == 1, || format!("on_enabled fired {} times", enabled));
        checks.expect(metrics.accepted_updates >= min_accepted, || {
            format!("only {} accepted updates, expected >= {}", metrics.accepted_updates, min_accepted)
        });
        checks.expect(errors.max_accuracy <= radius, || {
            format!("accepted a fix with accuracy {:.1}m", errors.max_accuracy)
        });
        checks.expect(metrics.rms_error_m < max_rms, || {
            format!("RMS error {:.2}m exceeds threshold {:.1}m", metrics.rms_error_m, max_rms)
        });
        checks.expect(
            (metrics.time_since_start_secs - self.max_duration_secs).abs() <= tick + 1e-6,
            || format!("time since start {:.3}s", metrics.time_since_start_secs),
        );

        info!(
            "✓ CityWalk complete: {} raw, {} accepted, RMS error: {:.2}m",
            metrics.raw_updates, metrics.accepted_updates, metrics.rms_error_m
        );

        self.finish(ScenarioId::CityWalk, &world, metrics, checks)
    }

    /// GEO-002: ColdStartTimeout - the service never leaves Initializing.
    async fn run_cold_start_timeout(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-002: ColdStartTimeout - location service stuck initializing");

        let mut world = SimWorld::with_driver(self.config(), |driver| {
            driver.with_startup(StartupBehavior::Never)
        });
        let budget = f64::from(world.config.provider.max_wait_secs);
        let mut metrics = ScenarioMetrics::default();

        let outcome = world.start().await;
        metrics.startup_secs = world.context.time_secs();
        recorder.event(SimEvent::warn(format!("start() returned {:?}", outcome)));

        drive(&mut world, recorder, |_, _| {});
        collect_metrics(&world, &mut metrics);

        let mut checks = Checks::default();
        checks.expect(outcome == Err(ProviderError::TimedOut), || {
            format!("expected a timeout, got {:?}", outcome)
        });
        checks.expect(world.provider.status() == ProviderStatus::Failed, || {
            format!("status is {}", world.provider.status())
        });

        let failures = world.counters.failures();
        checks.expect(failures == ["Timed out"], || {
            format!("on_failed received {:?}", failures)
        });
        checks.expect((metrics.startup_secs - budget).abs() < 1e-6, || {
            format!("waited {:.1}s for a {:.0}s budget", metrics.startup_secs, budget)
        });
        checks.expect(metrics.raw_updates == 0 && metrics.heading_updates == 0, || {
            format!("{} updates delivered after a failed start", metrics.raw_updates)
        });
        checks.expect(!world.provider.is_enabled(), || "provider enabled".to_string());

        info!(
            "✓ ColdStartTimeout complete: failed after {:.0}s with {:?}",
            metrics.startup_secs, failures
        );

        self.finish(ScenarioId::ColdStartTimeout, &world, metrics, checks)
    }

    /// GEO-003: GpsDenied - GPS drops out for the middle third of the walk.
    ///
    /// Frames without a fix must not publish anything, heading included.
    async fn run_gps_denied(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-003: GpsDenied - mid-walk GPS blackout");

        let mut world = SimWorld::new(self.config());
        let mut metrics = ScenarioMetrics::default();
        if let Err(result) = self.start(ScenarioId::GpsDenied, &mut world, &mut metrics, recorder).await {
            return result;
        }

        let t0 = world.context.time_secs();
        let third = self.max_duration_secs / 3.0;
        let window = Blackout {
            from_secs: t0 + third,
            until_secs: t0 + 2.0 * third,
        };
        world.provider.driver_mut().set_blackout(Some(window));

        let mut errors = ErrorTracker::default();
        let mut last_raw = 0;
        let mut last_headings = 0;
        let mut leaked = 0;
        let mut accepted_after = 0;
        let mut was_dark = false;

        drive(&mut world, recorder, |world, recorder| {
            let dark = world.provider.driver().in_blackout();
            let raw = EventCounters::get(&world.counters.raw);
            let headings = EventCounters::get(&world.counters.headings);

            if dark {
                leaked += (raw - last_raw) + (headings - last_headings);
            }
            if dark != was_dark {
                recorder.event(if dark {
                    SimEvent::warn("GPS blackout")
                } else {
                    SimEvent::info("GPS restored")
                });
                was_dark = dark;
            }
            if errors.observe(world) && world.context.time_secs() >= window.until_secs {
                accepted_after += 1;
            }

            last_raw = raw;
            last_headings = headings;
        });

        collect_metrics(&world, &mut metrics);
        errors.fill(&mut metrics);

        let mut checks = Checks::default();
        checks.expect(leaked == 0, || format!("{} events published during the blackout", leaked));
        checks.expect(metrics.dropouts > 0, || "blackout never observed".to_string());
        checks.expect(accepted_after > 0, || "no accepted update after GPS returned".to_string());
        checks.expect(metrics.rms_error_m < 12.0, || {
            format!("RMS error {:.2}m", metrics.rms_error_m)
        });

        info!(
            "✓ GpsDenied complete: {} dropped frames, {} accepted after recovery",
            metrics.dropouts, accepted_after
        );

        self.finish(ScenarioId::GpsDenied, &world, metrics, checks)
    }

    /// GEO-004: NoisyFix - a standing device under heavy multipath.
    ///
    /// Outlier fixes report a large accuracy radius and must never be
    /// promoted. Good fixes feed an accuracy-weighted average that should
    /// settle close to the true position.
    async fn run_noisy_fix(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-004: NoisyFix - multipath outliers");

        let mut config = self.config();
        config.walk = WalkProfile {
            speed_mps: 0.0,
            ..WalkProfile::default()
        };
        let noise = SensorNoise {
            position_std_m: config.position_noise_std_m,
            heading_std_deg: config.heading_noise_std_deg,
            outlier_probability: 0.3,
            outlier_std_m: 50.0,
        };

        let mut world = SimWorld::with_driver(config, |driver| driver.with_noise(noise));
        let mut metrics = ScenarioMetrics::default();
        if let Err(result) = self.start(ScenarioId::NoisyFix, &mut world, &mut metrics, recorder).await {
            return result;
        }

        let radius = world.provider.options().accuracy_radius_m;
        let origin = world.oracle().origin().clone();

        let mut errors = ErrorTracker::default();
        let mut raw_watch = RawWatch::default();
        let mut smoother = MovingAveragePosition::new();
        let mut inaccurate = 0;

        drive(&mut world, recorder, |world, _| {
            errors.observe(world);

            if let Some(raw) = raw_watch.next(world) {
                if raw.accuracy > radius {
                    inaccurate += 1;
                } else {
                    let offset = geodesy::vector_from_to(&origin, &raw.to_geo_point(), true);
                    smoother.add_entry(offset.to_world_vector(), raw.accuracy);
                }
            }
        });

        collect_metrics(&world, &mut metrics);
        errors.fill(&mut metrics);
        metrics.inaccurate_rejections = inaccurate;

        let truth = world.oracle().position();
        let smoothed = smoother.average();
        metrics.smoothed_error_m = Vector3::new(smoothed.x - truth.x, 0.0, smoothed.z - truth.z).norm();

        let mut checks = Checks::default();
        checks.expect(inaccurate > 0, || "no outlier was rejected".to_string());
        checks.expect(errors.max_accuracy <= radius, || {
            format!("accepted a fix with accuracy {:.1}m", errors.max_accuracy)
        });
        checks.expect(metrics.rms_error_m < 12.0, || {
            format!("RMS error {:.2}m", metrics.rms_error_m)
        });
        checks.expect(metrics.smoothed_error_m < 3.0, || {
            format!("smoothed position is {:.2}m off", metrics.smoothed_error_m)
        });

        info!(
            "✓ NoisyFix complete: {} outliers generated, {} rejected, smoothed error {:.2}m",
            metrics.outliers, inaccurate, metrics.smoothed_error_m
        );

        self.finish(ScenarioId::NoisyFix, &world, metrics, checks)
    }

    /// GEO-005: NorthCrossing - turning walk through 0°/360°.
    async fn run_north_crossing(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-005: NorthCrossing - compass wraparound");

        let mut config = self.config();
        config.walk = WalkProfile {
            speed_mps: 1.4,
            initial_heading_deg: 300.0,
            // Always enough turn to cross north
            turn_rate_deg_s: (120.0 / self.max_duration_secs.max(1.0)).max(4.0),
        };
        config.provider.compass_low_pass_factor = 0.8;

        let mut world = SimWorld::new(config);
        let mut metrics = ScenarioMetrics::default();
        if let Err(result) = self.start(ScenarioId::NorthCrossing, &mut world, &mut metrics, recorder).await {
            return result;
        }

        let mut previous_filtered: Option<f64> = None;
        let mut previous_truth = world.oracle().heading();
        let mut crossed_north = false;
        let mut max_error: f64 = 0.0;
        let mut max_step: f64 = 0.0;

        drive(&mut world, recorder, |world, recorder| {
            let truth = world.oracle().heading();
            if previous_truth > 270.0 && truth < 90.0 {
                crossed_north = true;
                recorder.event(SimEvent::info("Crossed north"));
            }
            previous_truth = truth;

            let Some(filtered) = world.provider.filtered_heading() else {
                return;
            };
            max_error = max_error.max(angle_between(filtered, truth));
            if let Some(prev) = previous_filtered {
                max_step = max_step.max(angle_between(filtered, prev));
            }
            previous_filtered = Some(filtered);
        });

        collect_metrics(&world, &mut metrics);
        metrics.max_heading_error_deg = max_error;
        metrics.max_heading_step_deg = max_step;

        let mut checks = Checks::default();
        checks.expect(crossed_north, || "walker never crossed north".to_string());
        checks.expect(metrics.heading_updates > 0, || "no heading updates".to_string());
        checks.expect(max_error < 10.0, || {
            format!("smoothed heading off by {:.1}°", max_error)
        });
        checks.expect(max_step < 15.0, || {
            format!("smoothed heading jumped {:.1}° in one frame", max_step)
        });

        info!(
            "✓ NorthCrossing complete: {} heading updates, max error {:.2}°",
            metrics.heading_updates, max_error
        );

        self.finish(ScenarioId::NorthCrossing, &world, metrics, checks)
    }

    /// GEO-006: PathFollow - spline through the walked trail.
    ///
    /// Breadcrumbs along a curving walk become a Catmull-Rom path that is
    /// then traversed at equal arc-length steps.
    async fn run_path_follow(&self, recorder: &mut Recorder) -> ScenarioResult {
        info!("GEO-006: PathFollow - arc-length traversal");

        let mut config = self.config();
        config.walk = WalkProfile {
            speed_mps: 1.4,
            initial_heading_deg: 0.0,
            turn_rate_deg_s: 3.0,
        };

        let mut world = SimWorld::new(config);
        let mut metrics = ScenarioMetrics::default();
        if let Err(result) = self.start(ScenarioId::PathFollow, &mut world, &mut metrics, recorder).await {
            return result;
        }

        let crumb_interval = (self.max_duration_secs / 12.0).clamp(0.5, 5.0);
        world
            .provider
            .driver_mut()
            .oracle_mut()
            .set_trail_interval(crumb_interval);

        let mut errors = ErrorTracker::default();
        drive(&mut world, recorder, |world, _| {
            errors.observe(world);
        });

        collect_metrics(&world, &mut metrics);
        errors.fill(&mut metrics);

        let mut checks = Checks::default();
        let origin = world.oracle().origin().clone();
        let path = LocationPath::new(world.oracle().trail_locations(), SplineType::CatmullRom);

        match path.to_json_string().and_then(|json| LocationPath::from_json_str(&json)) {
            Ok(parsed) => checks.expect(parsed.locations.len() == path.locations.len(), || {
                "path JSON lost waypoints".to_string()
            }),
            Err(err) => checks.fail(format!("path JSON round trip failed: {}", err)),
        }

        match path.to_spline(&origin, DEFAULT_SAMPLE_SIZE) {
            Err(err) => checks.fail(format!("could not build path spline: {}", err)),
            Ok(spline) => {
                let points = path.world_points(&origin);
                let length = spline.length();
                metrics.path_length_m = length;

                let chord: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();

                let start_gap = (spline.point_at_arc_length(0.0) - points[0]).norm();
                let end_gap = (spline.point_at_arc_length(length) - points[points.len() - 1]).norm();
                checks.expect(start_gap < 1e-6 && end_gap < 1e-6, || {
                    format!("path endpoints off by {:.2e}m / {:.2e}m", start_gap, end_gap)
                });
                checks.expect(length >= chord - 1e-9 && length <= chord * 1.02, || {
                    format!("path length {:.2}m vs polyline {:.2}m", length, chord)
                });

                let n = 20;
                let delta = length / (n as f64 + 1.0);
                let samples = spline.sample_points(n);
                let uneven = samples
                    .windows(2)
                    .map(|w| (w[1] - w[0]).norm())
                    .filter(|gap| *gap < 0.9 * delta || *gap > 1.05 * delta)
                    .count();
                checks.expect(uneven == 0, || {
                    format!("{} of {} samples unevenly spaced", uneven, samples.len() - 1)
                });

                let mid = spline.point_and_tangent_at_arc_length(length / 2.0);
                checks.expect(mid.tangent.norm() > 0.0 && mid.point.iter().all(|v| v.is_finite()), || {
                    "degenerate tangent at mid-path".to_string()
                });
            }
        }

        info!(
            "✓ PathFollow complete: {} waypoints, path length {:.1}m",
            path.locations.len(),
            metrics.path_length_m
        );

        self.finish(ScenarioId::PathFollow, &world, metrics, checks)
    }
}
