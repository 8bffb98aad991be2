use std::sync::Arc;
use std::time::Duration;

use geoar_env::GeoArContext;
use tracing::{debug, info, trace, warn};

use crate::error::ProviderError;
use crate::filters::{normalized_degrees, AngleLowPassFilter};
use crate::location::{HeadingReading, LocationReading};

use super::{
    LocationProviderOptions, PlatformLocationDriver, ProviderConfig, ProviderEvents, ProviderStatus,
};

/// Interval between platform status polls during `start()`.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a provider tracks between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderState {
    pub status: ProviderStatus,

    pub first_location: LocationReading,
    pub current_location: LocationReading,
    pub last_location: LocationReading,
    pub current_location_raw: LocationReading,
    pub last_location_raw: LocationReading,

    pub current_heading: HeadingReading,
    pub last_heading: HeadingReading,

    /// Smoothed true heading in `[0, 360)`, once a heading has been seen
    pub filtered_heading: Option<f64>,

    /// True once the first reading pair has been received
    pub is_enabled: bool,

    /// True until the next reading pair re-initializes the start point
    pub first_reading: bool,

    pub paused: bool,

    /// Accepted updates since start or the last restart
    pub location_update_count: u32,

    /// Context time at which `start()` succeeded
    pub start_time: Option<Duration>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            status: ProviderStatus::Idle,
            first_location: LocationReading::default(),
            current_location: LocationReading::default(),
            last_location: LocationReading::default(),
            current_location_raw: LocationReading::default(),
            last_location_raw: LocationReading::default(),
            current_heading: HeadingReading::default(),
            last_heading: HeadingReading::default(),
            filtered_heading: None,
            is_enabled: false,
            first_reading: true,
            paused: false,
            location_update_count: 0,
            start_time: None,
        }
    }
}

/// The location acquisition state machine.
///
/// Generic over the platform driver `D` and the environment `C`, whose
/// clock paces the start-up polls. `update()` is meant to be called once
/// per host frame.
pub struct LocationProvider<D, C> {
    driver: D,
    ctx: Arc<C>,
    options: LocationProviderOptions,
    state: ProviderState,
    events: ProviderEvents,
    compass_filter: AngleLowPassFilter,
}

impl<D: PlatformLocationDriver, C: GeoArContext> LocationProvider<D, C> {
    pub fn new(driver: D, ctx: Arc<C>, options: LocationProviderOptions) -> Self {
        Self {
            driver,
            ctx,
            options,
            state: ProviderState::default(),
            events: ProviderEvents::new(),
            compass_filter: AngleLowPassFilter::new(0.0),
        }
    }

    /// Builds a provider with the options and compass smoothing of `config`.
    ///
    /// The start-up budget in `config` is applied by `start_with_config()`.
    pub fn from_config(driver: D, ctx: Arc<C>, config: &ProviderConfig) -> Self {
        let mut provider = Self::new(driver, ctx, config.options.clone());
        provider.set_compass_low_pass_factor(config.compass_low_pass_factor);
        provider
    }

    // ========== Start-up ==========

    /// Requests updates from the platform and waits for it to start.
    ///
    /// Waits `delay_secs` first, then polls the platform once per second
    /// for up to `max_wait_secs` seconds while it is initializing. Every
    /// failure is also delivered to the `on_failed` handlers and leaves the
    /// provider `Failed` until it is started again.
    pub async fn start(&mut self, max_wait_secs: u32, delay_secs: u32) -> Result<(), ProviderError> {
        info!(
            driver = self.driver.name(),
            max_wait_secs, delay_secs, "Starting location provider"
        );

        if delay_secs > 0 {
            self.ctx.sleep(Duration::from_secs(u64::from(delay_secs))).await;
        }

        self.driver.request_updates();
        self.state.status = ProviderStatus::Initializing;
        self.refresh_status();

        let mut remaining = max_wait_secs;
        while self.state.status == ProviderStatus::Initializing && remaining > 0 {
            trace!(remaining, "Waiting for location service");
            self.ctx.sleep(POLL_INTERVAL).await;
            remaining -= 1;
            self.refresh_status();
        }

        let outcome = match self.state.status {
            ProviderStatus::Started => Ok(()),
            ProviderStatus::Initializing => Err(ProviderError::TimedOut),
            ProviderStatus::Failed => Err(ProviderError::InitializationFailed),
            other => Err(ProviderError::UnknownStatus(other)),
        };

        if let Err(err) = outcome {
            self.fail(&err);
            return Err(err);
        }

        self.state.first_reading = true;
        self.state.start_time = Some(self.ctx.now());

        info!(
            driver = self.driver.name(),
            waited_secs = max_wait_secs - remaining,
            "Location provider started"
        );
        Ok(())
    }

    /// `start()` with the budget and delay from `config`.
    pub async fn start_with_config(&mut self, config: &ProviderConfig) -> Result<(), ProviderError> {
        self.start(config.max_wait_secs, config.start_delay_secs).await
    }

    fn refresh_status(&mut self) {
        let status = self.driver.refresh_status();
        if status != self.state.status {
            debug!(from = %self.state.status, to = %status, "Provider status changed");
        }
        self.state.status = status;
    }

    fn fail(&mut self, err: &ProviderError) {
        warn!(driver = self.driver.name(), error = %err, "Location provider failed to start");
        self.state.status = ProviderStatus::Failed;
        self.events.emit_failed(&err.to_string());
    }

    // ========== Per-frame update ==========

    /// Reads one location/heading pair from the driver and publishes it.
    ///
    /// Does nothing unless started, or if either reading is missing.
    pub fn update(&mut self) {
        if !self.has_started() {
            return;
        }

        let location = self.driver.read_location();
        let heading = self.driver.read_heading();

        let (Some(location), Some(heading)) = (location, heading) else {
            trace!("Incomplete sensor reading, skipping frame");
            return;
        };

        if self.state.first_reading {
            self.initialize_from(location, heading);
            return;
        }

        self.update_location(location);
        self.update_heading(heading);
    }

    /// First reading pair after start or restart: taken as-is, no filtering.
    fn initialize_from(&mut self, location: LocationReading, heading: HeadingReading) {
        self.state.first_location = location;
        self.state.current_location = location;
        self.state.current_location_raw = location;
        self.state.current_heading = heading;
        self.state.filtered_heading = Some(self.filter_heading(heading.heading));

        self.state.is_enabled = true;
        self.state.first_reading = false;

        info!(location = %location, "First location reading");

        let state = &self.state;
        self.events.emit_enabled();
        self.events
            .emit_heading_updated(&state.current_heading, &state.last_heading);
        self.events
            .emit_location_updated(&state.current_location, &state.last_location);
        self.events
            .emit_location_updated_raw(&state.current_location_raw, &state.last_location_raw);
    }

    fn update_location(&mut self, location: LocationReading) {
        if location.timestamp == self.state.current_location_raw.timestamp {
            trace!(timestamp = location.timestamp, "Duplicate raw reading");
            return;
        }

        self.state.last_location_raw = self.state.current_location_raw;
        self.state.current_location_raw = location;
        self.events.emit_location_updated_raw(
            &self.state.current_location_raw,
            &self.state.last_location_raw,
        );

        if !self.should_update_location(&location) {
            return;
        }

        self.state.last_location = self.state.current_location;
        self.state.current_location = location;
        self.state.location_update_count += 1;
        self.events
            .emit_location_updated(&self.state.current_location, &self.state.last_location);

        let max = self.options.max_update_count;
        if max > 0 && self.state.location_update_count >= max {
            info!(count = self.state.location_update_count, "Update limit reached, pausing");
            self.pause();
        }
    }

    fn update_heading(&mut self, heading: HeadingReading) {
        if !self.should_update_heading(&heading) {
            return;
        }

        self.state.last_heading = self.state.current_heading;
        self.state.current_heading = heading;
        self.state.filtered_heading = Some(self.filter_heading(heading.heading));

        self.events
            .emit_heading_updated(&self.state.current_heading, &self.state.last_heading);
    }

    fn filter_heading(&mut self, heading: f64) -> f64 {
        normalized_degrees(self.compass_filter.apply(heading))
    }

    /// Whether `location` should replace the current location.
    pub fn should_update_location(&self, location: &LocationReading) -> bool {
        if self.state.paused {
            trace!("Paused, reading not accepted");
            return false;
        }

        let current = &self.state.current_location;

        let elapsed_ms = location.timestamp - current.timestamp;
        if elapsed_ms < self.options.min_interval_ms() {
            debug!(elapsed_ms, "Reading rejected: too soon");
            return false;
        }

        let distance = LocationReading::horizontal_distance(location, current);
        if distance < self.options.min_distance_m {
            debug!(distance_m = distance, "Reading rejected: too close");
            return false;
        }

        let radius = self.options.accuracy_radius_m;
        if radius > 0.0 && location.accuracy > radius {
            debug!(accuracy_m = location.accuracy, radius_m = radius, "Reading rejected: inaccurate");
            return false;
        }

        true
    }

    /// Whether `heading` is new. Only a repeated timestamp is rejected.
    pub fn should_update_heading(&self, heading: &HeadingReading) -> bool {
        heading.timestamp != self.state.current_heading.timestamp
    }

    // ========== Control ==========

    /// Stops promoting readings to current. Raw readings keep flowing.
    pub fn pause(&mut self) {
        self.state.paused = true;
    }

    pub fn resume(&mut self) {
        self.state.paused = false;
    }

    /// Clears the update count; the next reading becomes the new start point.
    pub fn restart(&mut self) {
        info!(driver = self.driver.name(), "Restarting location provider");
        self.state.location_update_count = 0;
        self.state.first_reading = true;
        self.events.emit_restart();
    }

    /// Re-fires the last location events without reading the driver.
    pub fn force_location_update(&mut self) {
        let state = &self.state;
        self.events
            .emit_location_updated(&state.current_location, &state.last_location);
        self.events
            .emit_location_updated_raw(&state.current_location_raw, &state.last_location_raw);
    }

    /// Makes the current location the start point.
    pub fn reset_start_point(&mut self) {
        self.state.first_location = self.state.current_location;
    }

    pub fn set_compass_low_pass_factor(&mut self, factor: f64) {
        self.compass_filter.set_factor(factor);
    }

    pub fn set_options(&mut self, options: LocationProviderOptions) {
        self.options = options;
    }

    // ========== Event registration ==========

    pub fn on_location_updated<F>(&mut self, handler: F)
    where
        F: FnMut(&LocationReading, &LocationReading) + Send + 'static,
    {
        self.events.on_location_updated(Box::new(handler));
    }

    pub fn on_location_updated_raw<F>(&mut self, handler: F)
    where
        F: FnMut(&LocationReading, &LocationReading) + Send + 'static,
    {
        self.events.on_location_updated_raw(Box::new(handler));
    }

    pub fn on_heading_updated<F>(&mut self, handler: F)
    where
        F: FnMut(&HeadingReading, &HeadingReading) + Send + 'static,
    {
        self.events.on_heading_updated(Box::new(handler));
    }

    /// Registers an enabled handler. If the provider is already enabled the
    /// handler is also invoked right away.
    pub fn on_enabled<F>(&mut self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        let already_enabled = self.state.is_enabled;
        let handler = self.events.on_enabled(Box::new(handler));
        if already_enabled {
            handler();
        }
    }

    pub fn on_failed<F>(&mut self, handler: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.events.on_failed(Box::new(handler));
    }

    pub fn on_restart<F>(&mut self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.events.on_restart(Box::new(handler));
    }

    // ========== Queries ==========

    pub fn name(&self) -> &str {
        self.driver.name()
    }

    pub fn is_compass_enabled(&self) -> bool {
        self.driver.is_compass_enabled()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn options(&self) -> &LocationProviderOptions {
        &self.options
    }

    pub fn state(&self) -> &ProviderState {
        &self.state
    }

    pub fn status(&self) -> ProviderStatus {
        self.state.status
    }

    pub fn has_started(&self) -> bool {
        self.state.status == ProviderStatus::Started
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn location_update_count(&self) -> u32 {
        self.state.location_update_count
    }

    pub fn first_location(&self) -> &LocationReading {
        &self.state.first_location
    }

    pub fn current_location(&self) -> &LocationReading {
        &self.state.current_location
    }

    pub fn last_location(&self) -> &LocationReading {
        &self.state.last_location
    }

    pub fn current_location_raw(&self) -> &LocationReading {
        &self.state.current_location_raw
    }

    pub fn last_location_raw(&self) -> &LocationReading {
        &self.state.last_location_raw
    }

    pub fn current_heading(&self) -> &HeadingReading {
        &self.state.current_heading
    }

    pub fn last_heading(&self) -> &HeadingReading {
        &self.state.last_heading
    }

    /// Smoothed true heading in `[0, 360)`.
    pub fn filtered_heading(&self) -> Option<f64> {
        self.state.filtered_heading
    }

    /// Horizontal distance from the start point to the current location.
    pub fn distance_from_start_point(&self) -> f64 {
        LocationReading::horizontal_distance(&self.state.first_location, &self.state.current_location)
    }

    /// Time since `start()` succeeded; zero if it has not.
    pub fn time_since_start(&self) -> Duration {
        self.state
            .start_time
            .map(|t| self.ctx.now().saturating_sub(t))
            .unwrap_or(Duration::ZERO)
    }

    pub fn status_string(&self) -> &'static str {
        self.state.status.as_str()
    }

    pub fn info_string(&self) -> String {
        format!(
            "{} {{\n{}\n{}\nStatus = {}\nDistanceFromStartPoint = {:.2}\nTimeSinceStart = {:.1}\n}}",
            self.name(),
            self.state.current_location,
            self.state.current_heading,
            self.status_string(),
            self.distance_from_start_point(),
            self.time_since_start().as_secs_f64(),
        )
    }
}

impl<D, C> std::fmt::Debug for LocationProvider<D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationProvider")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
