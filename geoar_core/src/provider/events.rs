//! Observer lists for provider events.
//!
//! Handlers are fire-and-forget: they return nothing and are invoked in
//! registration order.

use crate::location::{HeadingReading, LocationReading};

/// `(current, previous)` location handler.
pub type LocationHandler = Box<dyn FnMut(&LocationReading, &LocationReading) + Send>;

/// `(current, previous)` heading handler.
pub type HeadingHandler = Box<dyn FnMut(&HeadingReading, &HeadingReading) + Send>;

/// Failure handler receiving the failure message.
pub type FailureHandler = Box<dyn FnMut(&str) + Send>;

pub type NotifyHandler = Box<dyn FnMut() + Send>;

#[derive(Default)]
pub struct ProviderEvents {
    location_updated: Vec<LocationHandler>,
    location_updated_raw: Vec<LocationHandler>,
    heading_updated: Vec<HeadingHandler>,
    enabled: Vec<NotifyHandler>,
    failed: Vec<FailureHandler>,
    restart: Vec<NotifyHandler>,
}

impl ProviderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_location_updated(&mut self, handler: LocationHandler) {
        self.location_updated.push(handler);
    }

    pub fn on_location_updated_raw(&mut self, handler: LocationHandler) {
        self.location_updated_raw.push(handler);
    }

    pub fn on_heading_updated(&mut self, handler: HeadingHandler) {
        self.heading_updated.push(handler);
    }

    /// Registers an enabled handler and returns a reference to it so the
    /// caller can invoke it immediately if already enabled.
    pub fn on_enabled(&mut self, handler: NotifyHandler) -> &mut NotifyHandler {
        self.enabled.push(handler);
        let last = self.enabled.len() - 1;
        &mut self.enabled[last]
    }

    pub fn on_failed(&mut self, handler: FailureHandler) {
        self.failed.push(handler);
    }

    pub fn on_restart(&mut self, handler: NotifyHandler) {
        self.restart.push(handler);
    }

    pub fn emit_location_updated(&mut self, current: &LocationReading, previous: &LocationReading) {
        for handler in self.location_updated.iter_mut() {
            handler(current, previous);
        }
    }

    pub fn emit_location_updated_raw(&mut self, current: &LocationReading, previous: &LocationReading) {
        for handler in self.location_updated_raw.iter_mut() {
            handler(current, previous);
        }
    }

    pub fn emit_heading_updated(&mut self, current: &HeadingReading, previous: &HeadingReading) {
        for handler in self.heading_updated.iter_mut() {
            handler(current, previous);
        }
    }

    pub fn emit_enabled(&mut self) {
        for handler in self.enabled.iter_mut() {
            handler();
        }
    }

    pub fn emit_failed(&mut self, message: &str) {
        for handler in self.failed.iter_mut() {
            handler(message);
        }
    }

    pub fn emit_restart(&mut self) {
        for handler in self.restart.iter_mut() {
            handler();
        }
    }
}

impl std::fmt::Debug for ProviderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEvents")
            .field("location_updated", &self.location_updated.len())
            .field("location_updated_raw", &self.location_updated_raw.len())
            .field("heading_updated", &self.heading_updated.len())
            .field("enabled", &self.enabled.len())
            .field("failed", &self.failed.len())
            .field("restart", &self.restart.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_handlers_fire_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = ProviderEvents::new();

        for id in 0..3 {
            let log = Arc::clone(&log);
            events.on_failed(Box::new(move |msg| log.lock().unwrap().push(format!("{id}:{msg}"))));
        }

        events.emit_failed("Timed out");
        assert_eq!(*log.lock().unwrap(), vec!["0:Timed out", "1:Timed out", "2:Timed out"]);
    }

    #[test]
    fn test_location_handler_receives_both_readings() {
        let seen = Arc::new(Mutex::new(None));
        let mut events = ProviderEvents::new();

        let sink = Arc::clone(&seen);
        events.on_location_updated(Box::new(move |cur, prev| {
            *sink.lock().unwrap() = Some((cur.timestamp, prev.timestamp));
        }));

        let prev = LocationReading::new(0.0, 0.0, 0.0, 1.0, 1000);
        let cur = LocationReading::new(0.0, 0.0, 0.0, 1.0, 4000);
        events.emit_location_updated(&cur, &prev);

        assert_eq!(*seen.lock().unwrap(), Some((4000, 1000)));
    }
}
