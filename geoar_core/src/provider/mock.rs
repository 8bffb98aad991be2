//! A fixed-location driver for editors, demos and tests.

use std::sync::Arc;

use geoar_env::{EpochMillis, GeoArContext};

use crate::location::{GeoPoint, HeadingReading, LocationReading};

use super::{PlatformLocationDriver, ProviderStatus};

/// Reports a single location reading at a fixed point, then nothing.
///
/// Heading is a settable value stamped with the context clock on every
/// read. Start-up succeeds on the first status poll.
pub struct MockDriver<C> {
    ctx: Arc<C>,
    location: GeoPoint,
    heading: f64,
    status: ProviderStatus,
    requested: bool,
    delivered: bool,
}

impl<C: GeoArContext> MockDriver<C> {
    pub fn new(ctx: Arc<C>, location: GeoPoint) -> Self {
        Self {
            ctx,
            location,
            heading: 0.0,
            status: ProviderStatus::Idle,
            requested: false,
            delivered: false,
        }
    }

    /// Moves the mock and makes it report one more reading.
    pub fn set_location(&mut self, location: GeoPoint) {
        self.location = location;
        self.delivered = false;
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.heading = heading;
    }

    fn timestamp(&self) -> i64 {
        EpochMillis::from_system_time(self.ctx.system_time())
            .map(|t| t.as_millis())
            .unwrap_or(0)
    }
}

impl<C: GeoArContext> PlatformLocationDriver for MockDriver<C> {
    fn name(&self) -> &str {
        "MockDriver"
    }

    fn is_compass_enabled(&self) -> bool {
        true
    }

    fn read_location(&mut self) -> Option<LocationReading> {
        if self.delivered {
            return None;
        }
        self.delivered = true;

        Some(LocationReading::new(
            self.location.latitude,
            self.location.longitude,
            self.location.altitude,
            0.0,
            self.timestamp(),
        ))
    }

    fn read_heading(&mut self) -> Option<HeadingReading> {
        Some(HeadingReading {
            heading: self.heading,
            magnetic_heading: self.heading,
            accuracy: 0.0,
            timestamp: self.timestamp(),
            is_magnetic_heading_available: true,
        })
    }

    fn request_updates(&mut self) {
        self.requested = true;
    }

    fn refresh_status(&mut self) -> ProviderStatus {
        if self.requested {
            self.status = ProviderStatus::Initializing;
            self.requested = false;
        }

        if self.status == ProviderStatus::Initializing {
            self.status = ProviderStatus::Started;
        }

        self.status
    }
}
