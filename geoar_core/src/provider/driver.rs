//! The platform capability seam.

use crate::location::{HeadingReading, LocationReading};

use super::ProviderStatus;

/// Access to a platform's location and compass sensors.
///
/// The provider state machine never talks to sensors directly; it is
/// handed a driver at construction. Reads return `None` when the platform
/// has no sample available.
pub trait PlatformLocationDriver: Send {
    /// Human-readable driver name.
    fn name(&self) -> &str;

    /// Whether the platform has a working magnetic compass.
    fn is_compass_enabled(&self) -> bool;

    fn read_location(&mut self) -> Option<LocationReading>;

    fn read_heading(&mut self) -> Option<HeadingReading>;

    /// Asks the platform to begin delivering location and compass updates.
    fn request_updates(&mut self);

    /// Polls the platform and returns its current acquisition status.
    fn refresh_status(&mut self) -> ProviderStatus;
}

impl<T: PlatformLocationDriver + ?Sized> PlatformLocationDriver for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_compass_enabled(&self) -> bool {
        (**self).is_compass_enabled()
    }

    fn read_location(&mut self) -> Option<LocationReading> {
        (**self).read_location()
    }

    fn read_heading(&mut self) -> Option<HeadingReading> {
        (**self).read_heading()
    }

    fn request_updates(&mut self) {
        (**self).request_updates()
    }

    fn refresh_status(&mut self) -> ProviderStatus {
        (**self).refresh_status()
    }
}
