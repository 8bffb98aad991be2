//! Location Provider - acquisition state machine
//!
//! `Idle → Initializing → {Started | Failed}`. The provider owns a
//! platform driver, polls it during `start()`, and once started turns its
//! per-frame readings into raw and accepted location events.

mod driver;
mod events;
mod location_provider;
mod mock;
mod options;

pub use driver::PlatformLocationDriver;
pub use events::{FailureHandler, HeadingHandler, LocationHandler, NotifyHandler, ProviderEvents};
pub use location_provider::{LocationProvider, ProviderState};
pub use mock::MockDriver;
pub use options::{LocationProviderOptions, ProviderConfig};

use serde::{Deserialize, Serialize};

/// Acquisition status of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderStatus {
    #[default]
    Idle,
    Initializing,
    Started,
    Failed,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Idle => "Idle",
            ProviderStatus::Initializing => "Initializing",
            ProviderStatus::Started => "Started",
            ProviderStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
