//! Core environment context trait for GeoAR location providers.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" clock so that the location
/// provider's start-up loop can run against the host's scheduler in
/// production and against a virtual clock in simulation.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` - virtual clock advanced by `sleep()`
///
/// # Determinism
///
/// For DST, every method that would normally read the wall clock is
/// controlled by the implementation.
#[async_trait]
pub trait GeoArContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for the provider's start time and `time_since_start()`.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;
    
    /// Returns the wall-clock time.
    ///
    /// Sensor drivers stamp readings with this (epoch milliseconds).
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;
    
    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);
    
    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
