//! Error types for the GeoAR engines.

use thiserror::Error;

use crate::provider::ProviderStatus;

/// Errors from curve and spline queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// Arc-length query outside the curve's sampled length
    #[error("arc length {length} outside curve length [0, {total}]")]
    LengthOutOfRange { length: f64, total: f64 },

    /// A spline needs at least two control points
    #[error("spline needs at least 2 control points, got {0}")]
    NotEnoughPoints(usize),
}

/// Location acquisition failures.
///
/// The `Display` strings are the messages delivered to `on_failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Wait budget exhausted while the platform was still initializing
    #[error("Timed out")]
    TimedOut,

    /// Platform reported failure
    #[error("Failed to initialize location updates.")]
    InitializationFailed,

    /// Platform ended in a status other than Started
    #[error("Unknown error initializing location updates. ({0})")]
    UnknownStatus(ProviderStatus),
}

/// Errors loading geographic paths and provider configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parse failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Path has too few locations to build a spline
    #[error("path error: {0}")]
    Curve(#[from] CurveError),
}
