//! Error types for the GeoAR environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The wall clock reports a time before the Unix epoch
    #[error("Clock error: {0}")]
    ClockError(String),
    
    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),
    
    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a clock error.
    pub fn clock(msg: impl Into<String>) -> Self {
        Self::ClockError(msg.into())
    }
}
