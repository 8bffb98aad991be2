//! Common types for the GeoAR environment abstraction.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::EnvError;

/// Milliseconds since the Unix epoch.
///
/// This is the timestamp unit carried by every location and heading
/// reading. Two readings with equal `EpochMillis` are treated as the
/// same sample by the provider's dedupe check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    /// Converts a wall-clock time to epoch milliseconds.
    pub fn from_system_time(time: SystemTime) -> Result<Self, EnvError> {
        let since = time
            .duration_since(UNIX_EPOCH)
            .map_err(|e| EnvError::clock(format!("time before epoch: {e}")))?;
        Ok(Self(since.as_millis() as i64))
    }
    
    /// Returns the raw millisecond count.
    pub fn as_millis(&self) -> i64 {
        self.0
    }
    
    /// Returns a timestamp shifted forward by `duration`.
    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration.as_millis() as i64)
    }
}

impl std::fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_epoch_millis_from_system_time() {
        let t = UNIX_EPOCH + Duration::from_millis(1_704_067_200_123);
        let ms = EpochMillis::from_system_time(t).unwrap();
        assert_eq!(ms.as_millis(), 1_704_067_200_123);
    }
    
    #[test]
    fn test_epoch_millis_before_epoch_is_error() {
        let t = UNIX_EPOCH - Duration::from_secs(1);
        assert!(EpochMillis::from_system_time(t).is_err());
    }
    
    #[test]
    fn test_epoch_millis_arithmetic() {
        let a = EpochMillis(1_000);
        let b = a.plus(Duration::from_secs(5));
        assert_eq!(b, EpochMillis(6_000));
        assert_eq!(a.plus(Duration::from_micros(999)), a);
    }
}
