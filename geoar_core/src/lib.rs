//! GeoAR Core - Geolocation Engine for Location-Based AR
//!
//! This library turns noisy, irregular device sensor samples into stable
//! positions usable for placing content at real-world coordinates:
//! 1. **Geodetic Transform**: geographic ⇄ ECEF ⇄ local ENU on a reference ellipsoid
//! 2. **Location Provider**: start-up state machine plus per-frame acceptance filtering
//! 3. **Smoothing Filters**: scalar and wraparound-safe angle low-pass filters
//! 4. **Curves & Splines**: Catmull-Rom and linear paths queried by arc length

pub mod curve;
pub mod error;
pub mod filters;
pub mod geodesy;
pub mod location;
pub mod path;
pub mod provider;
pub mod spline;

// Re-export key types for convenience
pub use curve::{CatmullRomCurve, Curve, CurvePoint, Line};
pub use error::{ConfigError, CurveError, ProviderError};
pub use filters::{AngleLowPassFilter, LowPassFilter, MovingAveragePosition};
pub use geodesy::{Displacement, Ellipsoid, EnuVector};
pub use location::{AltitudeMode, GeoPoint, HeadingReading, LocationReading};
pub use path::LocationPath;
pub use provider::{
    LocationProvider, LocationProviderOptions, MockDriver, PlatformLocationDriver, ProviderConfig,
    ProviderStatus,
};
pub use spline::{build_spline, CatmullRomSpline, LinearSpline, Spline, SplineType};
