//! GeoAR Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the GeoAR
//! location provider to run in both **Production** (tokio) and
//! **Simulation** (virtual clock) environments.
//!
//! # Core Concept: The Reactor Pattern
//!
//! For Deterministic Simulation Testing (DST), we intercept the clock:
//! - Time (`now()`, `system_time()`, `sleep()`)
//!
//! The provider's `start()` loop only ever waits through `sleep()`, so a
//! simulated context can drive a ten-thousand-second start-up budget in
//! microseconds of real time.
//!
//! # Example
//!
//! ```ignore
//! use geoar_env::GeoArContext;
//!
//! async fn poll_until_ready<Ctx: GeoArContext>(ctx: &Ctx, mut ready: impl FnMut() -> bool) {
//!     while !ready() {
//!         ctx.sleep(Duration::from_secs(1)).await;
//!     }
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::GeoArContext;
pub use types::EpochMillis;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
