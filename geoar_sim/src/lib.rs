//! GeoAR Deterministic Simulation Testing (DST) Harness
//!
//! This crate provides a controlled simulation environment where the
//! location provider runs against synthetic sensors, deterministically.
//!
//! # Core Principle: Everything Behind the Context
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock advanced per frame; provider sleeps are instant
//! - **Sensors**: GPS and compass readings derived from ground truth plus noise
//! - **Randomness**: All entropy derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      SimWorld                       │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │ SimContext (Virtual Clock + Seeded Streams)   │  │
//! │  └───────────────────────────────────────────────┘  │
//! │        │                         │                  │
//! │  ┌─────▼──────────┐   reads  ┌───▼──────────────┐   │
//! │  │ LocationProvider│◄────────│    SimDriver     │   │
//! │  └────────────────┘          └───▲──────────────┘   │
//! │                                  │                  │
//! │                          ┌───────┴───────────┐      │
//! │                          │      Oracle       │      │
//! │                          │ (Ground Truth Walk)│     │
//! │                          └───────────────────┘      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use geoar_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::GpsDenied).await;
//! assert!(result.passed);
//! ```

mod context;
mod driver;
mod error;
mod exporter;
mod oracle;
pub mod runner;
pub mod scenarios;
mod world;

pub use context::SimContext;
pub use driver::{Blackout, DriverStats, SensorNoise, SimDriver, StartupBehavior};
pub use error::SimError;
pub use exporter::{FramePosition, SimEvent, SimExport, SimFrame};
pub use oracle::{Oracle, WalkProfile};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use world::{EventCounters, SimConfig, SimWorld};
