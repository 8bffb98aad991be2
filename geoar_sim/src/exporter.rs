//! JSON exporter for run playback.
//!
//! Exports simulation frames as JSON so a walk can be plotted offline:
//! ground truth, the raw fix, the accepted location and both headings.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::SimError;
use crate::runner::{ScenarioMetrics, ScenarioResult};

/// A single frame of simulation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Provider status at the end of the frame
    pub status: String,

    /// Ground truth in the local frame
    pub truth: FramePosition,

    /// Latest raw fix, once the provider is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<FramePosition>,

    /// Latest accepted location, once the provider is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<FramePosition>,

    pub true_heading_deg: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_heading_deg: Option<f64>,

    /// Events (blackouts, failures, etc.)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

/// Position in the local east/up/north frame, with its accuracy radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl FramePosition {
    pub fn new(pos: Vector3<f64>) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Some("warn".to_string()),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ScenarioMetrics>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
            metrics: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Copies the verdict and metrics of a finished run.
    pub fn finalize(&mut self, result: &ScenarioResult) {
        self.passed = result.passed;
        self.failure_reason = result.failure_reason.clone();
        self.metrics = Some(result.metrics.clone());
    }

    pub fn to_json_string(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = self.to_json_string()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
