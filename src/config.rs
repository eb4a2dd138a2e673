//! Analysis configuration

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Default fixed bin widths in seconds
pub const DEFAULT_BINS_SEC: [f64; 3] = [30.0, 60.0, 120.0];

/// Default custom bin edges in seconds
pub const DEFAULT_CUSTOM_BINS_SEC: [f64; 4] = [60.0, 120.0, 300.0, 600.0];

/// Parameters shared by every summary of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyseConfig {
    /// Frames per second of the source video
    pub fps: f64,
    /// Widths of the fixed-width binnings, in seconds
    #[serde(default = "default_bins_sec")]
    pub bins_sec: Vec<f64>,
    /// Edges of the custom binning, in seconds; empty disables it
    #[serde(default = "default_custom_bins_sec")]
    pub custom_bins_sec: Vec<f64>,
}

fn default_bins_sec() -> Vec<f64> {
    DEFAULT_BINS_SEC.to_vec()
}

fn default_custom_bins_sec() -> Vec<f64> {
    DEFAULT_CUSTOM_BINS_SEC.to_vec()
}

impl AnalyseConfig {
    /// Default bins at the given frame rate
    pub fn with_fps(fps: f64) -> Self {
        Self {
            fps,
            bins_sec: default_bins_sec(),
            custom_bins_sec: default_custom_bins_sec(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ComputeError::InvalidParameter(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        if let Some(width) = self.bins_sec.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(ComputeError::InvalidParameter(format!(
                "bin widths must be positive numbers of seconds, got {}",
                width
            )));
        }
        if let Some(edge) = self.custom_bins_sec.iter().find(|e| !e.is_finite()) {
            return Err(ComputeError::InvalidParameter(format!(
                "custom bin edges must be finite, got {}",
                edge
            )));
        }
        Ok(())
    }
}
