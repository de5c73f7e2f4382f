//! Pipeline configuration.
//!
//! Every section has defaults, so an empty JSON object is a valid config:
//!
//! ```json
//! { "unsharp": { "radius": 3, "amount": 2.0 }, "degenerate": "passthrough" }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EnhanceError, Result};
use crate::filters::core::MAX_RADIUS;
use crate::filters::sharpen::check_amount;

/// What equalization does with an image that has a single intensity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Return the image unchanged.
    #[default]
    Passthrough,
    /// Fail with `DegenerateInput`.
    Reject,
}

/// Unsharp mask parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpParams {
    /// Gaussian kernel radius in pixels (sigma = radius / 3).
    pub radius: usize,
    /// Residual gain; 0.0 disables sharpening.
    pub amount: f32,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            radius: 3,
            amount: 2.0,
        }
    }
}

impl UnsharpParams {
    pub fn validate(&self) -> Result<()> {
        if self.radius > MAX_RADIUS {
            return Err(EnhanceError::invalid(format!(
                "unsharp radius {} exceeds maximum of {MAX_RADIUS}",
                self.radius
            )));
        }
        check_amount(self.amount)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub unsharp: UnsharpParams,
    pub degenerate: DegeneratePolicy,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EnhanceError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.unsharp.validate()
    }
}

/// Read and validate a JSON config file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let data = fs::read_to_string(path)
        .map_err(|e| EnhanceError::Config(format!("failed to read config {}: {e}", path.display())))?;
    PipelineConfig::from_json(&data)
}
