// SPDX-License-Identifier: GPL-3.0-only

//! Request-scoped estimation configuration

use crate::constants::{self, NegativeHeightPolicy};
use crate::errors::{EstimationError, EstimationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for one estimation request
///
/// Passed explicitly to the engine; nothing is cached between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Grid cell edge length in meters, shared by all entities
    pub grid_len: f64,
    /// Plane inlier residual threshold in meters
    pub ransac_residual_threshold: f64,
    /// Minimum fraction of scene points the plane must explain
    pub ransac_min_inlier_fraction: f64,
    /// Upper bound on consensus trials
    pub ransac_max_trials: usize,
    /// Confidence at which consensus sampling stops early
    pub ransac_stop_probability: f64,
    /// Handling of samples above the reference plane
    pub negative_height_policy: NegativeHeightPolicy,
    /// Shift the optical center by the crop offset of a non-square reference frame
    pub center_crop_correction: bool,
    /// Consensus seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            grid_len: constants::GRID_LEN,
            ransac_residual_threshold: constants::RANSAC_THRESHOLD,
            ransac_min_inlier_fraction: constants::RANSAC_MIN_INLIER_FRACTION,
            ransac_max_trials: constants::RANSAC_MAX_TRIALS,
            ransac_stop_probability: constants::RANSAC_STOP_PROBABILITY,
            negative_height_policy: NegativeHeightPolicy::default(),
            center_crop_correction: true,
            seed: None,
        }
    }
}

impl EstimationConfig {
    /// Default configuration with a fixed consensus seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> EstimationResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range
    pub fn validate(&self) -> EstimationResult<()> {
        if !(self.grid_len.is_finite() && self.grid_len > 0.0) {
            return Err(EstimationError::Config(format!(
                "grid_len must be positive, got {}",
                self.grid_len
            )));
        }
        if !(self.ransac_residual_threshold.is_finite() && self.ransac_residual_threshold > 0.0) {
            return Err(EstimationError::Config(format!(
                "ransac_residual_threshold must be positive, got {}",
                self.ransac_residual_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.ransac_min_inlier_fraction) {
            return Err(EstimationError::Config(format!(
                "ransac_min_inlier_fraction must be within [0, 1], got {}",
                self.ransac_min_inlier_fraction
            )));
        }
        if self.ransac_max_trials == 0 {
            return Err(EstimationError::Config(
                "ransac_max_trials must be at least 1".to_string(),
            ));
        }
        if !(self.ransac_stop_probability > 0.0 && self.ransac_stop_probability <= 1.0) {
            return Err(EstimationError::Config(format!(
                "ransac_stop_probability must be within (0, 1], got {}",
                self.ransac_stop_probability
            )));
        }
        Ok(())
    }

    /// Area of one grid cell in square meters
    pub fn cell_area(&self) -> f64 {
        self.grid_len * self.grid_len
    }
}
