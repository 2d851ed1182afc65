// SPDX-License-Identifier: GPL-3.0-only

//! Engine-wide constants

use serde::{Deserialize, Serialize};

/// Handling of grid cells whose samples sit above the reference plane
///
/// Such samples come from sensor noise or from segmentation spilling onto
/// the table edge. Both policies keep every entity's volume non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegativeHeightPolicy {
    /// Cell counts toward area, but a negative mean height adds no volume (default)
    #[default]
    ClampCell,
    /// Samples at or above the plane are discarded before gridding
    DropPoints,
}

impl NegativeHeightPolicy {
    /// All policy variants
    pub const ALL: [NegativeHeightPolicy; 2] = [
        NegativeHeightPolicy::ClampCell,
        NegativeHeightPolicy::DropPoints,
    ];

    /// Get display name for the policy
    pub fn display_name(&self) -> &'static str {
        match self {
            NegativeHeightPolicy::ClampCell => "Clamp cell",
            NegativeHeightPolicy::DropPoints => "Drop points",
        }
    }

    /// Name used on the command line and in config files
    pub fn cli_name(&self) -> &'static str {
        match self {
            NegativeHeightPolicy::ClampCell => "clamp-cell",
            NegativeHeightPolicy::DropPoints => "drop-points",
        }
    }

    /// Parse a command-line name
    pub fn from_cli_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.cli_name() == name)
    }
}

/// Grid cell edge length in meters
pub const GRID_LEN: f64 = 0.005;

/// Maximum residual (meters) for a point to count as a plane inlier
pub const RANSAC_THRESHOLD: f64 = 0.002;

/// Minimum fraction of the scene that must agree with the plane
pub const RANSAC_MIN_INLIER_FRACTION: f64 = 0.1;

/// Absolute minimum inlier count for a viable plane
pub const RANSAC_MIN_INLIERS: usize = 3;

/// Upper bound on consensus trials
pub const RANSAC_MAX_TRIALS: usize = 100;

/// Confidence at which trials stop early
pub const RANSAC_STOP_PROBABILITY: f64 = 0.99;

/// Points in a minimal plane sample
pub const RANSAC_SAMPLE_SIZE: usize = 3;

/// Minimum number of points for a plane fit request
pub const PLANE_MIN_POINTS: usize = 2;

/// Millimeters per meter, for 16-bit depth images
pub const DEPTH_MM_PER_M: f32 = 1000.0;

/// Invalid depth marker in 16-bit depth images
pub const DEPTH_INVALID_MM: u16 = 0;

/// Edge length of the square grid segmentation masks are produced on
pub const REGULATED_SIZE: usize = 512;

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_cli_names() {
        for policy in NegativeHeightPolicy::ALL {
            assert_eq!(NegativeHeightPolicy::from_cli_name(policy.cli_name()), Some(policy));
        }
        assert_eq!(NegativeHeightPolicy::from_cli_name("signed"), None);
    }
}
