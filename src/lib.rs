// SPDX-License-Identifier: GPL-3.0-only

//! Food Volume - area and volume estimation from a single depth capture
//!
//! This library estimates the top-surface area and volume of objects resting
//! on a table from a depth map, the camera calibration and an entity label
//! mask produced by a segmentation model.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`capture`]: Depth maps, label masks, calibration, loading and rectification
//! - [`geometry`]: Intrinsics, back-projection, plane fitting and grid indexing
//! - [`pipelines`]: The volume estimation pipeline
//! - [`config`]: Request-scoped estimation configuration
//! - [`errors`]: Error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use food_volume::{Calibration, DepthMap, EstimationConfig, LabelMask, estimate_area_volume};
//!
//! let depth = DepthMap::filled(10, 10, 1.0);
//! let labels = LabelMask::filled(10, 10, 0);
//! let calibration = Calibration::new(500.0, (5.0, 5.0), (10.0, 10.0));
//! let results = estimate_area_volume(&depth, &calibration, &labels, &EstimationConfig::seeded(7))?;
//! # Ok::<(), food_volume::EstimationError>(())
//! ```

pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod geometry;
pub mod pipelines;

// Re-export commonly used types
pub use capture::{Calibration, DepthMap, LabelMask, Rectifier};
pub use config::EstimationConfig;
pub use constants::NegativeHeightPolicy;
pub use errors::{EstimationError, EstimationResult};
pub use pipelines::volume::{
    AreaVolume, VolumeReport, estimate_area_volume, estimate_report, estimate_with_rectifier,
};
