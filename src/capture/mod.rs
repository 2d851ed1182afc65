// SPDX-License-Identifier: GPL-3.0-only

//! Capture inputs: depth map, calibration, label mask
//!
//! - [`types`]: pixel grids and the calibration record
//! - [`loader`]: peripheral JSON and PNG loading
//! - [`rectify`]: pluggable depth map correction

pub mod loader;
pub mod rectify;
pub mod types;

pub use loader::{Capture, load_depth_png, load_label_mask, load_peripheral, parse_peripheral};
pub use rectify::{IdentityRectifier, LensDistortionRectifier, Rectifier};
pub use types::{Calibration, DepthMap, LabelMask, PixelGrid};
