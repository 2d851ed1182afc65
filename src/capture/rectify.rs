// SPDX-License-Identifier: GPL-3.0-only

//! Depth map rectification
//!
//! The engine only consumes an already-corrected depth map. How the
//! correction happens is up to the [`Rectifier`] the caller supplies.

use super::types::{Calibration, DepthMap};
use crate::errors::CalibrationError;
use tracing::debug;

/// Produces a corrected depth map on the same pixel grid
pub trait Rectifier {
    fn rectify(&self, depth_map: &DepthMap) -> DepthMap;
}

/// Leaves the depth map untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRectifier;

impl Rectifier for IdentityRectifier {
    fn rectify(&self, depth_map: &DepthMap) -> DepthMap {
        depth_map.clone()
    }
}

/// Radial lens-distortion correction from a magnification lookup table
///
/// For each output pixel the magnification is interpolated from the table by
/// the pixel's distance to the distortion center, relative to the distance
/// from the center to the farthest image corner. The source sample sits at
/// `center + offset * (1 + magnification)`. Output pixels whose source falls
/// outside the image get depth 0.
#[derive(Debug, Clone)]
pub struct LensDistortionRectifier {
    /// Distortion center in reference pixels, `(row axis, col axis)`
    center: (f64, f64),
    lookup_table: Vec<f64>,
    reference_min_dimension: f64,
}

impl LensDistortionRectifier {
    pub fn new(
        center: (f64, f64),
        lookup_table: Vec<f64>,
        reference_min_dimension: f64,
    ) -> Result<Self, CalibrationError> {
        if lookup_table.is_empty() {
            return Err(CalibrationError::InvalidDistortion(
                "lookup table is empty".to_string(),
            ));
        }
        if lookup_table.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::InvalidDistortion(
                "lookup table has non-finite entries".to_string(),
            ));
        }
        if !(reference_min_dimension.is_finite() && reference_min_dimension > 0.0) {
            return Err(CalibrationError::InvalidDistortion(format!(
                "reference dimension must be positive, got {}",
                reference_min_dimension
            )));
        }
        Ok(Self {
            center,
            lookup_table,
            reference_min_dimension,
        })
    }

    /// Build from the calibration's distortion center and lookup table
    pub fn from_calibration(calibration: &Calibration) -> Result<Self, CalibrationError> {
        let center = calibration.lens_distortion_center.ok_or_else(|| {
            CalibrationError::InvalidDistortion("distortion center is missing".to_string())
        })?;
        let lookup_table = calibration
            .lens_distortion_lookup_table
            .clone()
            .ok_or_else(|| {
                CalibrationError::InvalidDistortion("lookup table is missing".to_string())
            })?;
        let (width, height) = calibration
            .reference_dimensions()
            .ok_or(CalibrationError::MissingReferenceDimensions)?;
        Self::new((center[0], center[1]), lookup_table, width.min(height))
    }

    /// Magnification at `radius`, given the largest radius in the image
    fn magnification(&self, radius: f64, radius_max: f64) -> f64 {
        let last = self.lookup_table.len() - 1;
        if radius >= radius_max || last == 0 {
            return self.lookup_table[last];
        }
        let position = radius / radius_max * last as f64;
        let lower = position.floor();
        let frac = position - lower;
        let lower = lower as usize;
        let upper = (position.ceil() as usize).min(last);
        self.lookup_table[lower] * (1.0 - frac) + self.lookup_table[upper] * frac
    }
}

impl Rectifier for LensDistortionRectifier {
    fn rectify(&self, depth_map: &DepthMap) -> DepthMap {
        let rows = depth_map.height();
        let cols = depth_map.width();
        if depth_map.is_empty() {
            return depth_map.clone();
        }

        // Distortion center follows the depth map's resolution
        let scale = rows.min(cols) as f64 / self.reference_min_dimension;
        let (center_row, center_col) = (self.center.0 * scale, self.center.1 * scale);

        let reach_row = center_row.max(rows as f64 - center_row);
        let reach_col = center_col.max(cols as f64 - center_col);
        let radius_max = reach_row.hypot(reach_col);

        let mut rectified = DepthMap::filled(cols, rows, 0.0);
        let mut out_of_bounds = 0usize;
        for row in 0..rows {
            for col in 0..cols {
                let d_row = row as f64 - center_row;
                let d_col = col as f64 - center_col;
                let factor = 1.0 + self.magnification(d_row.hypot(d_col), radius_max);

                // Truncation toward zero, then bounds check
                let src_row = (center_row + d_row * factor) as i64;
                let src_col = (center_col + d_col * factor) as i64;
                if src_row < 0 || src_col < 0 || src_row >= rows as i64 || src_col >= cols as i64
                {
                    out_of_bounds += 1;
                    continue;
                }
                if let Some(value) = depth_map.get(src_row as usize, src_col as usize) {
                    rectified.set(row, col, value);
                }
            }
        }

        debug!(rows, cols, out_of_bounds, "Rectified depth map");
        rectified
    }
}
