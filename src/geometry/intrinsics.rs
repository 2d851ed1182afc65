// SPDX-License-Identifier: GPL-3.0-only

//! Intrinsics at the depth map's resolution
//!
//! Calibration is captured at a reference resolution (typically the color
//! sensor's) while the depth map arrives downscaled and, for a square
//! target, center-cropped. The resolved intrinsics follow both.

use crate::capture::Calibration;
use crate::errors::CalibrationError;
use tracing::debug;

/// Pinhole intrinsics for depth-to-3D back-projection, in target pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub focal_length: f64,
    /// Optical center along the row axis
    pub optical_center_x: f64,
    /// Optical center along the column axis
    pub optical_center_y: f64,
}

/// Resolve intrinsics for a `rows x cols` depth map
///
/// `scale = min(rows, cols) / min(reference width, reference height)`. With
/// `center_crop_correction`, a square target taken from a non-square reference
/// first shifts the optical center by `floor(|w - h| / 2)` along the longer
/// reference axis.
pub fn resolve_intrinsics(
    calibration: &Calibration,
    rows: usize,
    cols: usize,
    center_crop_correction: bool,
) -> Result<CameraIntrinsics, CalibrationError> {
    if rows == 0 || cols == 0 {
        return Err(CalibrationError::EmptyTarget {
            width: cols,
            height: rows,
        });
    }

    let focal_length = calibration
        .focal_length()
        .ok_or(CalibrationError::MissingIntrinsicMatrix)?;
    let (center_x, center_y) = calibration
        .optical_center()
        .ok_or(CalibrationError::MissingIntrinsicMatrix)?;
    let (ref_width, ref_height) = calibration
        .reference_dimensions()
        .ok_or(CalibrationError::MissingReferenceDimensions)?;

    if !(focal_length.is_finite() && focal_length > 0.0) {
        return Err(CalibrationError::InvalidFocalLength(focal_length));
    }
    if !(center_x.is_finite() && center_y.is_finite()) {
        return Err(CalibrationError::InvalidOpticalCenter {
            x: center_x,
            y: center_y,
        });
    }
    if !(ref_width.is_finite() && ref_height.is_finite() && ref_width > 0.0 && ref_height > 0.0)
    {
        return Err(CalibrationError::InvalidReferenceDimensions {
            width: ref_width,
            height: ref_height,
        });
    }

    let (offset_x, offset_y) = if center_crop_correction && rows == cols {
        crop_offset(ref_width, ref_height)
    } else {
        (0.0, 0.0)
    };

    let scale = rows.min(cols) as f64 / ref_width.min(ref_height);
    let intrinsics = CameraIntrinsics {
        focal_length: focal_length * scale,
        optical_center_x: (center_x - offset_x) * scale,
        optical_center_y: (center_y - offset_y) * scale,
    };

    debug!(
        scale,
        offset_x,
        offset_y,
        focal_length = intrinsics.focal_length,
        optical_center_x = intrinsics.optical_center_x,
        optical_center_y = intrinsics.optical_center_y,
        "Resolved intrinsics"
    );

    Ok(intrinsics)
}

/// Pixels removed at the start of the longer axis by a center crop
fn crop_offset(width: f64, height: f64) -> (f64, f64) {
    if width > height {
        (((width - height) / 2.0).floor(), 0.0)
    } else {
        (0.0, ((height - width) / 2.0).floor())
    }
}
