// SPDX-License-Identifier: GPL-3.0-only

//! Loading captures from disk
//!
//! A capture is a "peripheral" JSON document produced by the capture client,
//! plus a label mask produced by the segmentation service. Depth can also be
//! supplied as a 16-bit grayscale PNG in millimeters.

use super::types::{Calibration, DepthMap, LabelMask};
use crate::constants::{DEPTH_INVALID_MM, DEPTH_MM_PER_M};
use crate::errors::{EstimationError, EstimationResult};
use image::DynamicImage;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Depth map and calibration of one capture
#[derive(Debug, Clone)]
pub struct Capture {
    pub depth_map: DepthMap,
    pub calibration: Calibration,
}

/// On-disk peripheral document; other fields (device attitude) are ignored
#[derive(Deserialize)]
struct PeripheralDocument {
    /// Rows of depth in meters; `null` marks a missing sample
    depth_data: Vec<Vec<Option<f32>>>,
    calibration_data: Calibration,
}

/// Parse a peripheral JSON document
pub fn parse_peripheral(text: &str) -> EstimationResult<Capture> {
    let document: PeripheralDocument = serde_json::from_str(text)?;
    let rows = document
        .depth_data
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        .collect();
    let depth_map = DepthMap::from_rows(rows)?;
    Ok(Capture {
        depth_map,
        calibration: document.calibration_data,
    })
}

/// Load a peripheral JSON file
pub fn load_peripheral(path: &Path) -> EstimationResult<Capture> {
    let text = std::fs::read_to_string(path)?;
    let capture = parse_peripheral(&text)?;
    debug!(
        path = %path.display(),
        rows = capture.depth_map.height(),
        cols = capture.depth_map.width(),
        valid = capture.depth_map.valid_count(),
        "Loaded peripheral"
    );
    Ok(capture)
}

/// Load a label mask from a JSON 2D array or an 8/16-bit grayscale image
pub fn load_label_mask(path: &Path) -> EstimationResult<LabelMask> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"));

    let mask = if is_json {
        let text = std::fs::read_to_string(path)?;
        let rows: Vec<Vec<u32>> = serde_json::from_str(&text)?;
        LabelMask::from_rows(rows)?
    } else {
        label_mask_from_image(&image::open(path)?)?
    };

    debug!(
        path = %path.display(),
        entities = mask.entity_ids().len(),
        "Loaded label mask"
    );
    Ok(mask)
}

/// Label ids are taken verbatim from the gray channel; no rescaling
pub fn label_mask_from_image(img: &DynamicImage) -> EstimationResult<LabelMask> {
    match img {
        DynamicImage::ImageLuma8(gray) => {
            let (width, height) = gray.dimensions();
            let data = gray.as_raw().iter().map(|&v| v as u32).collect();
            Ok(LabelMask::new(width as usize, height as usize, data)?)
        }
        DynamicImage::ImageLuma16(gray) => {
            let (width, height) = gray.dimensions();
            let data = gray.as_raw().iter().map(|&v| v as u32).collect();
            Ok(LabelMask::new(width as usize, height as usize, data)?)
        }
        other => Err(EstimationError::Load(format!(
            "Label mask must be single-channel grayscale, got {:?}",
            other.color()
        ))),
    }
}

/// Load a 16-bit grayscale depth image in millimeters
pub fn load_depth_png(path: &Path) -> EstimationResult<DepthMap> {
    depth_map_from_image(&image::open(path)?)
}

/// Millimeter samples become meters; the invalid marker becomes 0
pub fn depth_map_from_image(img: &DynamicImage) -> EstimationResult<DepthMap> {
    let DynamicImage::ImageLuma16(gray) = img else {
        return Err(EstimationError::Load(format!(
            "Depth image must be 16-bit grayscale, got {:?}",
            img.color()
        )));
    };
    let (width, height) = gray.dimensions();
    let data = gray
        .as_raw()
        .iter()
        .map(|&mm| {
            if mm == DEPTH_INVALID_MM {
                0.0
            } else {
                mm as f32 / DEPTH_MM_PER_M
            }
        })
        .collect();
    Ok(DepthMap::new(width as usize, height as usize, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, RgbImage};

    #[test]
    fn test_parse_peripheral() {
        let json = r#"{
            "depth_data": [[0.5, null], [0.25, 1.0]],
            "calibration_data": {
                "intrinsic_matrix": [[100.0, 0.0, 0.0], [0.0, 100.0, 0.0], [1.0, 1.0, 1.0]],
                "intrinsic_matrix_reference_dimensions": [2.0, 2.0]
            },
            "device_attitude": { "pitch": 0.1 }
        }"#;
        let capture = parse_peripheral(json).unwrap();
        assert_eq!(capture.depth_map.shape(), (2, 2));
        assert_eq!(capture.depth_map.get(0, 1), Some(0.0));
        assert_eq!(capture.depth_map.get(1, 0), Some(0.25));
        assert_eq!(capture.calibration.focal_length(), Some(100.0));
    }

    #[test]
    fn test_parse_peripheral_ragged_rows() {
        let json = r#"{ "depth_data": [[0.5, 0.5], [0.5]], "calibration_data": {} }"#;
        assert!(matches!(
            parse_peripheral(json),
            Err(EstimationError::Input(_))
        ));
    }

    #[test]
    fn test_depth_from_16bit_image() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![0u16, 1500]).unwrap();
        let depth = depth_map_from_image(&DynamicImage::ImageLuma16(img)).unwrap();
        assert_eq!(depth.get(0, 0), Some(0.0));
        assert_eq!(depth.get(0, 1), Some(1.5));
    }

    #[test]
    fn test_depth_rejects_8bit_image() {
        let img = GrayImage::new(2, 2);
        assert!(depth_map_from_image(&DynamicImage::ImageLuma8(img)).is_err());
    }

    #[test]
    fn test_label_mask_keeps_raw_ids() {
        let img = GrayImage::from_raw(3, 1, vec![0u8, 1, 7]).unwrap();
        let mask = label_mask_from_image(&DynamicImage::ImageLuma8(img)).unwrap();
        assert_eq!(mask.as_slice(), &[0, 1, 7]);
    }

    #[test]
    fn test_label_mask_rejects_color() {
        let img = RgbImage::new(2, 2);
        assert!(label_mask_from_image(&DynamicImage::ImageRgb8(img)).is_err());
    }
}
