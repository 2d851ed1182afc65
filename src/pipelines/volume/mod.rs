// SPDX-License-Identifier: GPL-3.0-only

//! Volume estimation pipeline
//!
//! Turns one capture into per-entity top-surface area and volume:
//! - Rectify the depth map (pluggable)
//! - Resolve intrinsics at the depth map's resolution
//! - Project the full scene and fit the support plane
//! - Level every entity's cloud with the scene rotation
//! - Grid and integrate each entity against the shared background depth
//!
//! Everything is request-scoped; nothing survives between calls.

mod integrator;

pub use integrator::{AreaVolume, integrate, integrate_entity};

use crate::capture::{Calibration, DepthMap, IdentityRectifier, LabelMask, Rectifier};
use crate::config::EstimationConfig;
use crate::errors::{EstimationResult, InputError};
use crate::geometry::{
    PlaneFitConfig, fit_plane, project_entities, project_scene, resolve_intrinsics,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Support plane statistics of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneSummary {
    /// Mean plane-aligned z of the inliers, meters
    pub background_depth: f64,
    pub inlier_count: usize,
    pub inlier_fraction: f64,
    /// Axis-angle rotation leveling the plane
    pub rotation_vector: [f64; 3],
    pub trials: usize,
}

/// Per-entity results plus the plane they were measured against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    /// One entry per positive entity id, ascending
    pub results: Vec<AreaVolume>,
    /// `None` when the mask has no entities and no plane was fitted
    pub plane: Option<PlaneSummary>,
    pub scene_points: usize,
}

/// Estimate area and volume per entity without rectification
pub fn estimate_area_volume(
    depth_map: &DepthMap,
    calibration: &Calibration,
    label_mask: &LabelMask,
    config: &EstimationConfig,
) -> EstimationResult<Vec<AreaVolume>> {
    estimate_with_rectifier(depth_map, calibration, label_mask, config, &IdentityRectifier)
}

/// Estimate area and volume per entity on a rectified depth map
pub fn estimate_with_rectifier(
    depth_map: &DepthMap,
    calibration: &Calibration,
    label_mask: &LabelMask,
    config: &EstimationConfig,
    rectifier: &dyn Rectifier,
) -> EstimationResult<Vec<AreaVolume>> {
    estimate_report(depth_map, calibration, label_mask, config, rectifier)
        .map(|report| report.results)
}

/// Full estimation with plane statistics
///
/// Calibration and input shapes are validated first, and the rectified depth
/// map must keep the mask's shape. A mask without entities yields an empty
/// result regardless of depth content. Plane fit
/// failures abort the request; an entity without valid points yields zeros.
pub fn estimate_report(
    depth_map: &DepthMap,
    calibration: &Calibration,
    label_mask: &LabelMask,
    config: &EstimationConfig,
    rectifier: &dyn Rectifier,
) -> EstimationResult<VolumeReport> {
    config.validate()?;

    if depth_map.shape() != label_mask.shape() {
        return Err(InputError::ShapeMismatch {
            depth: depth_map.shape(),
            labels: label_mask.shape(),
        }
        .into());
    }

    let (rows, cols) = depth_map.shape();
    let intrinsics = resolve_intrinsics(calibration, rows, cols, config.center_crop_correction)?;

    if label_mask.entity_ids().is_empty() {
        info!("Label mask has no entities");
        return Ok(VolumeReport {
            results: Vec::new(),
            plane: None,
            scene_points: 0,
        });
    }

    let depth_map = rectifier.rectify(depth_map);
    if depth_map.shape() != label_mask.shape() {
        return Err(InputError::ShapeMismatch {
            depth: depth_map.shape(),
            labels: label_mask.shape(),
        }
        .into());
    }

    let scene = project_scene(&depth_map, &intrinsics);
    let plane_fit = fit_plane(&scene, &PlaneFitConfig::from(config))?;
    let background_depth = plane_fit.background_depth(&scene);
    debug!(background_depth, "Background depth");

    let entity_clouds = project_entities(&depth_map, label_mask, &intrinsics);
    let results: Vec<AreaVolume> = entity_clouds
        .into_par_iter()
        .map(|(entity_id, cloud)| {
            let leveled = plane_fit.rotate_cloud(&cloud);
            integrate_entity(entity_id, &leveled, background_depth, config).unwrap_or_else(|e| {
                debug!(error = %e, "Entity resolved to zero");
                AreaVolume::empty(entity_id)
            })
        })
        .collect();

    info!(
        entities = results.len(),
        scene_points = scene.len(),
        inlier_fraction = plane_fit.inlier_fraction(),
        background_depth,
        "Volume estimation complete"
    );

    let rotation_vector = plane_fit.rotation_vector;
    Ok(VolumeReport {
        results,
        plane: Some(PlaneSummary {
            background_depth,
            inlier_count: plane_fit.inlier_count,
            inlier_fraction: plane_fit.inlier_fraction(),
            rotation_vector: [rotation_vector.x, rotation_vector.y, rotation_vector.z],
            trials: plane_fit.trials,
        }),
        scene_points: scene.len(),
    })
}
