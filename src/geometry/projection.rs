// SPDX-License-Identifier: GPL-3.0-only

//! Depth map back-projection into camera-space point clouds

use super::intrinsics::CameraIntrinsics;
use crate::capture::{DepthMap, LabelMask};
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::debug;

/// A point in meters
pub type Point3D = Point3<f64>;

/// Ordered list of points in one coordinate frame
pub type PointCloud = Vec<Point3D>;

/// Pinhole back-projection of pixel `(row, col)` at `depth` meters
#[inline]
pub fn back_project(row: usize, col: usize, depth: f64, intrinsics: &CameraIntrinsics) -> Point3D {
    Point3D::new(
        (row as f64 - intrinsics.optical_center_x) * depth / intrinsics.focal_length,
        (col as f64 - intrinsics.optical_center_y) * depth / intrinsics.focal_length,
        depth,
    )
}

/// Point cloud of every pixel with valid depth
///
/// Invalid pixels (non-positive or non-finite) are skipped, not emitted as
/// zero points.
pub fn project_scene(depth_map: &DepthMap, intrinsics: &CameraIntrinsics) -> PointCloud {
    let mut cloud = Vec::with_capacity(depth_map.as_slice().len());
    for (row, col, depth) in depth_map.enumerate() {
        if DepthMap::is_valid_depth(depth) {
            cloud.push(back_project(row, col, depth as f64, intrinsics));
        }
    }
    debug!(
        pixels = depth_map.as_slice().len(),
        points = cloud.len(),
        "Projected scene point cloud"
    );
    cloud
}

/// Point cloud of the valid pixels labelled `entity_id`
///
/// The label mask must share the depth map's pixel grid.
pub fn project_entity(
    depth_map: &DepthMap,
    label_mask: &LabelMask,
    entity_id: u32,
    intrinsics: &CameraIntrinsics,
) -> PointCloud {
    depth_map
        .enumerate()
        .zip(label_mask.as_slice())
        .filter(|((_, _, depth), label)| **label == entity_id && DepthMap::is_valid_depth(*depth))
        .map(|((row, col, depth), _)| back_project(row, col, depth as f64, intrinsics))
        .collect()
}

/// Sub-clouds for every positive entity id, ascending, in one pass
///
/// Every id present in the mask gets an entry, even when none of its pixels
/// carry valid depth.
pub fn project_entities(
    depth_map: &DepthMap,
    label_mask: &LabelMask,
    intrinsics: &CameraIntrinsics,
) -> Vec<(u32, PointCloud)> {
    let mut clouds: BTreeMap<u32, PointCloud> = label_mask
        .entity_ids()
        .into_iter()
        .map(|id| (id, PointCloud::new()))
        .collect();

    for ((row, col, depth), &label) in depth_map.enumerate().zip(label_mask.as_slice()) {
        if label == 0 || !DepthMap::is_valid_depth(depth) {
            continue;
        }
        if let Some(cloud) = clouds.get_mut(&label) {
            cloud.push(back_project(row, col, depth as f64, intrinsics));
        }
    }

    for (id, cloud) in &clouds {
        debug!(entity_id = id, points = cloud.len(), "Projected entity point cloud");
    }

    clouds.into_iter().collect()
}
