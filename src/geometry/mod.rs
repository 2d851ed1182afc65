// SPDX-License-Identifier: GPL-3.0-only

//! Geometric building blocks of the estimation pipeline
//!
//! Leaf-first:
//! - [`intrinsics`]: calibration rescaled to the depth map's resolution
//! - [`projection`]: depth map to camera-space point clouds
//! - [`plane`]: robust support-plane fit and leveling rotation
//! - [`grid`]: sparse cell index on the leveled horizontal axes

pub mod grid;
pub mod intrinsics;
pub mod plane;
pub mod projection;

pub use grid::{Cell, GridIndex};
pub use intrinsics::{CameraIntrinsics, resolve_intrinsics};
pub use plane::{PlaneFit, PlaneFitConfig, PlaneModel, fit_plane, rotation_to_vertical};
pub use projection::{Point3D, PointCloud, back_project, project_entities, project_entity, project_scene};
