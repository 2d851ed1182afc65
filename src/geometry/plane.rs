// SPDX-License-Identifier: GPL-3.0-only

//! Support plane detection
//!
//! Fits `z = a*x + b*y + c` to the full-scene cloud with random sample
//! consensus, so the objects standing on the plane do not bias it, then
//! derives the rotation that makes the plane horizontal.

use super::projection::{Point3D, PointCloud};
use crate::config::EstimationConfig;
use crate::constants::{PLANE_MIN_POINTS, RANSAC_MIN_INLIERS, RANSAC_SAMPLE_SIZE};
use crate::errors::GeometryError;
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Determinant below which a 3-point sample is treated as collinear in xy
const DEGENERATE_DETERMINANT: f64 = 1e-15;

/// Axis length below which the normal is already vertical
const VERTICAL_EPSILON: f64 = 1e-12;

/// Plane `z = a*x + b*y + c` in camera space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl PlaneModel {
    /// Exact plane through three points; `None` if they are collinear in xy
    pub fn from_points(p1: &Point3D, p2: &Point3D, p3: &Point3D) -> Option<Self> {
        let system = Matrix3::new(
            p1.x, p1.y, 1.0, //
            p2.x, p2.y, 1.0, //
            p3.x, p3.y, 1.0,
        );
        if system.determinant().abs() <= DEGENERATE_DETERMINANT {
            return None;
        }
        let coeffs = system.try_inverse()? * Vector3::new(p1.z, p2.z, p3.z);
        if !coeffs.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self {
            a: coeffs.x,
            b: coeffs.y,
            c: coeffs.z,
        })
    }

    /// Ordinary least squares over `points`, on mean-centered coordinates
    pub fn least_squares<'a>(points: impl Iterator<Item = &'a Point3D> + Clone) -> Option<Self> {
        let (mut n, mut mx, mut my, mut mz) = (0usize, 0.0, 0.0, 0.0);
        for p in points.clone() {
            n += 1;
            mx += p.x;
            my += p.y;
            mz += p.z;
        }
        if n < RANSAC_SAMPLE_SIZE {
            return None;
        }
        let count = n as f64;
        let (mx, my, mz) = (mx / count, my / count, mz / count);

        let (mut sxx, mut sxy, mut syy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for p in points {
            let (dx, dy, dz) = (p.x - mx, p.y - my, p.z - mz);
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
            sxz += dx * dz;
            syz += dy * dz;
        }

        let det = sxx * syy - sxy * sxy;
        if det.abs() <= DEGENERATE_DETERMINANT {
            return None;
        }
        let a = (sxz * syy - syz * sxy) / det;
        let b = (syz * sxx - sxz * sxy) / det;
        let model = Self {
            a,
            b,
            c: mz - a * mx - b * my,
        };
        [model.a, model.b, model.c]
            .iter()
            .all(|v| v.is_finite())
            .then_some(model)
    }

    /// Vertical residual `|z - (a*x + b*y + c)|`
    #[inline]
    pub fn residual(&self, p: &Point3D) -> f64 {
        (p.z - (self.a * p.x + self.b * p.y + self.c)).abs()
    }

    /// Whether `p` lies within `threshold` of the plane, boundary included
    #[inline]
    pub fn is_inlier(&self, p: &Point3D, threshold: f64) -> bool {
        self.residual(p) <= threshold
    }

    /// Normal pointing along +z, proportional to `(-a, -b, 1)`
    pub fn upward_normal(&self) -> Vector3<f64> {
        Vector3::new(-self.a, -self.b, 1.0)
    }
}

/// Consensus parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneFitConfig {
    pub residual_threshold: f64,
    pub min_inlier_fraction: f64,
    pub max_trials: usize,
    pub stop_probability: f64,
    pub seed: Option<u64>,
}

impl From<&EstimationConfig> for PlaneFitConfig {
    fn from(config: &EstimationConfig) -> Self {
        Self {
            residual_threshold: config.ransac_residual_threshold,
            min_inlier_fraction: config.ransac_min_inlier_fraction,
            max_trials: config.ransac_max_trials,
            stop_probability: config.ransac_stop_probability,
            seed: config.seed,
        }
    }
}

impl Default for PlaneFitConfig {
    fn default() -> Self {
        Self::from(&EstimationConfig::default())
    }
}

/// Result of the support plane fit
#[derive(Debug, Clone)]
pub struct PlaneFit {
    /// Least-squares refit over the consensus set
    pub model: PlaneModel,
    /// `true` for points of the support plane, aligned with the input cloud
    pub inlier_mask: Vec<bool>,
    pub inlier_count: usize,
    /// Axis-angle encoding of `rotation`
    pub rotation_vector: Vector3<f64>,
    /// Camera space to plane-aligned space
    pub rotation: Rotation3<f64>,
    /// Consensus trials actually run
    pub trials: usize,
}

impl PlaneFit {
    pub fn inlier_fraction(&self) -> f64 {
        if self.inlier_mask.is_empty() {
            0.0
        } else {
            self.inlier_count as f64 / self.inlier_mask.len() as f64
        }
    }

    /// Rotate a camera-space cloud into the plane-aligned frame
    pub fn rotate_cloud(&self, cloud: &[Point3D]) -> PointCloud {
        cloud.iter().map(|p| self.rotation * p).collect()
    }

    /// Mean plane-aligned z of the inliers of `scene`
    ///
    /// `scene` must be the camera-space cloud the fit was computed on.
    pub fn background_depth(&self, scene: &[Point3D]) -> f64 {
        let (sum, count) = scene
            .iter()
            .zip(&self.inlier_mask)
            .filter(|(_, inlier)| **inlier)
            .fold((0.0, 0usize), |(sum, count), (p, _)| {
                (sum + (self.rotation * p).z, count + 1)
            });
        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}

/// Rotation taking `normal` onto `+z`, with its rotation vector
///
/// Axis is `normal x z` normalized, angle `acos(normal . z / |normal|)`.
pub fn rotation_to_vertical(normal: &Vector3<f64>) -> (Vector3<f64>, Rotation3<f64>) {
    let vertical = Vector3::z();
    let axis = normal.cross(&vertical);
    let axis_norm = axis.norm();
    if axis_norm < VERTICAL_EPSILON {
        return (Vector3::zeros(), Rotation3::identity());
    }
    let cos_angle = (normal.dot(&vertical) / normal.norm()).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();
    let axis = Unit::new_normalize(axis);
    (axis.into_inner() * angle, Rotation3::from_axis_angle(&axis, angle))
}

/// Trials needed to draw one all-inlier sample with `probability`
///
/// Same bound as scikit-learn's RANSAC: `log(1 - p) / log(1 - w^k)`.
fn dynamic_max_trials(inliers: usize, total: usize, probability: f64) -> usize {
    let nom = 1.0 - probability;
    if nom <= 0.0 {
        return usize::MAX;
    }
    let inlier_ratio = inliers as f64 / total as f64;
    let denom = 1.0 - inlier_ratio.powi(RANSAC_SAMPLE_SIZE as i32);
    if denom <= 0.0 {
        return 1;
    }
    if denom >= 1.0 {
        return usize::MAX;
    }
    let trials = (nom.ln() / denom.ln()).ceil();
    if trials.is_finite() && trials < usize::MAX as f64 {
        trials as usize
    } else {
        usize::MAX
    }
}

/// Fit the dominant plane of `points`
///
/// Samples 3 distinct points per trial, scores every point's vertical
/// residual against the candidate and keeps the candidate with the most
/// inliers. The winning consensus set is the inlier mask; the final model is
/// its least-squares refit.
pub fn fit_plane(points: &[Point3D], config: &PlaneFitConfig) -> Result<PlaneFit, GeometryError> {
    let n = points.len();
    if n < PLANE_MIN_POINTS {
        return Err(GeometryError::TooFewPoints {
            needed: PLANE_MIN_POINTS,
            got: n,
        });
    }
    let min_inliers =
        RANSAC_MIN_INLIERS.max((config.min_inlier_fraction * n as f64).ceil() as usize);
    if n < RANSAC_SAMPLE_SIZE {
        return Err(GeometryError::InsufficientInliers {
            needed: min_inliers,
            found: n,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut best: Option<(PlaneModel, Vec<bool>, usize)> = None;
    let mut max_trials = config.max_trials;
    let mut trials = 0usize;
    let mut mask = vec![false; n];

    while trials < max_trials {
        trials += 1;
        let sample = rand::seq::index::sample(&mut rng, n, RANSAC_SAMPLE_SIZE);
        let Some(candidate) = PlaneModel::from_points(
            &points[sample.index(0)],
            &points[sample.index(1)],
            &points[sample.index(2)],
        ) else {
            continue;
        };

        let mut count = 0usize;
        for (flag, p) in mask.iter_mut().zip(points) {
            *flag = candidate.is_inlier(p, config.residual_threshold);
            count += *flag as usize;
        }

        let best_count = best.as_ref().map(|(_, _, c)| *c).unwrap_or(0);
        if best.is_none() || count > best_count {
            best = Some((candidate, mask.clone(), count));
            max_trials = max_trials.min(dynamic_max_trials(count, n, config.stop_probability));
        }
    }

    let Some((candidate, inlier_mask, inlier_count)) = best else {
        return Err(GeometryError::DegenerateSamples);
    };
    debug!(trials, inlier_count, total = n, "Plane consensus finished");

    if inlier_count < min_inliers {
        return Err(GeometryError::InsufficientInliers {
            needed: min_inliers,
            found: inlier_count,
        });
    }

    let inliers = points
        .iter()
        .zip(&inlier_mask)
        .filter(|(_, inlier)| **inlier)
        .map(|(p, _)| p);
    let model = PlaneModel::least_squares(inliers).unwrap_or(candidate);
    let (rotation_vector, rotation) = rotation_to_vertical(&model.upward_normal());

    info!(
        a = model.a,
        b = model.b,
        c = model.c,
        inlier_count,
        total = n,
        tilt_rad = rotation_vector.norm(),
        "Support plane fitted"
    );

    Ok(PlaneFit {
        model,
        inlier_mask,
        inlier_count,
        rotation_vector,
        rotation,
        trials,
    })
}
