// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the volume estimation engine

use approx::assert_relative_eq;
use food_volume::capture::{IdentityRectifier, LensDistortionRectifier, parse_peripheral};
use food_volume::geometry::{Point3D, PlaneFitConfig, fit_plane};
use food_volume::{
    Calibration, DepthMap, EstimationConfig, LabelMask, NegativeHeightPolicy, Rectifier,
    estimate_area_volume, estimate_report, estimate_with_rectifier,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZE: usize = 10;

fn small_calibration() -> Calibration {
    Calibration::new(500.0, (5.0, 5.0), (SIZE as f64, SIZE as f64))
}

/// Flat table at 1 m with a 2x2 block at rows 4-5, cols 4-5 raised to 0.9 m
fn block_scene() -> (DepthMap, LabelMask) {
    let mut depth = DepthMap::filled(SIZE, SIZE, 1.0);
    let mut labels = LabelMask::filled(SIZE, SIZE, 0);
    for row in 4..6 {
        for col in 4..6 {
            depth.set(row, col, 0.9);
            labels.set(row, col, 1);
        }
    }
    (depth, labels)
}

fn config_with_grid(grid_len: f64) -> EstimationConfig {
    EstimationConfig {
        grid_len,
        ..EstimationConfig::seeded(42)
    }
}

/// Tilted table `z = a*x + b*y + c` seen through a 64x64 pinhole camera,
/// with a box of `height` meters (measured along the ray) on rows/cols 24..40
fn tilted_scene(
    a: f64,
    b: f64,
    c: f64,
    height: f64,
    seed: u64,
) -> (DepthMap, LabelMask, Calibration) {
    let size = 64;
    let focal_length = 60.0;
    let center = size as f64 / 2.0;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut depth = DepthMap::filled(size, size, 0.0);
    let mut labels = LabelMask::filled(size, size, 0);

    for row in 0..size {
        for col in 0..size {
            let u = (row as f64 - center) / focal_length;
            let v = (col as f64 - center) / focal_length;
            let mut z = c / (1.0 - a * u - b * v);
            if (24..40).contains(&row) && (24..40).contains(&col) {
                z -= height;
                labels.set(row, col, 1);
            }
            z += rng.gen_range(-0.0005..0.0005);
            depth.set(row, col, z as f32);
        }
    }

    let calibration = Calibration::new(focal_length, (center, center), (size as f64, size as f64));
    (depth, labels, calibration)
}

#[test]
fn test_no_entities_returns_empty() {
    let depth = DepthMap::filled(SIZE, SIZE, 1.0);
    let labels = LabelMask::filled(SIZE, SIZE, 0);
    let results =
        estimate_area_volume(&depth, &small_calibration(), &labels, &EstimationConfig::seeded(1))
            .unwrap();
    assert!(results.is_empty(), "Mask without entities should give no results");
}

#[test]
fn test_block_on_flat_table() {
    let (depth, labels) = block_scene();
    let grid_len = 0.0015;
    let results =
        estimate_area_volume(&depth, &small_calibration(), &labels, &config_with_grid(grid_len))
            .unwrap();

    assert_eq!(results.len(), 1);
    let result = results[0];
    assert_eq!(result.entity_id, 1);
    // Block pixels are ~1.8 mm apart, so each lands in its own cell
    assert_relative_eq!(result.area, 4.0 * grid_len * grid_len, max_relative = 1e-12);
    assert_relative_eq!(result.volume, result.area * 0.1, max_relative = 1e-6);
}

#[test]
fn test_flat_table_is_not_rotated() {
    let (depth, labels) = block_scene();
    let report = estimate_report(
        &depth,
        &small_calibration(),
        &labels,
        &EstimationConfig::seeded(3),
        &IdentityRectifier,
    )
    .unwrap();

    let plane = report.plane.expect("Plane should be fitted when entities exist");
    assert_eq!(plane.rotation_vector, [0.0, 0.0, 0.0]);
    assert_eq!(plane.inlier_count, 96);
    assert_eq!(plane.background_depth, 1.0);
    assert_eq!(report.scene_points, 100);
}

#[test]
fn test_identical_runs_are_bit_identical() {
    let (depth, labels, calibration) = tilted_scene(0.1, -0.05, 1.0, 0.05, 11);
    let config = EstimationConfig::seeded(1234);

    let first = estimate_area_volume(&depth, &calibration, &labels, &config).unwrap();
    let second = estimate_area_volume(&depth, &calibration, &labels, &config).unwrap();

    assert_eq!(first, second, "Same seed should reproduce results exactly");
}

#[test]
fn test_tilted_table_is_leveled() {
    let (a, b, height) = (0.1, -0.05, 0.05);
    let (depth, labels, calibration) = tilted_scene(a, b, 1.0, height, 5);
    let config = EstimationConfig {
        grid_len: 0.02,
        ..EstimationConfig::seeded(8)
    };

    let report = estimate_report(&depth, &calibration, &labels, &config, &IdentityRectifier).unwrap();
    let plane = report.plane.unwrap();

    let tilt = (a * a + b * b).sqrt().atan();
    let rotation_vector = nalgebra::Vector3::from(plane.rotation_vector);
    assert_relative_eq!(rotation_vector.norm(), tilt, epsilon = 5e-3);

    let result = report.results[0];
    assert!(result.area > 0.0);
    let mean_height = result.volume / result.area;
    assert!(
        (mean_height - height).abs() < 0.1 * height,
        "Mean height {} should be close to {}",
        mean_height,
        height
    );
}

#[test]
fn test_area_is_multiple_of_cell_area() {
    let (depth, labels, calibration) = tilted_scene(0.08, 0.03, 0.8, 0.04, 21);
    let config = EstimationConfig::seeded(2);
    let results = estimate_area_volume(&depth, &calibration, &labels, &config).unwrap();

    for result in results {
        let cells = result.area / config.cell_area();
        assert_relative_eq!(cells, cells.round(), epsilon = 1e-6);
        assert!(result.volume >= 0.0);
    }
}

#[test]
fn test_non_contiguous_ids_and_empty_entity() {
    let mut depth = DepthMap::filled(SIZE, SIZE, 1.0);
    let mut labels = LabelMask::filled(SIZE, SIZE, 0);
    depth.set(2, 2, 0.95);
    labels.set(2, 2, 2);
    // Entity 7 only covers pixels without depth
    depth.set(8, 8, 0.0);
    depth.set(8, 9, f32::NAN);
    labels.set(8, 8, 7);
    labels.set(8, 9, 7);

    let results =
        estimate_area_volume(&depth, &small_calibration(), &labels, &config_with_grid(0.001))
            .unwrap();

    let ids: Vec<u32> = results.iter().map(|r| r.entity_id).collect();
    assert_eq!(ids, vec![2, 7], "Results should follow ascending entity ids");
    assert!(results[0].volume > 0.0);
    assert_eq!(results[1].pair(), (0.0, 0.0));
}

#[test]
fn test_negative_height_policies() {
    let mut depth = DepthMap::filled(SIZE, SIZE, 1.0);
    let mut labels = LabelMask::filled(SIZE, SIZE, 0);
    for row in 4..6 {
        for col in 0..4 {
            // Two columns stand on the table, two sink below it
            depth.set(row, col, if col < 2 { 0.95 } else { 1.01 });
            labels.set(row, col, 1);
        }
    }
    let grid_len = 0.001;
    let clamp = EstimationConfig {
        negative_height_policy: NegativeHeightPolicy::ClampCell,
        ..config_with_grid(grid_len)
    };
    let drop = EstimationConfig {
        negative_height_policy: NegativeHeightPolicy::DropPoints,
        ..config_with_grid(grid_len)
    };

    let calibration = small_calibration();
    let clamped = estimate_area_volume(&depth, &calibration, &labels, &clamp).unwrap()[0];
    let dropped = estimate_area_volume(&depth, &calibration, &labels, &drop).unwrap()[0];

    let cell_area = grid_len * grid_len;
    assert_relative_eq!(clamped.area, 8.0 * cell_area, max_relative = 1e-12);
    assert_relative_eq!(dropped.area, 4.0 * cell_area, max_relative = 1e-12);
    assert_relative_eq!(clamped.volume, dropped.volume, max_relative = 1e-12);
    assert_relative_eq!(dropped.volume, 4.0 * cell_area * 0.05, max_relative = 1e-6);
}

#[test]
fn test_background_depth_ignores_point_order() {
    let mut cloud = Vec::new();
    for i in 0..15 {
        for j in 0..15 {
            let x = i as f64 * 0.01;
            let y = j as f64 * 0.01;
            cloud.push(Point3D::new(x, y, 0.05 * x - 0.02 * y + 0.7));
        }
    }
    cloud.push(Point3D::new(0.05, 0.05, 0.2));
    cloud.push(Point3D::new(0.07, 0.02, 0.25));

    let config = PlaneFitConfig {
        seed: Some(17),
        ..PlaneFitConfig::default()
    };
    let forward = fit_plane(&cloud, &config).unwrap();
    let mut reversed_cloud = cloud.clone();
    reversed_cloud.reverse();
    let reversed = fit_plane(&reversed_cloud, &config).unwrap();

    assert_eq!(forward.inlier_count, reversed.inlier_count);
    assert_relative_eq!(
        forward.background_depth(&cloud),
        reversed.background_depth(&reversed_cloud),
        epsilon = 1e-12
    );
}

/// Replaces whatever it is given with a fixed depth map
struct FixedDepth(DepthMap);

impl Rectifier for FixedDepth {
    fn rectify(&self, _depth_map: &DepthMap) -> DepthMap {
        self.0.clone()
    }
}

#[test]
fn test_engine_measures_rectified_depth() {
    let (depth, labels) = block_scene();
    let blank = DepthMap::filled(SIZE, SIZE, 0.0);
    let config = config_with_grid(0.0015);

    let rectified = estimate_with_rectifier(
        &blank,
        &small_calibration(),
        &labels,
        &config,
        &FixedDepth(depth.clone()),
    )
    .unwrap();
    let direct = estimate_area_volume(&depth, &small_calibration(), &labels, &config).unwrap();

    assert_eq!(rectified, direct);
}

#[test]
fn test_zero_distortion_matches_identity() {
    let (depth, labels) = block_scene();
    let calibration = small_calibration().with_lens_distortion((5.0, 5.0), vec![0.0; 8]);
    let rectifier = LensDistortionRectifier::from_calibration(&calibration).unwrap();
    let config = config_with_grid(0.0015);

    let corrected =
        estimate_with_rectifier(&depth, &calibration, &labels, &config, &rectifier).unwrap();
    let direct = estimate_area_volume(&depth, &calibration, &labels, &config).unwrap();

    assert_eq!(corrected, direct);
}

#[test]
fn test_peripheral_document_end_to_end() {
    let (depth, labels) = block_scene();
    let depth_rows: Vec<Vec<f32>> = (0..SIZE)
        .map(|row| (0..SIZE).map(|col| depth.get(row, col).unwrap_or(0.0)).collect())
        .collect();
    let document = serde_json::json!({
        "depth_data": depth_rows,
        "calibration_data": {
            "intrinsic_matrix": [[500.0, 0.0, 0.0], [0.0, 500.0, 0.0], [5.0, 5.0, 1.0]],
            "intrinsic_matrix_reference_dimensions": [10.0, 10.0]
        },
        "device_attitude": { "pitch": 0.1 }
    });

    let capture = parse_peripheral(&document.to_string()).unwrap();
    assert_eq!(capture.calibration, small_calibration());

    let config = config_with_grid(0.0015);
    let from_document =
        estimate_area_volume(&capture.depth_map, &capture.calibration, &labels, &config).unwrap();
    let direct = estimate_area_volume(&depth, &small_calibration(), &labels, &config).unwrap();
    assert_eq!(from_document, direct);
}
