// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use food_volume::constants;
use food_volume::{EstimationConfig, EstimationError, NegativeHeightPolicy};
use std::path::PathBuf;

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "food-volume-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = EstimationConfig::default();

    // Check sensible defaults
    assert_eq!(config.grid_len, constants::GRID_LEN);
    assert_eq!(
        config.negative_height_policy,
        NegativeHeightPolicy::ClampCell,
        "Cells above the plane should be clamped by default"
    );
    assert!(
        config.center_crop_correction,
        "Crop correction should be enabled by default"
    );
    assert!(config.seed.is_none(), "Production runs should not be seeded");
}

#[test]
fn test_config_seeded() {
    let config = EstimationConfig::seeded(99);
    assert_eq!(config.seed, Some(99));
    assert_eq!(config.grid_len, EstimationConfig::default().grid_len);
}

#[test]
fn test_config_from_json_file() {
    let path = temp_config(
        "partial",
        r#"{ "grid_len": 0.01, "negative_height_policy": "drop-points" }"#,
    );
    let config = EstimationConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.grid_len, 0.01);
    assert_eq!(
        config.negative_height_policy,
        NegativeHeightPolicy::DropPoints
    );
    assert_eq!(
        config.ransac_max_trials,
        constants::RANSAC_MAX_TRIALS,
        "Missing fields should take defaults"
    );
}

#[test]
fn test_config_file_is_validated() {
    let path = temp_config("invalid", r#"{ "ransac_stop_probability": 0.0 }"#);
    let result = EstimationConfig::from_json_file(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(EstimationError::Config(_))));
}

#[test]
fn test_config_missing_file() {
    let result = EstimationConfig::from_json_file(&PathBuf::from("/nonexistent/config.json"));
    assert!(matches!(result, Err(EstimationError::Load(_))));
}

#[test]
fn test_config_cell_area() {
    let config = EstimationConfig {
        grid_len: 0.5,
        ..EstimationConfig::default()
    };
    assert_eq!(config.cell_area(), 0.25);
}
