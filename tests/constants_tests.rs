// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use food_volume::constants::{self, NegativeHeightPolicy};

#[test]
fn test_policy_values() {
    // Test that both policies exist (ClampCell, DropPoints)
    assert_eq!(NegativeHeightPolicy::ALL.len(), 2);
}

#[test]
fn test_policy_names_unique() {
    let names: Vec<&str> = NegativeHeightPolicy::ALL
        .iter()
        .map(|p| p.cli_name())
        .collect();
    for (i, name) in names.iter().enumerate() {
        assert!(
            !names[i + 1..].contains(name),
            "Policy CLI names should be unique"
        );
        assert!(!name.is_empty());
    }
}

#[test]
fn test_policy_display_names() {
    for policy in NegativeHeightPolicy::ALL {
        assert!(
            !policy.display_name().is_empty(),
            "Every policy should have a display name"
        );
    }
}

#[test]
fn test_ransac_defaults_are_consistent() {
    assert!(constants::RANSAC_THRESHOLD > 0.0);
    assert!(constants::RANSAC_MIN_INLIERS >= constants::RANSAC_SAMPLE_SIZE);
    assert!(constants::PLANE_MIN_POINTS <= constants::RANSAC_SAMPLE_SIZE);
    assert!(
        constants::RANSAC_STOP_PROBABILITY > 0.0 && constants::RANSAC_STOP_PROBABILITY < 1.0,
        "Stop probability should allow early termination"
    );
}

#[test]
fn test_grid_len_positive() {
    assert!(constants::GRID_LEN > 0.0);
}

#[test]
fn test_version_not_empty() {
    assert!(!constants::app_info::version().is_empty());
}
