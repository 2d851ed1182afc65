// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for volume estimation
//!
//! This module provides command-line functionality for:
//! - Estimating area and volume from a capture on disk
//! - Printing the default configuration

use food_volume::capture::{
    Capture, IdentityRectifier, LensDistortionRectifier, Rectifier, load_depth_png,
    load_label_mask, load_peripheral,
};
use food_volume::pipelines::volume::{PlaneSummary, VolumeReport};
use food_volume::{EstimationConfig, LabelMask, NegativeHeightPolicy, estimate_report};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Arguments of the `estimate` command
pub struct EstimateArgs {
    pub peripheral: PathBuf,
    pub labels: PathBuf,
    pub depth_png: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub grid_len: Option<f64>,
    pub seed: Option<u64>,
    pub policy: Option<String>,
    pub rectify: bool,
    pub center_crop: bool,
    /// Square edge length both grids are resampled to
    pub regulate: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Output document: parallel `areas`/`volumes` arrays ordered like `entities`
#[derive(Serialize)]
struct EstimateOutput {
    entities: Vec<u32>,
    areas: Vec<f64>,
    volumes: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plane: Option<PlaneSummary>,
}

impl From<VolumeReport> for EstimateOutput {
    fn from(report: VolumeReport) -> Self {
        Self {
            entities: report.results.iter().map(|r| r.entity_id).collect(),
            areas: report.results.iter().map(|r| r.area).collect(),
            volumes: report.results.iter().map(|r| r.volume).collect(),
            plane: report.plane,
        }
    }
}

/// Config file (or defaults) with command-line overrides applied
fn estimation_config(args: &EstimateArgs) -> Result<EstimationConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config.as_ref() {
        Some(path) => EstimationConfig::from_json_file(path)?,
        None => EstimationConfig::default(),
    };
    if let Some(grid_len) = args.grid_len {
        config.grid_len = grid_len;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(name) = args.policy.as_deref() {
        config.negative_height_policy = NegativeHeightPolicy::from_cli_name(name)
            .ok_or_else(|| {
                let valid: Vec<&str> = NegativeHeightPolicy::ALL
                    .iter()
                    .map(|p| p.cli_name())
                    .collect();
                format!("Unknown policy '{}' (expected one of: {})", name, valid.join(", "))
            })?;
    }
    config.validate()?;
    Ok(config)
}

/// Load the capture and mask, then rectify, crop and regulate
///
/// Rectification runs on the full sensor frame, before any cropping.
fn prepare_inputs(
    args: &EstimateArgs,
) -> Result<(Capture, LabelMask), Box<dyn std::error::Error>> {
    let mut capture = load_peripheral(&args.peripheral)?;
    if let Some(path) = args.depth_png.as_ref() {
        capture.depth_map = load_depth_png(path)?;
    }
    let mut label_mask = load_label_mask(&args.labels)?;

    if args.rectify {
        let rectifier = LensDistortionRectifier::from_calibration(&capture.calibration)?;
        capture.depth_map = rectifier.rectify(&capture.depth_map);
    }

    if args.center_crop {
        capture.depth_map = capture.depth_map.center_crop();
        label_mask = label_mask.center_crop();
    }

    if let Some(size) = args.regulate {
        capture.depth_map = capture.depth_map.resize(size, size)?;
        label_mask = label_mask.resize(size, size)?;
    }

    debug!(
        depth = ?capture.depth_map.shape(),
        labels = ?label_mask.shape(),
        "Inputs prepared"
    );
    Ok((capture, label_mask))
}

fn estimate(args: &EstimateArgs) -> Result<EstimateOutput, Box<dyn std::error::Error>> {
    let config = estimation_config(args)?;
    let (capture, label_mask) = prepare_inputs(args)?;

    let report = estimate_report(
        &capture.depth_map,
        &capture.calibration,
        &label_mask,
        &config,
        &IdentityRectifier,
    )?;
    Ok(EstimateOutput::from(report))
}

/// Run the estimation engine on a capture and write the results as JSON
pub fn run_estimate(args: EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let output = estimate(&args)?;

    info!(
        entities = output.entities.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Estimate finished"
    );

    let json = serde_json::to_string_pretty(&output)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json + "\n")?;
            eprintln!("Results saved to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Print the default configuration
pub fn print_default_config() -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{}",
        serde_json::to_string_pretty(&EstimationConfig::default())?
    );
    Ok(())
}
