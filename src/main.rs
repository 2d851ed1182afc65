// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "food-volume")]
#[command(about = "Estimate food area and volume from a depth capture")]
#[command(version = food_volume::constants::app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate area and volume for every labeled entity
    Estimate {
        /// Peripheral JSON with depth and calibration data
        #[arg(short, long)]
        peripheral: PathBuf,

        /// Label mask (JSON 2D array or grayscale PNG)
        #[arg(short, long)]
        labels: PathBuf,

        /// 16-bit depth PNG in millimeters, replaces the peripheral depth
        #[arg(long)]
        depth_png: Option<PathBuf>,

        /// Estimation config JSON (missing fields take defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Grid cell edge length in meters
        #[arg(long)]
        grid_len: Option<f64>,

        /// Plane fit seed for reproducible results
        #[arg(long)]
        seed: Option<u64>,

        /// Handling of samples above the table plane (clamp-cell, drop-points)
        #[arg(long)]
        policy: Option<String>,

        /// Apply lens distortion correction from the calibration
        #[arg(long)]
        rectify: bool,

        /// Crop depth and labels to the largest centered square
        #[arg(long)]
        center_crop: bool,

        /// Resample depth and labels to a square grid (default edge: 512)
        #[arg(long, value_name = "SIZE", num_args = 0..=1, default_missing_value = "512")]
        regulate: Option<usize>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default estimation config as JSON
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=food_volume=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            peripheral,
            labels,
            depth_png,
            config,
            grid_len,
            seed,
            policy,
            rectify,
            center_crop,
            regulate,
            output,
        } => cli::run_estimate(cli::EstimateArgs {
            peripheral,
            labels,
            depth_png,
            config,
            grid_len,
            seed,
            policy,
            rectify,
            center_crop,
            regulate,
            output,
        }),
        Commands::Config => cli::print_default_config(),
    }
}
