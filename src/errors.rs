// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the estimation engine
//!
//! Request-wide failures ([`CalibrationError`], [`GeometryError`],
//! [`InputError`]) abort the whole estimation. [`EmptyEntityError`] is
//! per-entity and resolved by the engine into a zero result.

use std::fmt;

/// Result type alias using EstimationError
pub type EstimationResult<T> = Result<T, EstimationError>;

/// Main engine error type
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Intrinsic calibration data is missing or malformed
    Calibration(CalibrationError),
    /// The support plane could not be established
    Geometry(GeometryError),
    /// Input grids are inconsistent
    Input(InputError),
    /// Configuration values are out of range
    Config(String),
    /// Capture files could not be read or decoded
    Load(String),
}

/// Calibration-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// No intrinsic matrix in the calibration record
    MissingIntrinsicMatrix,
    /// No reference dimensions in the calibration record
    MissingReferenceDimensions,
    /// Focal length is zero, negative or not a number
    InvalidFocalLength(f64),
    /// Optical center is not a finite coordinate
    InvalidOpticalCenter { x: f64, y: f64 },
    /// Reference dimensions are non-positive or not finite
    InvalidReferenceDimensions { width: f64, height: f64 },
    /// Target depth map has no pixels
    EmptyTarget { width: usize, height: usize },
    /// Lens distortion data is incomplete
    InvalidDistortion(String),
}

/// Plane fitting errors
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Not enough valid points to fit a plane
    TooFewPoints { needed: usize, got: usize },
    /// Every sampled subset was collinear
    DegenerateSamples,
    /// Best consensus model does not reach the minimum inlier count
    InsufficientInliers { needed: usize, found: usize },
}

/// Input shape errors
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// Depth map and label mask cover different pixel grids
    ShapeMismatch {
        depth: (usize, usize),
        labels: (usize, usize),
    },
    /// Buffer length does not match the declared dimensions
    BufferSize { expected: usize, got: usize },
    /// Rows of a nested array have different lengths
    RaggedRows { row: usize, expected: usize, got: usize },
    /// A grid without pixels cannot be resampled to a non-empty size
    EmptyResample { width: usize, height: usize },
}

/// An entity has no valid points after filtering
///
/// Recoverable: the engine reports `(0, 0)` for the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyEntityError {
    pub entity_id: u32,
}

impl fmt::Display for EstimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationError::Calibration(e) => write!(f, "Calibration error: {}", e),
            EstimationError::Geometry(e) => write!(f, "Geometry error: {}", e),
            EstimationError::Input(e) => write!(f, "Input error: {}", e),
            EstimationError::Config(msg) => write!(f, "Configuration error: {}", msg),
            EstimationError::Load(msg) => write!(f, "Load error: {}", msg),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::MissingIntrinsicMatrix => write!(f, "Intrinsic matrix is missing"),
            CalibrationError::MissingReferenceDimensions => {
                write!(f, "Intrinsic matrix reference dimensions are missing")
            }
            CalibrationError::InvalidFocalLength(fl) => {
                write!(f, "Invalid focal length: {}", fl)
            }
            CalibrationError::InvalidOpticalCenter { x, y } => {
                write!(f, "Invalid optical center: ({}, {})", x, y)
            }
            CalibrationError::InvalidReferenceDimensions { width, height } => {
                write!(f, "Invalid reference dimensions: {}x{}", width, height)
            }
            CalibrationError::EmptyTarget { width, height } => {
                write!(f, "Target resolution is empty: {}x{}", width, height)
            }
            CalibrationError::InvalidDistortion(msg) => {
                write!(f, "Invalid lens distortion data: {}", msg)
            }
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::TooFewPoints { needed, got } => {
                write!(f, "Too few points for plane fit: need {}, got {}", needed, got)
            }
            GeometryError::DegenerateSamples => {
                write!(f, "No non-degenerate sample found for plane fit")
            }
            GeometryError::InsufficientInliers { needed, found } => {
                write!(
                    f,
                    "Plane fit has too few inliers: need {}, found {}",
                    needed, found
                )
            }
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::ShapeMismatch { depth, labels } => write!(
                f,
                "Depth map is {}x{} but label mask is {}x{}",
                depth.0, depth.1, labels.0, labels.1
            ),
            InputError::BufferSize { expected, got } => {
                write!(f, "Buffer has {} values, expected {}", got, expected)
            }
            InputError::RaggedRows { row, expected, got } => {
                write!(f, "Row {} has {} values, expected {}", row, got, expected)
            }
            InputError::EmptyResample { width, height } => {
                write!(f, "Cannot resample an empty grid to {}x{}", width, height)
            }
        }
    }
}

impl fmt::Display for EmptyEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity {} has no valid points", self.entity_id)
    }
}

impl std::error::Error for EstimationError {}
impl std::error::Error for CalibrationError {}
impl std::error::Error for GeometryError {}
impl std::error::Error for InputError {}
impl std::error::Error for EmptyEntityError {}

// Conversions from sub-errors to EstimationError
impl From<CalibrationError> for EstimationError {
    fn from(err: CalibrationError) -> Self {
        EstimationError::Calibration(err)
    }
}

impl From<GeometryError> for EstimationError {
    fn from(err: GeometryError) -> Self {
        EstimationError::Geometry(err)
    }
}

impl From<InputError> for EstimationError {
    fn from(err: InputError) -> Self {
        EstimationError::Input(err)
    }
}

impl From<std::io::Error> for EstimationError {
    fn from(err: std::io::Error) -> Self {
        EstimationError::Load(err.to_string())
    }
}

impl From<serde_json::Error> for EstimationError {
    fn from(err: serde_json::Error) -> Self {
        EstimationError::Load(err.to_string())
    }
}

impl From<image::ImageError> for EstimationError {
    fn from(err: image::ImageError) -> Self {
        EstimationError::Load(err.to_string())
    }
}

impl EstimationError {
    /// Whether the failure is caused by the client's input rather than processing
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EstimationError::Calibration(_)
                | EstimationError::Input(_)
                | EstimationError::Config(_)
                | EstimationError::Load(_)
        )
    }
}
