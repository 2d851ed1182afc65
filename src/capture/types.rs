// SPDX-License-Identifier: GPL-3.0-only

//! Pixel grids and calibration records for a single depth capture

use crate::errors::InputError;
use serde::{Deserialize, Serialize};

/// Row-major 2D pixel grid
///
/// Row index is the first image axis, column index the second. The same
/// layout is used for depth maps and label masks so they can be paired
/// pixel for pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Per-pixel distance from the camera in meters; `<= 0` marks no depth
pub type DepthMap = PixelGrid<f32>;

/// Per-pixel entity id; `0` is background
pub type LabelMask = PixelGrid<u32>;

impl<T: Copy> PixelGrid<T> {
    /// Wrap a row-major buffer of `height * width` values
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Result<Self, InputError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(InputError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grid with every pixel set to `value`
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, InputError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(width * height);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(InputError::RaggedRows {
                    row,
                    expected: width,
                    got: values.len(),
                });
            }
            data.extend(values);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Set a pixel; out-of-range coordinates are ignored
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        if row < self.height && col < self.width {
            self.data[row * self.width + col] = value;
        }
    }

    /// Row-major values
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate `(row, col, value)` in row-major order
    pub fn enumerate(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let width = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / width, i % width, v))
    }

    /// Largest centered square
    ///
    /// The longer axis loses `(long - short) / 2` pixels at its start.
    pub fn center_crop(&self) -> Self {
        if self.width == self.height {
            return self.clone();
        }
        let side = self.width.min(self.height);
        let row_offset = (self.height - side) / 2;
        let col_offset = (self.width - side) / 2;
        let mut data = Vec::with_capacity(side * side);
        for row in row_offset..row_offset + side {
            let start = row * self.width + col_offset;
            data.extend_from_slice(&self.data[start..start + side]);
        }
        Self {
            width: side,
            height: side,
            data,
        }
    }

    /// Nearest-neighbour resample to `width x height`
    ///
    /// Each target pixel takes the source pixel under its center, so depth
    /// values and label ids are never blended.
    pub fn resize(&self, width: usize, height: usize) -> Result<Self, InputError> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        if width == 0 || height == 0 {
            return Ok(Self {
                width,
                height,
                data: Vec::new(),
            });
        }
        if self.is_empty() {
            return Err(InputError::EmptyResample { width, height });
        }

        let source_index = |target: usize, target_len: usize, source_len: usize| {
            let position = (target as f64 + 0.5) * source_len as f64 / target_len as f64;
            (position as usize).min(source_len - 1)
        };
        let columns: Vec<usize> = (0..width)
            .map(|col| source_index(col, width, self.width))
            .collect();

        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = source_index(row, height, self.height) * self.width;
            data.extend(columns.iter().map(|&col| self.data[start + col]));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

impl DepthMap {
    /// Whether a depth sample can be back-projected
    pub fn is_valid_depth(value: f32) -> bool {
        value.is_finite() && value > 0.0
    }

    /// Number of pixels carrying a valid depth
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| Self::is_valid_depth(v)).count()
    }
}

impl LabelMask {
    /// Positive entity ids present in the mask, ascending
    pub fn entity_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.data.iter().copied().filter(|&id| id > 0).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Camera calibration captured alongside the depth map
///
/// `intrinsic_matrix` is stored column by column, as the capture client
/// serializes it: `[0][0]` is the focal length and `[2][0]`, `[2][1]` the
/// optical center, all in pixels of the reference resolution
/// `intrinsic_matrix_reference_dimensions = [width, height]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub intrinsic_matrix: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    pub intrinsic_matrix_reference_dimensions: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_distortion_center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_distortion_lookup_table: Option<Vec<f64>>,
}

impl Calibration {
    /// Calibration without lens distortion data
    pub fn new(
        focal_length: f64,
        optical_center: (f64, f64),
        reference_dimensions: (f64, f64),
    ) -> Self {
        Self {
            intrinsic_matrix: Some([
                [focal_length, 0.0, 0.0],
                [0.0, focal_length, 0.0],
                [optical_center.0, optical_center.1, 1.0],
            ]),
            intrinsic_matrix_reference_dimensions: Some([
                reference_dimensions.0,
                reference_dimensions.1,
            ]),
            ..Self::default()
        }
    }

    /// Attach a radial distortion table around `center`
    pub fn with_lens_distortion(mut self, center: (f64, f64), lookup_table: Vec<f64>) -> Self {
        self.lens_distortion_center = Some([center.0, center.1]);
        self.lens_distortion_lookup_table = Some(lookup_table);
        self
    }

    pub fn focal_length(&self) -> Option<f64> {
        self.intrinsic_matrix.map(|m| m[0][0])
    }

    pub fn optical_center(&self) -> Option<(f64, f64)> {
        self.intrinsic_matrix.map(|m| (m[2][0], m[2][1]))
    }

    pub fn reference_dimensions(&self) -> Option<(f64, f64)> {
        self.intrinsic_matrix_reference_dimensions
            .map(|d| (d[0], d[1]))
    }
}
