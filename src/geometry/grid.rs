// SPDX-License-Identifier: GPL-3.0-only

//! Sparse spatial grid on the plane's horizontal axes
//!
//! Cells are anchored at the cloud's own minimum x/y, so two entities never
//! share a grid origin.

use super::projection::Point3D;
use std::collections::HashMap;

/// Integer cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

/// Points of one cloud binned into square cells of edge `cell_len`
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_len: f64,
    /// Minimum x/y of the indexed cloud
    origin: (f64, f64),
    cells: HashMap<Cell, Vec<Point3D>>,
}

impl GridIndex {
    /// Bin every point at `floor((x - min_x) / cell_len), floor((y - min_y) / cell_len)`
    ///
    /// No smoothing or interpolation: each cell keeps the raw samples.
    pub fn build(points: &[Point3D], cell_len: f64) -> Self {
        let origin = points
            .iter()
            .fold((f64::INFINITY, f64::INFINITY), |(min_x, min_y), p| {
                (min_x.min(p.x), min_y.min(p.y))
            });

        let mut cells: HashMap<Cell, Vec<Point3D>> = HashMap::new();
        for p in points {
            let cell = Cell {
                x: ((p.x - origin.0) / cell_len).floor() as i64,
                y: ((p.y - origin.1) / cell_len).floor() as i64,
            };
            cells.entry(cell).or_default().push(*p);
        }

        Self {
            cell_len,
            origin,
            cells,
        }
    }

    pub fn cell_len(&self) -> f64 {
        self.cell_len
    }

    /// Minimum x/y of the indexed cloud; infinite for an empty cloud
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of indexed points
    pub fn point_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Points in `cell`, if occupied
    pub fn get(&self, cell: &Cell) -> Option<&[Point3D]> {
        self.cells.get(cell).map(Vec::as_slice)
    }

    /// Occupied cells in ascending `(x, y)` order
    ///
    /// Summing in this order keeps floating-point totals reproducible.
    pub fn sorted_cells(&self) -> Vec<(Cell, &[Point3D])> {
        let mut cells: Vec<(Cell, &[Point3D])> = self
            .cells
            .iter()
            .map(|(cell, points)| (*cell, points.as_slice()))
            .collect();
        cells.sort_unstable_by_key(|(cell, _)| *cell);
        cells
    }
}
