// SPDX-License-Identifier: GPL-3.0-only

//! Area and volume integration over a grid index

use crate::config::EstimationConfig;
use crate::constants::NegativeHeightPolicy;
use crate::errors::EmptyEntityError;
use crate::geometry::{GridIndex, Point3D};
use serde::Serialize;
use tracing::debug;

/// Top-surface area (m²) and volume (m³) of one entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AreaVolume {
    pub entity_id: u32,
    pub area: f64,
    pub volume: f64,
}

impl AreaVolume {
    /// Zero result for an entity without usable points
    pub fn empty(entity_id: u32) -> Self {
        Self {
            entity_id,
            ..Self::default()
        }
    }

    /// `(area, volume)` pair
    pub fn pair(&self) -> (f64, f64) {
        (self.area, self.volume)
    }
}

/// Integrate a grid of plane-aligned points against the background depth
///
/// `area = cells * g²`; `volume = sum(max(mean(background - z), 0) * g²)`.
/// Cells are visited in ascending order so the sum is reproducible.
pub fn integrate(grid: &GridIndex, background_depth: f64) -> (f64, f64) {
    let cell_area = grid.cell_len() * grid.cell_len();
    let mut volume = 0.0;
    let mut clamped = 0usize;

    for (_, points) in grid.sorted_cells() {
        let mean_height =
            points.iter().map(|p| background_depth - p.z).sum::<f64>() / points.len() as f64;
        if mean_height < 0.0 {
            clamped += 1;
            continue;
        }
        volume += mean_height * cell_area;
    }

    if clamped > 0 {
        debug!(clamped, cells = grid.cell_count(), "Cells above the reference plane");
    }

    (grid.cell_count() as f64 * cell_area, volume)
}

/// Area and volume of one entity's plane-aligned cloud
///
/// Under [`NegativeHeightPolicy::DropPoints`] samples at or above the
/// reference plane are removed before gridding. An entity left without
/// points is reported as [`EmptyEntityError`].
pub fn integrate_entity(
    entity_id: u32,
    cloud: &[Point3D],
    background_depth: f64,
    config: &EstimationConfig,
) -> Result<AreaVolume, EmptyEntityError> {
    let filtered: Vec<Point3D>;
    let points: &[Point3D] = match config.negative_height_policy {
        NegativeHeightPolicy::ClampCell => cloud,
        NegativeHeightPolicy::DropPoints => {
            filtered = cloud
                .iter()
                .filter(|p| background_depth - p.z > 0.0)
                .copied()
                .collect();
            filtered.as_slice()
        }
    };

    if points.is_empty() {
        return Err(EmptyEntityError { entity_id });
    }

    let grid = GridIndex::build(points, config.grid_len);
    let (area, volume) = integrate(&grid, background_depth);

    debug!(
        entity_id,
        points = points.len(),
        cells = grid.cell_count(),
        area,
        volume,
        "Integrated entity"
    );

    Ok(AreaVolume {
        entity_id,
        area,
        volume,
    })
}
