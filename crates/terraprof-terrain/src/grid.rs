//! Regular lat/lon elevation grid.

use crate::error::TerrainError;
use terraprof_core::HeightProvider;

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl TerrainBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Elevations sampled on a regular grid, row-major from the south-west corner.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    bounds: TerrainBounds,
    lat_step_deg: f64,
    lon_step_deg: f64,
    rows: usize,
    cols: usize,
    elevations_m: Vec<f64>,
}

impl TerrainGrid {
    /// Build a grid whose `rows x cols` samples span `bounds` edge to edge.
    pub fn new(
        bounds: TerrainBounds,
        rows: usize,
        cols: usize,
        elevations_m: Vec<f64>,
    ) -> Result<Self, TerrainError> {
        if rows < 2 || cols < 2 {
            return Err(TerrainError::GridTooSmall { rows, cols });
        }
        let expected = rows * cols;
        if elevations_m.len() != expected {
            return Err(TerrainError::GridSize {
                expected,
                actual: elevations_m.len(),
            });
        }
        Ok(Self {
            bounds,
            lat_step_deg: (bounds.max_lat - bounds.min_lat) / (rows - 1) as f64,
            lon_step_deg: (bounds.max_lon - bounds.min_lon) / (cols - 1) as f64,
            rows,
            cols,
            elevations_m,
        })
    }

    pub(crate) fn from_steps(
        bounds: TerrainBounds,
        lat_step_deg: f64,
        lon_step_deg: f64,
        rows: usize,
        cols: usize,
        elevations_m: Vec<f64>,
    ) -> Self {
        Self {
            bounds,
            lat_step_deg,
            lon_step_deg,
            rows,
            cols,
            elevations_m,
        }
    }

    pub fn bounds(&self) -> TerrainBounds {
        self.bounds
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Bilinear elevation at a position, or `None` outside the grid.
    pub fn sample(&self, lat: f64, lon: f64) -> Option<f64> {
        if !lat.is_finite() || !lon.is_finite() || !self.bounds.contains(lat, lon) {
            return None;
        }

        let lat_step = self.lat_step_deg.max(1e-9);
        let lon_step = self.lon_step_deg.max(1e-9);

        let max_y = (self.rows - 1) as f64;
        let max_x = (self.cols - 1) as f64;
        let y = ((lat - self.bounds.min_lat) / lat_step).clamp(0.0, max_y);
        let x = ((lon - self.bounds.min_lon) / lon_step).clamp(0.0, max_x);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(self.rows - 1);
        let x1 = (x0 + 1).min(self.cols - 1);
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let v00 = self.value_at(y0, x0)?;
        let v10 = self.value_at(y0, x1)?;
        let v01 = self.value_at(y1, x0)?;
        let v11 = self.value_at(y1, x1)?;

        let v0 = v00 + (v10 - v00) * dx;
        let v1 = v01 + (v11 - v01) * dx;
        Some(v0 + (v1 - v0) * dy)
    }

    fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        let idx = row.saturating_mul(self.cols) + col.min(self.cols - 1);
        self.elevations_m.get(idx).copied().filter(|v| v.is_finite())
    }
}

impl HeightProvider for TerrainGrid {
    async fn ground_height(&self, lon: f64, lat: f64) -> Option<f64> {
        self.sample(lat, lon)
    }
}
