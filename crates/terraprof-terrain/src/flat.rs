use terraprof_core::HeightProvider;

/// Constant elevation everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub elevation_m: f64,
}

impl FlatTerrain {
    pub fn new(elevation_m: f64) -> Self {
        Self { elevation_m }
    }
}

impl HeightProvider for FlatTerrain {
    async fn ground_height(&self, _lon: f64, _lat: f64) -> Option<f64> {
        Some(self.elevation_m)
    }
}
