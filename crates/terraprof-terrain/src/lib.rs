//! Ground height providers for terraprof.
//!
//! - `TerrainGrid`: bilinear sampling of a regular elevation grid
//! - `fetch_terrain_grid`: grid download for a track, cached per bounds
//! - `DatumCorrected`: geoid correction of MSL terrain heights
//! - `FlatTerrain`: constant elevation, for offline runs

pub mod datum;
pub mod error;
pub mod fetch;
pub mod flat;
pub mod grid;

pub use datum::{height_to_ellipsoid, ConstantGeoid, DatumCorrected, GeoidModel, VerticalDatum};
pub use error::TerrainError;
pub use fetch::{fetch_terrain_grid, TerrainConfig};
pub use flat::FlatTerrain;
pub use grid::{TerrainBounds, TerrainGrid};
