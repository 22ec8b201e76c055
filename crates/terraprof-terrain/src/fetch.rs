//! Terrain grid fetching from an Open-Meteo style elevation API.
//!
//! The grid covers the padded bounding box of a track. Grids are cached by
//! bounds and spacing; a cached grid younger than twice the TTL is served
//! when the provider fails.

use crate::error::TerrainError;
use crate::grid::{TerrainBounds, TerrainGrid};
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use terraprof_core::Waypoint;

const METERS_PER_DEG_LAT: f64 = 111_320.0;
const MIN_SPACING_M: f64 = 5.0;
const MAX_SPACING_M: f64 = 2000.0;
const MAX_LON_SPAN_DEG: f64 = 180.0;

/// Settings for remote terrain grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub provider_url: String,
    /// Desired spacing between grid samples in meters
    pub sample_spacing_m: f64,
    /// Upper bound on grid size; spacing grows to stay under it
    pub max_grid_points: usize,
    pub max_points_per_request: usize,
    pub request_timeout_s: u64,
    pub cache_ttl_s: u64,
    /// Bounding box padding as a fraction of the track extent
    pub pad_ratio: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            provider_url: "https://api.open-meteo.com/v1/elevation".to_string(),
            sample_spacing_m: 30.0,
            max_grid_points: 10_000,
            max_points_per_request: 100,
            request_timeout_s: 10,
            cache_ttl_s: 3600,
            pad_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
struct TerrainCacheEntry {
    fetched_at: Instant,
    grid: TerrainGrid,
}

fn terrain_cache() -> &'static DashMap<String, TerrainCacheEntry> {
    static CACHE: OnceLock<DashMap<String, TerrainCacheEntry>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<f64>>,
}

/// Fetch a terrain grid covering `waypoints`.
///
/// Returns `Ok(None)` when the track has no finite coordinates, and
/// [`TerrainError::LongitudeSpan`] when its longitudes span more than half
/// the globe, which is how an antimeridian crossing shows up in [-180, 180].
pub async fn fetch_terrain_grid(
    client: &Client,
    config: &TerrainConfig,
    waypoints: &[Waypoint],
) -> Result<Option<TerrainGrid>, TerrainError> {
    if config.provider_url.trim().is_empty() {
        return Err(TerrainError::EmptyUrl);
    }
    if config.max_grid_points == 0 {
        return Err(TerrainError::ZeroGridPoints);
    }

    let bounds = match bounds_from_waypoints(waypoints) {
        Some(bounds) => bounds,
        None => return Ok(None),
    };
    let span_deg = bounds.max_lon - bounds.min_lon;
    if span_deg > MAX_LON_SPAN_DEG {
        return Err(TerrainError::LongitudeSpan { span_deg });
    }
    let bounds = expand_bounds(&bounds, config.pad_ratio);
    let spacing_m = config.sample_spacing_m.max(MIN_SPACING_M);
    let cache_key = terrain_cache_key(&bounds, spacing_m);
    let cache_ttl = Duration::from_secs(config.cache_ttl_s.max(30));
    let cache = terrain_cache();
    let mut stale_cache: Option<TerrainGrid> = None;
    if let Some(entry) = cache.get(&cache_key) {
        let age = entry.fetched_at.elapsed();
        if age <= cache_ttl {
            tracing::debug!(key = %cache_key, "terrain cache hit");
            return Ok(Some(entry.grid.clone()));
        }
        if age <= cache_ttl.saturating_mul(2) {
            stale_cache = Some(entry.grid.clone());
        }
    }

    let mean_lat = ((bounds.min_lat + bounds.max_lat) / 2.0).to_radians();
    let meters_per_deg_lon = METERS_PER_DEG_LAT * mean_lat.cos().max(0.01);
    let (rows, cols, lat_step_deg, lon_step_deg) = resolve_grid_dims(
        &bounds,
        spacing_m,
        METERS_PER_DEG_LAT,
        meters_per_deg_lon,
        config.max_grid_points,
    );

    let total = rows.saturating_mul(cols);
    let mut latitudes = Vec::with_capacity(total);
    let mut longitudes = Vec::with_capacity(total);
    for row in 0..rows {
        let lat = bounds.min_lat + row as f64 * lat_step_deg;
        for col in 0..cols {
            let lon = bounds.min_lon + col as f64 * lon_step_deg;
            latitudes.push(lat);
            longitudes.push(lon);
        }
    }

    let max_points = config.max_points_per_request.max(1);
    let timeout = Duration::from_secs(config.request_timeout_s.max(3));
    let mut elevations = vec![f64::NAN; total];

    let mut start = 0usize;
    while start < total {
        let end = (start + max_points).min(total);
        let chunk = match fetch_chunk(
            client,
            &config.provider_url,
            &latitudes[start..end],
            &longitudes[start..end],
            timeout,
        )
        .await
        {
            Ok(chunk) => chunk,
            Err(err) => {
                if let Some(stale) = stale_cache {
                    tracing::warn!("Terrain fetch failed, using stale cache: {}", err);
                    return Ok(Some(stale));
                }
                return Err(err);
            }
        };

        for (idx, value) in chunk.into_iter().enumerate() {
            // Non-finite values stay NaN and sample as "no value".
            if value.is_finite() {
                elevations[start + idx] = value;
            }
        }
        start = end;
    }

    tracing::debug!(rows, cols, spacing_m, "terrain grid fetched");

    // The last row/column may extend past the padded bounds.
    let covered = TerrainBounds {
        max_lat: bounds.min_lat + (rows - 1) as f64 * lat_step_deg,
        max_lon: bounds.min_lon + (cols - 1) as f64 * lon_step_deg,
        ..bounds
    };
    let grid = TerrainGrid::from_steps(covered, lat_step_deg, lon_step_deg, rows, cols, elevations);

    cache.insert(
        cache_key,
        TerrainCacheEntry {
            fetched_at: Instant::now(),
            grid: grid.clone(),
        },
    );

    Ok(Some(grid))
}

async fn fetch_chunk(
    client: &Client,
    base_url: &str,
    latitudes: &[f64],
    longitudes: &[f64],
    timeout: Duration,
) -> Result<Vec<f64>, TerrainError> {
    let url = build_provider_url(base_url, &join_params(latitudes), &join_params(longitudes));
    let response = client.get(url).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(TerrainError::Status(response.status()));
    }

    let payload: OpenMeteoElevationResponse = response.json().await?;
    let chunk = payload.elevation.ok_or(TerrainError::MissingElevation)?;
    if chunk.len() != latitudes.len() {
        return Err(TerrainError::SampleCount {
            expected: latitudes.len(),
            actual: chunk.len(),
        });
    }
    Ok(chunk)
}

pub(crate) fn bounds_from_waypoints(waypoints: &[Waypoint]) -> Option<TerrainBounds> {
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    for wp in waypoints {
        if !wp.lat.is_finite() || !wp.lon.is_finite() {
            continue;
        }
        min_lat = min_lat.min(wp.lat);
        max_lat = max_lat.max(wp.lat);
        min_lon = min_lon.min(wp.lon);
        max_lon = max_lon.max(wp.lon);
    }
    if !min_lat.is_finite() || !min_lon.is_finite() {
        return None;
    }
    Some(TerrainBounds {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    })
}

pub(crate) fn expand_bounds(bounds: &TerrainBounds, pad_ratio: f64) -> TerrainBounds {
    let lat_span = bounds.max_lat - bounds.min_lat;
    let lon_span = bounds.max_lon - bounds.min_lon;
    let pad_lat = (lat_span * pad_ratio).max(0.0015);
    let pad_lon = (lon_span * pad_ratio).max(0.0015);
    TerrainBounds {
        min_lat: (bounds.min_lat - pad_lat).max(-90.0),
        max_lat: (bounds.max_lat + pad_lat).min(90.0),
        min_lon: (bounds.min_lon - pad_lon).max(-180.0),
        max_lon: (bounds.max_lon + pad_lon).min(180.0),
    }
}

/// Grid rows, columns and steps for `bounds`, coarsening the spacing until
/// the grid fits in `max_points`.
pub(crate) fn resolve_grid_dims(
    bounds: &TerrainBounds,
    spacing_m: f64,
    meters_per_deg_lat: f64,
    meters_per_deg_lon: f64,
    max_points: usize,
) -> (usize, usize, f64, f64) {
    let mut spacing = spacing_m.max(MIN_SPACING_M);
    let max_points = max_points.max(4);

    loop {
        let lat_step_deg = spacing / meters_per_deg_lat;
        let lon_step_deg = spacing / meters_per_deg_lon;
        let rows = ((bounds.max_lat - bounds.min_lat) / lat_step_deg).ceil().max(1.0) as usize + 1;
        let cols = ((bounds.max_lon - bounds.min_lon) / lon_step_deg).ceil().max(1.0) as usize + 1;
        let total = rows.saturating_mul(cols);
        if total <= max_points {
            return (rows, cols, lat_step_deg, lon_step_deg);
        }

        let scale = ((total as f64) / (max_points as f64)).sqrt().max(1.1);
        spacing *= scale;
        if spacing > MAX_SPACING_M {
            return (rows, cols, lat_step_deg, lon_step_deg);
        }
    }
}

fn join_params(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| format!("{:.6}", value))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_provider_url(base: &str, latitudes: &str, longitudes: &str) -> String {
    let separator = if base.contains('?') { "&" } else { "?" };
    format!(
        "{}{}latitude={}&longitude={}",
        base, separator, latitudes, longitudes
    )
}

fn terrain_cache_key(bounds: &TerrainBounds, spacing_m: f64) -> String {
    format!(
        "terrain:{:.4}:{:.4}:{:.4}:{:.4}:{:.1}",
        bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon, spacing_m
    )
}
