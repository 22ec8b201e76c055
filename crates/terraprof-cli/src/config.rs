//! CLI configuration from environment.

use std::env;
use terraprof_core::config::DEFAULT_WARNING_HEIGHT_M;
use terraprof_terrain::TerrainConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub terrain: TerrainConfig,
    pub warning_height_m: f64,
    pub query_timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = TerrainConfig::default();
        let terrain = TerrainConfig {
            provider_url: lookup("TERRAPROF_TERRAIN_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.provider_url),
            sample_spacing_m: lookup("TERRAPROF_TERRAIN_SPACING_M")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sample_spacing_m),
            max_grid_points: lookup("TERRAPROF_TERRAIN_MAX_POINTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_grid_points),
            request_timeout_s: lookup("TERRAPROF_TERRAIN_TIMEOUT_S")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_s),
            cache_ttl_s: lookup("TERRAPROF_TERRAIN_CACHE_TTL_S")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_ttl_s),
            ..defaults
        };

        Self {
            terrain,
            warning_height_m: lookup("TERRAPROF_WARNING_HEIGHT_M")
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(DEFAULT_WARNING_HEIGHT_M),
            query_timeout_ms: lookup("TERRAPROF_QUERY_TIMEOUT_MS").and_then(|s| s.parse().ok()),
        }
    }
}
