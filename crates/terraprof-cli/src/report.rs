//! JSON report of a collected profile.

use anyhow::{bail, Result};
use serde::Serialize;
use terraprof_core::{
    CollectOutcome, ElevationProfile, Ellipsoid, GroundSample, HeightProvider, ProfileConfig,
    ProfileRange, TrackSample, Waypoint,
};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub ready: bool,
    pub warning_height_m: f64,
    pub is_warning_or_collision: bool,
    pub range: ProfileRange,
    pub total_distance_m: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub unresolved: usize,
    pub track_samples: Vec<TrackSample>,
    pub ground_samples: Vec<GroundSample>,
}

impl ProfileReport {
    pub fn from_engine<H: HeightProvider>(engine: &ElevationProfile<H>) -> Self {
        let profile = engine.profile();
        Self {
            ready: profile.ready,
            warning_height_m: engine.warning_height_level(),
            is_warning_or_collision: profile.is_warning_or_collision,
            range: engine.range(),
            total_distance_m: profile.max_distance_m,
            min_elevation_m: profile.min_elevation_m,
            max_elevation_m: profile.max_elevation_m,
            unresolved: profile.ground_samples.iter().filter(|s| !s.resolved).count(),
            track_samples: profile.track_samples,
            ground_samples: profile.ground_samples,
        }
    }
}

/// Collect the profile of `waypoints` over `provider` on WGS-84.
pub async fn profile_track<H: HeightProvider>(
    provider: H,
    config: ProfileConfig,
    waypoints: &[Waypoint],
) -> Result<ProfileReport> {
    let engine = ElevationProfile::with_config(provider, Ellipsoid::WGS84, config)?;
    match engine.collect_profile(waypoints).await {
        CollectOutcome::Committed { ground_samples, .. } => {
            tracing::info!(
                waypoints = waypoints.len(),
                ground_samples,
                warning = engine.is_warning_or_collision(),
                "profile collected"
            );
        }
        CollectOutcome::Skipped(reason) => bail!("track cannot be profiled: {reason:?}"),
        CollectOutcome::Superseded { generation } => {
            bail!("profile request {generation} was superseded")
        }
    }
    Ok(ProfileReport::from_engine(&engine))
}
