//! Track files: a JSON array of waypoints, or an object with a `waypoints` array.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use terraprof_core::Waypoint;

#[derive(Deserialize)]
#[serde(untagged)]
enum TrackFile {
    Bare(Vec<Waypoint>),
    Wrapped { waypoints: Vec<Waypoint> },
}

pub fn parse_track(json: &str) -> Result<Vec<Waypoint>> {
    let track: TrackFile = serde_json::from_str(json).context("track is not a waypoint list")?;
    Ok(match track {
        TrackFile::Bare(waypoints) | TrackFile::Wrapped { waypoints } => waypoints,
    })
}

pub fn load_track(path: &Path) -> Result<Vec<Waypoint>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read track {}", path.display()))?;
    parse_track(&json).with_context(|| format!("failed to parse track {}", path.display()))
}
