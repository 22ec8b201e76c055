//! Core data models for elevation profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic track point. Heights are meters above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(alias = "longitude")]
    pub lon: f64,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(default, alias = "height", alias = "altitude_m")]
    pub height_m: f64,
}

impl Waypoint {
    pub fn new(lon: f64, lat: f64, height_m: f64) -> Self {
        Self { lon, lat, height_m }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.height_m.is_finite()
    }
}

/// Track height at a waypoint, keyed by along-track distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub distance_m: f64,
    pub elevation_m: f64,
}

/// Clearance classification of a ground sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    #[default]
    Safe,
    /// Track is above ground but closer than the warning height
    Warning,
    /// Track is at or below the ground offset
    Collision,
}

/// Terrain elevation beneath the track at one along-track distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSample {
    pub distance_m: f64,
    pub ground_elevation_m: f64,
    pub safety_level: SafetyLevel,
    /// Height of the track directly above this sample
    pub track_height_m: f64,
    /// False when the height query produced no value; `ground_elevation_m`
    /// is then a placeholder and must not be trusted.
    pub resolved: bool,
}

impl GroundSample {
    /// Slot reserved before its height query completes.
    pub fn placeholder(distance_m: f64, track_height_m: f64) -> Self {
        Self {
            distance_m,
            ground_elevation_m: 0.0,
            safety_level: SafetyLevel::Safe,
            track_height_m,
            resolved: false,
        }
    }

    pub fn clearance_m(&self) -> f64 {
        self.track_height_m - self.ground_elevation_m
    }
}

/// Display bounds of a profile: x is distance, y is elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileRange {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for ProfileRange {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1000.0,
            min_y: 0.0,
            max_y: 200.0,
        }
    }
}

/// A complete elevation profile of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub min_distance_m: f64,
    pub max_distance_m: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub track_samples: Vec<TrackSample>,
    pub ground_samples: Vec<GroundSample>,
    pub is_warning_or_collision: bool,
    pub ready: bool,
}

impl Profile {
    /// Single-point placeholder profile held while nothing is collected.
    pub fn empty() -> Self {
        Self {
            min_distance_m: 0.0,
            max_distance_m: 0.0,
            min_elevation_m: 0.0,
            max_elevation_m: 0.0,
            track_samples: vec![TrackSample {
                distance_m: 0.0,
                elevation_m: 0.0,
            }],
            ground_samples: vec![GroundSample::placeholder(0.0, 0.0)],
            is_warning_or_collision: false,
            ready: false,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::empty()
    }
}

/// Why a profile notification was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCause {
    /// A full collection finished and was committed
    Collected,
    /// Only the warning threshold changed
    Reclassified,
}

/// "Profile collected" notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEvent {
    pub cause: EventCause,
    pub track_samples: Vec<TrackSample>,
    pub ground_samples: Vec<GroundSample>,
    pub is_warning_or_collision: bool,
    pub published_at: DateTime<Utc>,
}
