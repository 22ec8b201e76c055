//! terraprof core: terrain-following elevation profiles.
//!
//! Samples the ground beneath a track of geographic waypoints at fixed
//! spacing, queries terrain heights asynchronously, classifies clearance
//! and publishes the result.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod models;
pub mod provider;
pub mod sampler;
pub mod store;

pub use config::{ConfigError, ProfileConfig};
pub use engine::{CollectOutcome, ElevationProfile, SkipReason};
pub use geometry::{Ellipsoid, Vec3};
pub use models::{
    EventCause, GroundSample, Profile, ProfileEvent, ProfileRange, SafetyLevel, TrackSample,
    Waypoint,
};
pub use provider::HeightProvider;
