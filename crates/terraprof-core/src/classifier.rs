//! Clearance classification of ground samples.

use crate::config::ProfileConfig;
use crate::models::{GroundSample, SafetyLevel};

/// Classify one sample.
///
/// The warning band is checked first and a collision overrides it, so a
/// clearance inside both bands is always reported as a collision.
pub fn classify(
    track_height_m: f64,
    ground_elevation_m: f64,
    warning_height_m: f64,
    config: &ProfileConfig,
) -> SafetyLevel {
    let clearance = track_height_m - ground_elevation_m;

    let mut level = SafetyLevel::Safe;
    if clearance >= 0.0 && clearance < warning_height_m - config.height_eps_m {
        level = SafetyLevel::Warning;
    }
    if clearance <= config.ground_offset_m {
        level = SafetyLevel::Collision;
    }
    level
}

/// Reclassify every sample in place and return whether any is not safe.
///
/// Unresolved samples carry no real ground elevation and stay safe.
pub fn classify_samples(
    samples: &mut [GroundSample],
    warning_height_m: f64,
    config: &ProfileConfig,
) -> bool {
    let mut flagged = false;
    for sample in samples.iter_mut() {
        sample.safety_level = if sample.resolved {
            classify(
                sample.track_height_m,
                sample.ground_elevation_m,
                warning_height_m,
                config,
            )
        } else {
            SafetyLevel::Safe
        };
        flagged |= sample.safety_level != SafetyLevel::Safe;
    }
    flagged
}
