//! Profile sampling and clearance thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Distance between ground query points (meters)
pub const SEGMENT_LENGTH_M: f64 = 1.0;
/// Clearance at or below which a sample counts as a collision (meters)
pub const GROUND_OFFSET_M: f64 = 1.0;
/// Tolerance subtracted from the warning height (meters)
pub const HEIGHT_EPS_M: f64 = 0.1;
/// Range padding below the lowest elevation, as a fraction of |min|
pub const BOTTOM_PADDING: f64 = 0.1;
/// Range padding above the highest elevation, as a fraction of |max|
pub const TOP_PADDING: f64 = 0.1;
/// Default warning clearance (meters)
pub const DEFAULT_WARNING_HEIGHT_M: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("event_capacity must be > 0")]
    ZeroEventCapacity,
}

/// Configuration for profile collection and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Spacing of ground samples along the track in meters
    pub segment_length_m: f64,
    /// Collision clearance in meters
    pub ground_offset_m: f64,
    /// Warning threshold tolerance in meters
    pub height_eps_m: f64,
    /// Range padding fractions
    pub bottom_padding: f64,
    pub top_padding: f64,
    /// Initial warning clearance in meters
    pub warning_height_m: f64,
    /// Per-query timeout; an expired query counts as unresolved
    pub query_timeout_ms: Option<u64>,
    /// Buffered notifications per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            segment_length_m: SEGMENT_LENGTH_M,
            ground_offset_m: GROUND_OFFSET_M,
            height_eps_m: HEIGHT_EPS_M,
            bottom_padding: BOTTOM_PADDING,
            top_padding: TOP_PADDING,
            warning_height_m: DEFAULT_WARNING_HEIGHT_M,
            query_timeout_ms: None,
            event_capacity: 16,
        }
    }
}

impl ProfileConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.segment_length_m.is_finite() && self.segment_length_m > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "segment_length_m",
                value: self.segment_length_m,
            });
        }
        for (field, value) in [
            ("ground_offset_m", self.ground_offset_m),
            ("height_eps_m", self.height_eps_m),
            ("bottom_padding", self.bottom_padding),
            ("top_padding", self.top_padding),
            ("warning_height_m", self.warning_height_m),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}
