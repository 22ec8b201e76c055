//! Latest committed profile and its display range.

use crate::classifier::classify_samples;
use crate::config::ProfileConfig;
use crate::models::{EventCause, Profile, ProfileEvent, ProfileRange};
use chrono::Utc;

/// Readiness of the profile before a collection marked it pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingProfile {
    ready: bool,
    is_warning_or_collision: bool,
}

/// Holds the profile that subscribers and accessors see.
///
/// The profile is only ever replaced as a whole by [`ProfileStore::commit`];
/// reclassification rewrites safety levels and nothing else.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profile: Profile,
    range: ProfileRange,
    warning_height_m: f64,
}

impl ProfileStore {
    pub fn new(warning_height_m: f64) -> Self {
        Self {
            profile: Profile::empty(),
            range: ProfileRange::default(),
            warning_height_m,
        }
    }

    pub fn set_range(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
        self.range = ProfileRange {
            min_x,
            max_x,
            min_y,
            max_y,
        };
    }

    pub fn range(&self) -> ProfileRange {
        self.range
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn is_ready(&self) -> bool {
        self.profile.ready
    }

    pub fn warning_height_m(&self) -> f64 {
        self.warning_height_m
    }

    pub fn set_warning_height_m(&mut self, warning_height_m: f64) {
        self.warning_height_m = warning_height_m;
    }

    /// Replace the profile and mark it ready.
    pub fn commit(&mut self, mut profile: Profile) {
        profile.ready = true;
        self.profile = profile;
    }

    /// A new collection started: the current profile is no longer authoritative.
    ///
    /// Returns the flags needed to [`resume`](Self::resume) the profile if
    /// the collection never commits.
    pub fn mark_pending(&mut self) -> PendingProfile {
        let previous = PendingProfile {
            ready: self.profile.ready,
            is_warning_or_collision: self.profile.is_warning_or_collision,
        };
        self.profile.ready = false;
        self.profile.is_warning_or_collision = false;
        previous
    }

    /// Undo [`mark_pending`](Self::mark_pending); the profile itself was never touched.
    pub fn resume(&mut self, previous: PendingProfile) {
        self.profile.ready = previous.ready;
        self.profile.is_warning_or_collision = previous.is_warning_or_collision;
    }

    /// Back to the empty single-point profile with default ranges.
    pub fn clear(&mut self) {
        self.profile = Profile::empty();
        self.range = ProfileRange::default();
    }

    /// Rerun classification with the current warning height.
    ///
    /// Returns `None` when there is no ready profile to reclassify.
    pub fn reclassify(&mut self, config: &ProfileConfig) -> Option<ProfileEvent> {
        if !self.profile.ready {
            return None;
        }
        self.profile.is_warning_or_collision = classify_samples(
            &mut self.profile.ground_samples,
            self.warning_height_m,
            config,
        );
        Some(self.event(EventCause::Reclassified))
    }

    /// Notification payload for the current profile.
    pub fn event(&self, cause: EventCause) -> ProfileEvent {
        ProfileEvent {
            cause,
            track_samples: self.profile.track_samples.clone(),
            ground_samples: self.profile.ground_samples.clone(),
            is_warning_or_collision: self.profile.is_warning_or_collision,
            published_at: Utc::now(),
        }
    }
}
