//! Elevation profile engine.
//!
//! Ties the sampler, aggregator, classifier and store together behind the
//! operations a caller uses: collect a profile for a track, change the
//! warning height, clear, and read the result.

use crate::aggregator::{aggregate, Aggregation};
use crate::classifier::classify_samples;
use crate::config::{ConfigError, ProfileConfig};
use crate::geometry::Ellipsoid;
use crate::models::{EventCause, Profile, ProfileEvent, ProfileRange, Waypoint};
use crate::provider::HeightProvider;
use crate::sampler::plan_track;
use crate::store::{PendingProfile, ProfileStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Why a collection did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewWaypoints,
    NonFiniteWaypoint,
}

/// Result of one `collect_profile` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Profile was published
    Committed { generation: u64, ground_samples: usize },
    /// A newer collection (or a clear) started first; result dropped
    Superseded { generation: u64 },
    /// Input was rejected; nothing changed
    Skipped(SkipReason),
}

struct Shared<H> {
    provider: H,
    ellipsoid: Ellipsoid,
    config: ProfileConfig,
    generation: AtomicU64,
    store: Mutex<ProfileStore>,
    events: broadcast::Sender<ProfileEvent>,
}

/// Puts the store back to its previous readiness when a collection is
/// dropped between `mark_pending` and commit.
struct PendingGuard<'a, H> {
    shared: &'a Shared<H>,
    generation: u64,
    previous: Option<PendingProfile>,
}

impl<H> PendingGuard<'_, H> {
    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl<H> Drop for PendingGuard<'_, H> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        let mut store = self
            .shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A newer collection or a clear owns the store now.
        if self.shared.generation.load(Ordering::SeqCst) == self.generation {
            store.resume(previous);
            tracing::debug!(generation = self.generation, "profile collection abandoned");
        }
    }
}

/// Terrain-following elevation profile of a track.
///
/// Cloning is cheap; clones share the same store, generation counter and
/// notification channel.
pub struct ElevationProfile<H> {
    shared: Arc<Shared<H>>,
}

impl<H> Clone for ElevationProfile<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: HeightProvider> ElevationProfile<H> {
    /// Engine on WGS-84 with default thresholds.
    pub fn new(provider: H) -> Self {
        Self::build(provider, Ellipsoid::WGS84, ProfileConfig::default())
    }

    pub fn with_config(
        provider: H,
        ellipsoid: Ellipsoid,
        config: ProfileConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(provider, ellipsoid, config))
    }

    fn build(provider: H, ellipsoid: Ellipsoid, config: ProfileConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                provider,
                ellipsoid,
                store: Mutex::new(ProfileStore::new(config.warning_height_m)),
                config,
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    fn store(&self) -> MutexGuard<'_, ProfileStore> {
        self.shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sample, query, classify and publish the profile of `waypoints`.
    ///
    /// Only the most recently started collection may publish; an older one
    /// still running when a newer one starts resolves as
    /// [`CollectOutcome::Superseded`].
    ///
    /// Dropping the returned future before it completes abandons the
    /// collection: the previous profile becomes ready again unless a newer
    /// collection or a `clear` has started since. Use
    /// [`spawn_collect`](Self::spawn_collect) to keep a collection running
    /// independently of the caller.
    pub async fn collect_profile(&self, waypoints: &[Waypoint]) -> CollectOutcome {
        if waypoints.len() < 2 {
            tracing::debug!(count = waypoints.len(), "profile needs at least two waypoints");
            return CollectOutcome::Skipped(SkipReason::TooFewWaypoints);
        }
        if waypoints.iter().any(|wp| !wp.is_finite()) {
            tracing::warn!("profile track contains non-finite coordinates");
            return CollectOutcome::Skipped(SkipReason::NonFiniteWaypoint);
        }

        let shared = &*self.shared;
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.store().mark_pending();
        let mut pending = PendingGuard {
            shared,
            generation,
            previous: Some(previous),
        };

        let started = Instant::now();
        let plan = plan_track(&shared.ellipsoid, waypoints, shared.config.segment_length_m);
        let queries = plan.points.len();

        let raw = match aggregate(
            &shared.provider,
            plan,
            generation,
            &shared.generation,
            shared.config.query_timeout(),
        )
        .await
        {
            Aggregation::Complete(raw) => raw,
            Aggregation::Superseded => return CollectOutcome::Superseded { generation },
        };

        let mut store = self.store();
        if shared.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "profile superseded before commit");
            return CollectOutcome::Superseded { generation };
        }

        let mut ground_samples = raw.ground_samples;
        let flagged = classify_samples(
            &mut ground_samples,
            store.warning_height_m(),
            &shared.config,
        );
        let ground_count = ground_samples.len();

        let (min_y, max_y) = (raw.min_elevation_m, raw.max_elevation_m);
        store.set_range(
            0.0,
            raw.total_distance_m,
            min_y - shared.config.bottom_padding * min_y.abs(),
            max_y + shared.config.top_padding * max_y.abs(),
        );
        store.commit(Profile {
            min_distance_m: 0.0,
            max_distance_m: raw.total_distance_m,
            min_elevation_m: min_y,
            max_elevation_m: max_y,
            track_samples: raw.track_samples,
            ground_samples,
            is_warning_or_collision: flagged,
            ready: true,
        });
        pending.disarm();

        tracing::debug!(
            generation,
            queries,
            unresolved = raw.unresolved,
            distance_m = raw.total_distance_m,
            flagged,
            elapsed = ?started.elapsed(),
            "profile collected"
        );

        // Published under the lock so notifications follow commit order.
        let _ = shared.events.send(store.event(EventCause::Collected));

        CollectOutcome::Committed {
            generation,
            ground_samples: ground_count,
        }
    }

    /// Run [`collect_profile`](Self::collect_profile) on a background task.
    pub fn spawn_collect(&self, waypoints: Vec<Waypoint>) -> JoinHandle<CollectOutcome>
    where
        H: 'static,
    {
        let engine = self.clone();
        tokio::spawn(async move { engine.collect_profile(&waypoints).await })
    }

    /// Change the warning clearance and reclassify the ready profile.
    ///
    /// Distances, elevations and the range stay untouched.
    pub fn set_warning_height_level(&self, warning_height_m: f64) {
        if !warning_height_m.is_finite() {
            tracing::warn!(warning_height_m, "ignoring non-finite warning height");
            return;
        }
        let mut store = self.store();
        store.set_warning_height_m(warning_height_m);
        if let Some(event) = store.reclassify(&self.shared.config) {
            let _ = self.shared.events.send(event);
        }
    }

    /// Drop the profile and invalidate any collection still in flight.
    pub fn clear(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.store().clear();
    }

    /// Subscribe to profile notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.shared.events.subscribe()
    }

    /// Snapshot of the current profile.
    pub fn profile(&self) -> Profile {
        self.store().profile().clone()
    }

    pub fn range(&self) -> ProfileRange {
        self.store().range()
    }

    pub fn set_range(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
        self.store().set_range(min_x, max_x, min_y, max_y);
    }

    pub fn min_x(&self) -> f64 {
        self.range().min_x
    }

    pub fn max_x(&self) -> f64 {
        self.range().max_x
    }

    pub fn min_y(&self) -> f64 {
        self.range().min_y
    }

    pub fn max_y(&self) -> f64 {
        self.range().max_y
    }

    pub fn points_ready(&self) -> bool {
        self.store().is_ready()
    }

    pub fn is_warning_or_collision(&self) -> bool {
        self.store().profile().is_warning_or_collision
    }

    pub fn warning_height_level(&self) -> f64 {
        self.store().warning_height_m()
    }

    /// Latest issued generation.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.shared.config
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.shared.ellipsoid
    }
}
