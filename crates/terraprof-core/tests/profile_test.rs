//! Elevation profile collection tests against scripted terrain.
//!
//! Run with: cargo test -p terraprof-core --test profile_test

use std::future::Future;
use terraprof_core::geometry::WGS84_A;
use terraprof_core::{
    CollectOutcome, ElevationProfile, Ellipsoid, EventCause, HeightProvider, ProfileConfig,
    ProfileRange, SafetyLevel, SkipReason, Waypoint,
};
use tokio::sync::{broadcast::error::TryRecvError, watch};

/// Longitude (degrees) `meters` east of `lon0` along the equator.
fn east_of(lon0: f64, meters: f64) -> f64 {
    lon0 + (meters / WGS84_A).to_degrees()
}

fn straight_track(lon0: f64, length_m: f64, height_m: f64) -> Vec<Waypoint> {
    vec![
        Waypoint::new(lon0, 0.0, height_m),
        Waypoint::new(east_of(lon0, length_m), 0.0, height_m),
    ]
}

struct FlatGround {
    elevation_m: f64,
}

impl HeightProvider for FlatGround {
    async fn ground_height(&self, _lon: f64, _lat: f64) -> Option<f64> {
        Some(self.elevation_m)
    }
}

/// Ground that rises 1 m per meter east of the origin.
struct Ramp;

impl HeightProvider for Ramp {
    async fn ground_height(&self, lon: f64, _lat: f64) -> Option<f64> {
        Some(lon.to_radians() * WGS84_A)
    }
}

/// Flat ground that has no data east of `limit_lon`.
struct PatchyGround {
    elevation_m: f64,
    limit_lon: f64,
}

impl HeightProvider for PatchyGround {
    async fn ground_height(&self, lon: f64, _lat: f64) -> Option<f64> {
        (lon <= self.limit_lon).then_some(self.elevation_m)
    }
}

/// Queries west of the prime meridian wait for `west`, the rest for `east`.
struct GatedGround {
    west: watch::Receiver<bool>,
    east: watch::Receiver<bool>,
    elevation_m: f64,
}

impl HeightProvider for GatedGround {
    fn ground_height(&self, lon: f64, _lat: f64) -> impl Future<Output = Option<f64>> + Send {
        let mut gate = if lon < 0.0 {
            self.west.clone()
        } else {
            self.east.clone()
        };
        let elevation_m = self.elevation_m;
        async move {
            let opened = gate.wait_for(|open| *open).await.is_ok();
            opened.then_some(elevation_m)
        }
    }
}

/// Never answers for points east of the origin.
struct HangingGround;

impl HeightProvider for HangingGround {
    async fn ground_height(&self, lon: f64, _lat: f64) -> Option<f64> {
        if lon > 0.0 {
            std::future::pending::<()>().await;
        }
        Some(0.0)
    }
}

async fn wait_for_generation<H: HeightProvider>(engine: &ElevationProfile<H>, generation: u64) {
    while engine.generation() < generation {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn ten_meter_track_over_flat_ground() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: -5.0 });
    let mut events = engine.subscribe();

    let outcome = engine.collect_profile(&straight_track(0.0, 10.0, 0.0)).await;
    assert_eq!(
        outcome,
        CollectOutcome::Committed {
            generation: 1,
            ground_samples: 11
        }
    );

    let profile = engine.profile();
    assert!(profile.ready);
    assert!(engine.points_ready());
    assert_eq!(profile.track_samples.len(), 2);
    // Two boundary samples and nine interior samples.
    assert_eq!(profile.ground_samples.len(), 11);

    for (idx, sample) in profile.ground_samples.iter().take(10).enumerate() {
        assert!((sample.distance_m - idx as f64).abs() < 1e-6);
    }
    for sample in &profile.ground_samples {
        assert!(sample.resolved);
        assert_eq!(sample.ground_elevation_m, -5.0);
        assert_eq!(sample.safety_level, SafetyLevel::Warning);
    }
    assert!(profile.is_warning_or_collision);

    assert_eq!(profile.min_elevation_m, -5.0);
    assert_eq!(profile.max_elevation_m, 0.0);
    let range = engine.range();
    assert_eq!(range.min_x, 0.0);
    assert!((range.max_x - 10.0).abs() < 1e-3);
    assert!((range.min_y - -5.5).abs() < 1e-9);
    assert_eq!(range.max_y, 0.0);

    let event = events.recv().await.unwrap();
    assert_eq!(event.cause, EventCause::Collected);
    assert_eq!(event.ground_samples, profile.ground_samples);
    assert_eq!(event.track_samples, profile.track_samples);
}

#[tokio::test]
async fn sample_counts_and_distances_hold_for_multi_segment_tracks() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 0.0 });
    let waypoints = vec![
        Waypoint::new(0.0, 0.0, 120.0),
        Waypoint::new(east_of(0.0, 35.2), 0.0, 140.0),
        Waypoint::new(east_of(0.0, 35.2), 0.0, 150.0),
        Waypoint::new(east_of(0.0, 35.2), 0.0002, 110.0),
    ];

    engine.collect_profile(&waypoints).await;
    let profile = engine.profile();

    assert_eq!(profile.track_samples.len(), waypoints.len());
    assert!(profile.ground_samples.len() >= waypoints.len());
    assert_eq!(profile.track_samples[0].distance_m, 0.0);
    assert_eq!(profile.ground_samples[0].distance_m, 0.0);
    for pair in profile.track_samples.windows(2) {
        assert!(pair[1].distance_m >= pair[0].distance_m);
    }
    for pair in profile.ground_samples.windows(2) {
        assert!(pair[1].distance_m >= pair[0].distance_m);
    }

    // Vertical leg adds no distance.
    assert!((profile.track_samples[2].distance_m - profile.track_samples[1].distance_m).abs() < 1e-6);
    assert_eq!(profile.max_elevation_m, 150.0);
    assert!((engine.max_y() - 165.0).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_collection_is_identical() {
    let engine = ElevationProfile::new(Ramp);
    let track = straight_track(0.0, 42.0, 30.0);

    engine.collect_profile(&track).await;
    let first = engine.profile();
    let first_range = engine.range();

    engine.collect_profile(&track).await;
    assert_eq!(engine.profile(), first);
    assert_eq!(engine.range(), first_range);
}

#[tokio::test]
async fn ramp_ground_is_classified_along_track() {
    let engine = ElevationProfile::new(Ramp);
    engine.collect_profile(&straight_track(0.0, 80.0, 30.0)).await;

    let profile = engine.profile();
    let first = profile.ground_samples.first().unwrap();
    let last = profile.ground_samples.last().unwrap();
    assert_eq!(first.safety_level, SafetyLevel::Warning);
    assert_eq!(last.safety_level, SafetyLevel::Collision);

    let at_10 = profile.ground_samples[10];
    assert!((at_10.clearance_m() - 20.0).abs() < 1e-3);
    assert_eq!(at_10.safety_level, SafetyLevel::Warning);

    let at_28 = profile.ground_samples[28];
    assert!((at_28.clearance_m() - 2.0).abs() < 1e-3);
    assert_eq!(at_28.safety_level, SafetyLevel::Warning);

    let at_31 = profile.ground_samples[31];
    assert!((at_31.clearance_m() + 1.0).abs() < 1e-3);
    assert_eq!(at_31.safety_level, SafetyLevel::Collision);
    assert!(engine.is_warning_or_collision());
}

#[tokio::test]
async fn newer_collection_wins_when_older_finishes_last() {
    let (west_tx, west) = watch::channel(false);
    let (east_tx, east) = watch::channel(false);
    let engine = ElevationProfile::new(GatedGround {
        west,
        east,
        elevation_m: 0.0,
    });
    let mut events = engine.subscribe();

    let track_a = straight_track(-0.001, 5.0, 100.0);
    let track_b = straight_track(0.001, 5.0, 200.0);

    let a = engine.spawn_collect(track_a);
    wait_for_generation(&engine, 1).await;
    let b = engine.spawn_collect(track_b);
    wait_for_generation(&engine, 2).await;

    east_tx.send(true).unwrap();
    assert!(matches!(
        b.await.unwrap(),
        CollectOutcome::Committed { generation: 2, .. }
    ));

    west_tx.send(true).unwrap();
    assert_eq!(a.await.unwrap(), CollectOutcome::Superseded { generation: 1 });

    let profile = engine.profile();
    assert!(profile.ready);
    assert_eq!(profile.track_samples[0].elevation_m, 200.0);

    assert_eq!(events.recv().await.unwrap().track_samples[0].elevation_m, 200.0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn newer_collection_wins_when_older_finishes_first() {
    let (west_tx, west) = watch::channel(false);
    let (east_tx, east) = watch::channel(false);
    let engine = ElevationProfile::new(GatedGround {
        west,
        east,
        elevation_m: 0.0,
    });
    let mut events = engine.subscribe();

    let a = engine.spawn_collect(straight_track(-0.001, 5.0, 100.0));
    wait_for_generation(&engine, 1).await;
    let b = engine.spawn_collect(straight_track(0.001, 5.0, 200.0));
    wait_for_generation(&engine, 2).await;

    west_tx.send(true).unwrap();
    assert_eq!(a.await.unwrap(), CollectOutcome::Superseded { generation: 1 });
    assert!(!engine.points_ready());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    east_tx.send(true).unwrap();
    assert!(matches!(
        b.await.unwrap(),
        CollectOutcome::Committed { generation: 2, .. }
    ));
    assert_eq!(engine.profile().track_samples[0].elevation_m, 200.0);
    assert_eq!(events.recv().await.unwrap().cause, EventCause::Collected);
}

#[tokio::test]
async fn warning_height_change_only_reclassifies() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 95.0 });
    let mut events = engine.subscribe();
    engine.collect_profile(&straight_track(0.0, 12.0, 100.0)).await;

    let before = engine.profile();
    let range_before = engine.range();
    assert!(before
        .ground_samples
        .iter()
        .all(|s| s.safety_level == SafetyLevel::Warning));

    engine.set_warning_height_level(3.0);
    let after = engine.profile();

    assert!(!after.is_warning_or_collision);
    assert!(!engine.is_warning_or_collision());
    assert_eq!(engine.warning_height_level(), 3.0);
    assert_eq!(after.track_samples, before.track_samples);
    assert_eq!(after.ground_samples.len(), before.ground_samples.len());
    for (a, b) in after.ground_samples.iter().zip(&before.ground_samples) {
        assert_eq!(a.distance_m, b.distance_m);
        assert_eq!(a.ground_elevation_m, b.ground_elevation_m);
        assert_eq!(a.track_height_m, b.track_height_m);
        assert_eq!(a.safety_level, SafetyLevel::Safe);
    }
    assert_eq!(engine.range(), range_before);

    assert_eq!(events.recv().await.unwrap().cause, EventCause::Collected);
    let event = events.recv().await.unwrap();
    assert_eq!(event.cause, EventCause::Reclassified);
    assert!(!event.is_warning_or_collision);
}

#[tokio::test]
async fn warning_height_change_before_collection_is_used_later() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 95.0 });
    let mut events = engine.subscribe();

    engine.set_warning_height_level(3.0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    engine.collect_profile(&straight_track(0.0, 4.0, 100.0)).await;
    assert!(!engine.is_warning_or_collision());
}

#[tokio::test]
async fn unresolved_queries_are_excluded_from_range() {
    let engine = ElevationProfile::new(PatchyGround {
        elevation_m: -20.0,
        limit_lon: east_of(0.0, 4.5),
    });
    engine.collect_profile(&straight_track(0.0, 10.0, 10.0)).await;

    let profile = engine.profile();
    assert!(profile.ready);
    assert_eq!(profile.ground_samples.len(), 11);

    let (resolved, unresolved): (Vec<&terraprof_core::models::GroundSample>, Vec<&terraprof_core::models::GroundSample>) =
        profile.ground_samples.iter().partition(|s| s.resolved);
    assert_eq!(resolved.len(), 5);
    assert_eq!(unresolved.len(), 6);
    for sample in unresolved {
        assert_eq!(sample.ground_elevation_m, 0.0);
        assert_eq!(sample.safety_level, SafetyLevel::Safe);
    }
    assert_eq!(profile.min_elevation_m, -20.0);
    assert_eq!(profile.max_elevation_m, 10.0);
}

#[tokio::test(start_paused = true)]
async fn hung_queries_time_out_as_unresolved() {
    let config = ProfileConfig {
        query_timeout_ms: Some(250),
        ..ProfileConfig::default()
    };
    let engine = ElevationProfile::with_config(HangingGround, Ellipsoid::WGS84, config).unwrap();

    let outcome = engine.collect_profile(&straight_track(0.0, 3.0, 10.0)).await;
    assert!(matches!(outcome, CollectOutcome::Committed { .. }));

    let profile = engine.profile();
    // Only the sample at the origin resolves.
    assert!(profile.ground_samples[0].resolved);
    assert!(profile.ground_samples[1..].iter().all(|s| !s.resolved));
}

#[tokio::test(start_paused = true)]
async fn abandoned_collection_restores_previous_profile() {
    let engine = ElevationProfile::new(HangingGround);
    engine.collect_profile(&straight_track(-0.001, 5.0, 10.0)).await;
    let before = engine.profile();
    assert!(before.ready);
    assert!(before.is_warning_or_collision);

    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        engine.collect_profile(&straight_track(0.001, 5.0, 10.0)),
    )
    .await;
    assert!(abandoned.is_err());

    assert_eq!(engine.generation(), 2);
    assert!(engine.points_ready());
    assert_eq!(engine.profile(), before);
}

#[tokio::test(start_paused = true)]
async fn abandoned_first_collection_stays_pending() {
    let engine = ElevationProfile::new(HangingGround);

    let abandoned = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        engine.collect_profile(&straight_track(0.001, 5.0, 10.0)),
    )
    .await;
    assert!(abandoned.is_err());

    assert!(!engine.points_ready());
    assert!(!engine.is_warning_or_collision());
}

#[tokio::test]
async fn too_few_waypoints_is_a_no_op() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 0.0 });
    let mut events = engine.subscribe();

    assert_eq!(
        engine.collect_profile(&[]).await,
        CollectOutcome::Skipped(SkipReason::TooFewWaypoints)
    );
    assert_eq!(
        engine.collect_profile(&[Waypoint::new(1.0, 2.0, 3.0)]).await,
        CollectOutcome::Skipped(SkipReason::TooFewWaypoints)
    );
    assert_eq!(
        engine
            .collect_profile(&[Waypoint::new(1.0, 2.0, 3.0), Waypoint::new(f64::NAN, 2.0, 3.0)])
            .await,
        CollectOutcome::Skipped(SkipReason::NonFiniteWaypoint)
    );

    assert_eq!(engine.generation(), 0);
    assert!(!engine.points_ready());
    assert_eq!(engine.range(), ProfileRange::default());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn skipped_collection_keeps_previous_profile() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 0.0 });
    engine.collect_profile(&straight_track(0.0, 5.0, 80.0)).await;
    let before = engine.profile();

    engine.collect_profile(&[Waypoint::new(0.0, 0.0, 0.0)]).await;
    assert!(engine.points_ready());
    assert_eq!(engine.profile(), before);
}

#[tokio::test]
async fn clear_resets_and_drops_in_flight_collection() {
    let (west_tx, west) = watch::channel(true);
    let (east_tx, east) = watch::channel(false);
    let engine = ElevationProfile::new(GatedGround {
        west,
        east,
        elevation_m: 0.0,
    });

    engine.collect_profile(&straight_track(-0.001, 5.0, 50.0)).await;
    assert!(engine.points_ready());

    let pending = engine.spawn_collect(straight_track(0.001, 5.0, 60.0));
    wait_for_generation(&engine, 2).await;

    engine.clear();
    assert!(!engine.points_ready());
    assert_eq!(engine.range(), ProfileRange::default());
    assert_eq!(engine.profile().ground_samples.len(), 1);

    east_tx.send(true).unwrap();
    assert_eq!(pending.await.unwrap(), CollectOutcome::Superseded { generation: 2 });
    assert!(!engine.points_ready());
    drop(west_tx);
}

#[tokio::test]
async fn collision_when_track_below_terrain() {
    let engine = ElevationProfile::new(FlatGround { elevation_m: 500.0 });
    engine.collect_profile(&straight_track(0.0, 3.0, 400.0)).await;

    let profile = engine.profile();
    assert!(profile
        .ground_samples
        .iter()
        .all(|s| s.safety_level == SafetyLevel::Collision));
    assert!(engine.is_warning_or_collision());
    assert!((engine.max_y() - 550.0).abs() < 1e-9);
    assert!((engine.min_y() - 360.0).abs() < 1e-9);
}

#[tokio::test]
async fn sphere_profiles_use_tangent_plane_distance() {
    let engine = ElevationProfile::with_config(
        FlatGround { elevation_m: 0.0 },
        Ellipsoid::sphere(1_000_000.0),
        ProfileConfig {
            segment_length_m: 5.0,
            ..ProfileConfig::default()
        },
    )
    .unwrap();

    // 0.003 rad of arc on a 1000 km sphere is ~3000 m.
    let lon1 = 0.003_f64.to_degrees();
    let track = [Waypoint::new(0.0, 0.0, 100.0), Waypoint::new(lon1, 0.0, 100.0)];
    engine.collect_profile(&track).await;

    let profile = engine.profile();
    let expected = 1_000_100.0 * 0.003_f64.sin();
    assert!((profile.max_distance_m - expected).abs() < 1e-3);
    assert_eq!(profile.ground_samples.len(), 2 + (expected / 5.0).floor() as usize);
    assert!((profile.ground_samples[1].distance_m - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let result = ElevationProfile::with_config(
        FlatGround { elevation_m: 0.0 },
        Ellipsoid::WGS84,
        ProfileConfig {
            event_capacity: 0,
            ..ProfileConfig::default()
        },
    );
    assert!(result.is_err());
}
