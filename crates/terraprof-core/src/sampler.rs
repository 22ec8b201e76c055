//! Track subdivision into fixed-length ground samples.
//!
//! Each segment between two consecutive waypoints is measured on the
//! tangent plane at its departure point and split into `segment_length_m`
//! steps. The leftover fraction of a step carries into the distance of the
//! following segment, so distances stay continuous along the track.

use crate::geometry::Ellipsoid;
use crate::models::{TrackSample, Waypoint};

/// A position that needs a ground height query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Cumulative along-track distance in meters
    pub distance_m: f64,
    /// Geodetic position; `height_m` is the track height here
    pub position: Waypoint,
}

/// Interior subdivision of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSamples {
    /// Points strictly between the two waypoints, in track order
    pub interior: Vec<Waypoint>,
    /// Segment length projected on the departure tangent plane
    pub projected_length_m: f64,
}

/// Ordered sampling of a whole track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPlan {
    pub track_samples: Vec<TrackSample>,
    pub points: Vec<SamplePoint>,
    pub total_distance_m: f64,
}

/// Subdivide the segment `w0 -> w1`.
///
/// A zero-length or vertical segment has no interior points.
pub fn sample_segment(
    ellipsoid: &Ellipsoid,
    w0: &Waypoint,
    w1: &Waypoint,
    segment_length_m: f64,
) -> SegmentSamples {
    let p0 = ellipsoid.to_cartesian(w0);
    let p1 = ellipsoid.to_cartesian(w1);

    let track_dir = p1 - p0;
    let full_length = track_dir.length();
    let normal = ellipsoid.surface_normal(p0);
    let projected_length_m = track_dir.project_onto_plane(&normal).length();

    if full_length <= f64::EPSILON || projected_length_m <= f64::EPSILON {
        return SegmentSamples {
            interior: Vec::new(),
            projected_length_m,
        };
    }

    let count = (projected_length_m / segment_length_m).floor() as usize;
    let scale = segment_length_m * full_length / projected_length_m;
    let unit_dir = track_dir.normalize();

    let interior = (1..=count)
        .map(|j| ellipsoid.to_geodetic(p0 + unit_dir * (j as f64 * scale)))
        .collect();

    SegmentSamples {
        interior,
        projected_length_m,
    }
}

/// Lay out every sample of a track in order.
///
/// Ground points are: the departure waypoint of each segment, that
/// segment's interior points, and finally the last waypoint. Callers must
/// pass at least one waypoint.
pub fn plan_track(ellipsoid: &Ellipsoid, waypoints: &[Waypoint], segment_length_m: f64) -> TrackPlan {
    let mut track_samples = Vec::with_capacity(waypoints.len());
    let mut points = Vec::with_capacity(waypoints.len());
    let mut distance_m = 0.0;

    if let Some(first) = waypoints.first() {
        track_samples.push(TrackSample {
            distance_m,
            elevation_m: first.height_m,
        });
    }

    for pair in waypoints.windows(2) {
        let (w0, w1) = (&pair[0], &pair[1]);

        points.push(SamplePoint {
            distance_m,
            position: *w0,
        });

        let segment = sample_segment(ellipsoid, w0, w1, segment_length_m);
        points.extend(
            segment
                .interior
                .into_iter()
                .enumerate()
                .map(|(idx, position)| SamplePoint {
                    distance_m: distance_m + (idx + 1) as f64 * segment_length_m,
                    position,
                }),
        );

        distance_m += segment.projected_length_m;
        track_samples.push(TrackSample {
            distance_m,
            elevation_m: w1.height_m,
        });
    }

    if let Some(last) = waypoints.last() {
        points.push(SamplePoint {
            distance_m,
            position: *last,
        });
    }

    TrackPlan {
        track_samples,
        points,
        total_distance_m: distance_m,
    }
}
