//! Fan-out of ground height queries and fan-in per collection request.

use crate::models::{GroundSample, TrackSample};
use crate::provider::HeightProvider;
use crate::sampler::TrackPlan;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Aggregated, not yet classified, result of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProfile {
    pub total_distance_m: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub track_samples: Vec<TrackSample>,
    pub ground_samples: Vec<GroundSample>,
    /// Samples whose query produced no value
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Complete(RawProfile),
    /// A newer request started before this one finished
    Superseded,
}

/// State of one in-flight collection.
struct CollectionRequest {
    generation: u64,
    pending: usize,
    min_elevation_m: f64,
    max_elevation_m: f64,
    ground_samples: Vec<GroundSample>,
    unresolved: usize,
}

impl CollectionRequest {
    fn include(&mut self, elevation_m: f64) {
        self.min_elevation_m = self.min_elevation_m.min(elevation_m);
        self.max_elevation_m = self.max_elevation_m.max(elevation_m);
    }

    fn resolve(&mut self, index: usize, height: Option<f64>) {
        self.pending -= 1;
        let Some(sample) = self.ground_samples.get_mut(index) else {
            return;
        };
        match height.filter(|h| h.is_finite()) {
            Some(elevation_m) => {
                sample.ground_elevation_m = elevation_m;
                sample.resolved = true;
                self.include(elevation_m);
            }
            None => {
                self.unresolved += 1;
            }
        }
    }
}

/// Query the ground height of every planned point and wait for all of them.
///
/// `current` is re-read after every completed query; once it no longer
/// equals `generation` the remaining queries are dropped and the request
/// reports [`Aggregation::Superseded`].
pub async fn aggregate<H: HeightProvider>(
    provider: &H,
    plan: TrackPlan,
    generation: u64,
    current: &AtomicU64,
    query_timeout: Option<Duration>,
) -> Aggregation {
    let TrackPlan {
        track_samples,
        points,
        total_distance_m,
    } = plan;

    let first_height = track_samples.first().map(|s| s.elevation_m).unwrap_or(0.0);
    let mut request = CollectionRequest {
        generation,
        pending: points.len(),
        min_elevation_m: first_height,
        max_elevation_m: first_height,
        // Slots exist in track order before any query is issued.
        ground_samples: points
            .iter()
            .map(|p| GroundSample::placeholder(p.distance_m, p.position.height_m))
            .collect(),
        unresolved: 0,
    };
    for sample in &track_samples {
        request.include(sample.elevation_m);
    }

    let mut queries: FuturesUnordered<_> = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let lon = point.position.lon;
            let lat = point.position.lat;
            async move {
                let query = provider.ground_height(lon, lat);
                let height = match query_timeout {
                    Some(limit) => tokio::time::timeout(limit, query).await.ok().flatten(),
                    None => query.await,
                };
                (index, height)
            }
        })
        .collect();

    while let Some((index, height)) = queries.next().await {
        if current.load(Ordering::SeqCst) != request.generation {
            tracing::debug!(
                generation = request.generation,
                pending = request.pending,
                "profile request superseded"
            );
            return Aggregation::Superseded;
        }
        request.resolve(index, height);
    }

    if request.unresolved > 0 {
        tracing::warn!(
            generation = request.generation,
            unresolved = request.unresolved,
            total = request.ground_samples.len(),
            "ground height queries returned no value"
        );
    }

    Aggregation::Complete(RawProfile {
        total_distance_m,
        min_elevation_m: request.min_elevation_m,
        max_elevation_m: request.max_elevation_m,
        track_samples,
        ground_samples: request.ground_samples,
        unresolved: request.unresolved,
    })
}
