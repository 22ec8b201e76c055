//! Ground height lookup contract.

use std::future::Future;
use std::sync::Arc;

/// Asynchronous terrain height source.
///
/// Heights are meters in the same vertical frame as the track, with any
/// geoid or datum correction already applied. `None` means the source has
/// no usable value for that position.
pub trait HeightProvider: Send + Sync {
    fn ground_height(&self, lon: f64, lat: f64) -> impl Future<Output = Option<f64>> + Send;
}

impl<H: HeightProvider> HeightProvider for Arc<H> {
    fn ground_height(&self, lon: f64, lat: f64) -> impl Future<Output = Option<f64>> + Send {
        (**self).ground_height(lon, lat)
    }
}
