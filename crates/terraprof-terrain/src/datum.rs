//! Vertical datum handling.
//!
//! Terrain sources usually report heights above mean sea level while track
//! heights are above the ellipsoid. [`DatumCorrected`] adds the geoid
//! undulation so both share one frame.

use std::future::Future;
use terraprof_core::HeightProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDatum {
    /// Heights above the WGS-84 ellipsoid
    Wgs84,
    /// Heights above mean sea level (geoid)
    Amsl,
}

impl VerticalDatum {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "wgs84" | "w84" | "hae" | "ellipsoid" => Some(Self::Wgs84),
            "amsl" | "msl" | "geoid" => Some(Self::Amsl),
            _ => None,
        }
    }
}

/// Convert a height in `datum` to height above the ellipsoid.
pub fn height_to_ellipsoid(height_m: f64, datum: VerticalDatum, geoid_offset_m: f64) -> f64 {
    match datum {
        VerticalDatum::Wgs84 => height_m,
        VerticalDatum::Amsl => height_m + geoid_offset_m,
    }
}

/// Geoid undulation lookup.
pub trait GeoidModel: Send + Sync {
    fn undulation_m(&self, lon: f64, lat: f64) -> f64;
}

/// A single undulation for the whole area of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantGeoid(pub f64);

impl GeoidModel for ConstantGeoid {
    fn undulation_m(&self, _lon: f64, _lat: f64) -> f64 {
        self.0
    }
}

/// Reports the heights of `inner` above the ellipsoid.
#[derive(Debug, Clone)]
pub struct DatumCorrected<H, G = ConstantGeoid> {
    inner: H,
    datum: VerticalDatum,
    geoid: G,
}

impl<H: HeightProvider, G: GeoidModel> DatumCorrected<H, G> {
    pub fn new(inner: H, datum: VerticalDatum, geoid: G) -> Self {
        Self {
            inner,
            datum,
            geoid,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: HeightProvider, G: GeoidModel> HeightProvider for DatumCorrected<H, G> {
    fn ground_height(&self, lon: f64, lat: f64) -> impl Future<Output = Option<f64>> + Send {
        let query = self.inner.ground_height(lon, lat);
        let datum = self.datum;
        let offset = self.geoid.undulation_m(lon, lat);
        async move {
            query
                .await
                .map(|height| height_to_ellipsoid(height, datum, offset))
        }
    }
}
