use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain provider URL is empty")]
    EmptyUrl,

    #[error("max_grid_points must be > 0")]
    ZeroGridPoints,

    #[error("track spans {span_deg:.1} degrees of longitude; tracks crossing the antimeridian are not supported")]
    LongitudeSpan { span_deg: f64 },

    #[error("terrain grid needs at least 2x2 samples, got {rows}x{cols}")]
    GridTooSmall { rows: usize, cols: usize },

    #[error("terrain grid has {actual} elevations, expected {expected}")]
    GridSize { expected: usize, actual: usize },

    #[error("terrain request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("terrain provider HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("terrain provider missing elevation")]
    MissingElevation,

    #[error("terrain provider returned {actual} samples, expected {expected}")]
    SampleCount { expected: usize, actual: usize },
}
