//! terraprof: elevation profile of a flight track as JSON.
//!
//! Usage:
//!   terraprof --track track.json --flat 120 --pretty
//!   TERRAPROF_TERRAIN_URL=http://localhost:8080/v1/elevation terraprof --track track.json

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terraprof_cli::{load_track, profile_track, Config};
use terraprof_core::ProfileConfig;
use terraprof_terrain::{fetch_terrain_grid, ConstantGeoid, DatumCorrected, FlatTerrain, VerticalDatum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terrain elevation profile beneath a flight track")]
struct Args {
    /// JSON file with the track waypoints
    #[arg(long)]
    track: PathBuf,

    /// Clearance below which samples are flagged (meters)
    #[arg(long, allow_negative_numbers = true)]
    warning_height: Option<f64>,

    /// Use constant terrain at this elevation instead of the terrain service
    #[arg(long, allow_negative_numbers = true)]
    flat: Option<f64>,

    /// Elevation API endpoint
    #[arg(long)]
    terrain_url: Option<String>,

    /// Vertical datum of terrain heights (amsl or wgs84)
    #[arg(long, default_value = "amsl")]
    datum: String,

    /// Geoid undulation added to AMSL terrain heights (meters)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    geoid_offset: f64,

    /// Per-query timeout in milliseconds
    #[arg(long)]
    query_timeout_ms: Option<u64>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with((!args.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("terraprof=info".parse()?))
        .init();

    let mut config = Config::from_env();
    if let Some(url) = args.terrain_url {
        config.terrain.provider_url = url;
    }

    let profile_config = ProfileConfig {
        warning_height_m: args.warning_height.unwrap_or(config.warning_height_m),
        query_timeout_ms: args.query_timeout_ms.or(config.query_timeout_ms),
        ..ProfileConfig::default()
    };
    let datum = VerticalDatum::parse(&args.datum)
        .ok_or_else(|| anyhow!("unknown vertical datum '{}'", args.datum))?;
    let geoid = ConstantGeoid(args.geoid_offset);

    let waypoints = load_track(&args.track)?;
    tracing::info!(waypoints = waypoints.len(), track = %args.track.display(), "loaded track");

    let report = match args.flat {
        Some(elevation_m) => {
            let provider = DatumCorrected::new(FlatTerrain::new(elevation_m), datum, geoid);
            profile_track(provider, profile_config, &waypoints).await?
        }
        None => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.terrain.request_timeout_s.max(3)))
                .build()?;
            tracing::info!(url = %config.terrain.provider_url, "fetching terrain grid");
            let grid = fetch_terrain_grid(&client, &config.terrain, &waypoints)
                .await?
                .ok_or_else(|| anyhow!("track has no finite coordinates"))?;
            let (rows, cols) = grid.dims();
            tracing::info!(rows, cols, "terrain grid ready");
            let provider = DatumCorrected::new(grid, datum, geoid);
            profile_track(provider, profile_config, &waypoints).await?
        }
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
