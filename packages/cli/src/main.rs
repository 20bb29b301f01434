#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for urban greening analysis.
//!
//! Scores a district grid from `GeoJSON` inputs, maps temperature
//! deviations around a point, and summarizes brightness clusters of
//! classified satellite pixels.

mod io;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use urban_greening_scoring::{
    AnalysisInput, analyze,
    clusters::{brightness_from_rgb, summarize_clusters},
    models::{Coordinate, config::AnalysisConfig},
    temperature::{aggregate, sample_lattice},
};
use urban_greening_weather::{
    DateRange,
    lattice::fetch_lattice,
    open_meteo::{OpenMeteo, summarize_hourly},
};

#[derive(Parser)]
#[command(name = "urban_greening", about = "Urban greening potential analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a region's grid cells and street segments
    Analyze {
        /// `GeoJSON` file whose first polygonal feature is the region
        #[arg(long)]
        region: PathBuf,
        /// `GeoJSON` building footprints (missing means no building data)
        #[arg(long)]
        buildings: Option<PathBuf>,
        /// `GeoJSON` green spaces (missing means no green-space data)
        #[arg(long)]
        greens: Option<PathBuf>,
        /// `GeoJSON` street centrelines
        #[arg(long)]
        streets: Option<PathBuf>,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// TOML species catalog replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Cell edge length in metres (overrides the config)
        #[arg(long)]
        cell_size: Option<f64>,
        /// Output `GeoJSON` file for scored cells
        #[arg(long)]
        output: PathBuf,
        /// Output `GeoJSON` file for street scores (default: next to `--output`)
        #[arg(long)]
        streets_output: Option<PathBuf>,
    },
    /// Map temperature deviations on a lattice around a point
    Temperature {
        /// `GeoJSON` region whose bounding-box centre is the query point
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        region: Option<PathBuf>,
        /// Latitude of the query point
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of the query point
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Days of history to average (overrides the config)
        #[arg(long)]
        days: Option<u32>,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also fetch and summarize the hourly series at the query point
        #[arg(long)]
        hourly: bool,
        /// Output `GeoJSON` file of per-point deviations
        #[arg(long)]
        output: PathBuf,
    },
    /// Summarize brightness of pre-clustered pixels
    Clusters {
        /// JSON file with `k`, `labels`, and `brightness` or `rgb`
        #[arg(long)]
        input: PathBuf,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output JSON file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration as TOML
    Config,
}

/// Pixel cluster assignment produced by an external classifier.
#[derive(Deserialize)]
struct ClusterFile {
    k: usize,
    labels: Vec<usize>,
    #[serde(default)]
    brightness: Option<Vec<f64>>,
    #[serde(default)]
    rgb: Option<Vec<[u8; 3]>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            region,
            buildings,
            greens,
            streets,
            config,
            catalog,
            cell_size,
            output,
            streets_output,
        } => {
            let mut config = io::load_config(config.as_deref())?;
            if let Some(cell_size) = cell_size {
                config.grid.cell_size = cell_size;
            }
            let catalog = io::load_catalog(catalog.as_deref())?;

            let (region, projection) = io::read_region(&region)?;
            let input = AnalysisInput {
                region,
                buildings: io::read_polygon_layer(buildings.as_deref(), "building", &projection)?,
                greens: io::read_polygon_layer(greens.as_deref(), "green", &projection)?,
                streets: io::read_streets(streets.as_deref(), &projection)?,
            };
            let segments = input.streets.clone();

            let analysis = analyze(input, &config, &catalog)?;

            io::write_json(&output, &io::cells_to_geojson(&analysis.cells, &projection)?)?;
            if !analysis.streets.is_empty() {
                let path = streets_output.unwrap_or_else(|| io::sibling_path(&output, "_streets"));
                io::write_json(
                    &path,
                    &io::streets_to_geojson(&analysis.streets, &segments, &projection)?,
                )?;
            }

            println!("{}", serde_json::to_string_pretty(&analysis.summary)?);
        }
        Commands::Temperature {
            region,
            lat,
            lon,
            days,
            config,
            hourly,
            output,
        } => {
            let config = io::load_config(config.as_deref())?;
            let center = match (region, lat, lon) {
                (Some(region), _, _) => io::region_center(&region)?,
                (None, Some(latitude), Some(longitude)) => Coordinate {
                    latitude,
                    longitude,
                },
                _ => return Err("either --region or both --lat and --lon are required".into()),
            };
            run_temperature(&config, center, days, hourly, &output).await?;
        }
        Commands::Clusters {
            input,
            config,
            output,
        } => {
            let config = io::load_config(config.as_deref())?;
            let text = std::fs::read_to_string(&input)?;
            let file: ClusterFile = serde_json::from_str(&text)?;
            let brightness = match (file.brightness, file.rgb) {
                (Some(brightness), _) => brightness,
                (None, Some(rgb)) => brightness_from_rgb(&rgb),
                (None, None) => return Err("cluster input needs `brightness` or `rgb`".into()),
            };

            let summaries = summarize_clusters(&file.labels, &brightness, file.k, &config.clusters)?;
            match output {
                Some(path) => io::write_json(&path, &summaries)?,
                None => println!("{}", serde_json::to_string_pretty(&summaries)?),
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&AnalysisConfig::default())?);
        }
    }

    Ok(())
}

async fn run_temperature(
    config: &AnalysisConfig,
    center: Coordinate,
    days: Option<u32>,
    hourly: bool,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let api = OpenMeteo::from_config(&config.weather)?;
    let range = DateRange::last_days(days.unwrap_or(config.weather.history_days));

    let points = sample_lattice(center, &config.temperature)?;
    let samples = fetch_lattice(&api, &points, range, config.weather.concurrent_requests).await;
    let field = aggregate(&samples, center, config.temperature.center_tolerance)?;

    log::info!(
        "Reference temperature {:.2} °C ({}) from {} point(s) in {:.1?}",
        field.reference_temperature,
        field.reference_source,
        field.samples.len(),
        start.elapsed()
    );

    let features: Vec<serde_json::Value> = field
        .samples
        .iter()
        .map(|s| {
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [s.longitude, s.latitude]
                },
                "properties": { "delta": s.delta }
            })
        })
        .collect();

    io::write_json(
        output,
        &serde_json::json!({
            "type": "FeatureCollection",
            "reference_temperature": field.reference_temperature,
            "reference_source": field.reference_source,
            "start_date": range.start.to_string(),
            "end_date": range.end.to_string(),
            "features": features,
        }),
    )?;

    if hourly {
        let readings = api
            .fetch_hourly(center.latitude, center.longitude, range)
            .await?;
        match summarize_hourly(&readings) {
            Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
            None => log::warn!("No hourly readings at the query point"),
        }
    }

    Ok(())
}
