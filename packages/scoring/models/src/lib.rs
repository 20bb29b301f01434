#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Score, sample, and cluster types for the urban greening grid.
//!
//! These are the plain data records produced by a single analysis run:
//! per-cell scores, per-street potentials, temperature deviations and
//! brightness cluster summaries. They carry no geometry library types so
//! that downstream renderers can consume them as plain serde values.

pub mod config;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Whether a sub-score was computed from real feature data or substituted
/// by the degradation policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataQuality {
    /// Computed from the supplied features.
    Measured,
    /// Substituted because the layer was missing or the geometry query failed.
    Fallback,
}

/// Score attributes attached to a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellScore {
    /// Fraction of the cell area covered by building footprints.
    pub building_ratio: f64,
    /// Distance from the cell centroid to the nearest green space.
    pub dist_to_green: f64,
    /// `1 - building_ratio`.
    pub score_density: f64,
    /// Normalized density score (identity of `score_density`).
    pub score_density_norm: f64,
    /// `dist_to_green / max_dist`, clipped to `[0, 1]`.
    pub score_distance_norm: f64,
    /// Weighted combination of the two normalized scores.
    pub score_total: f64,
    /// Provenance of `building_ratio`.
    pub density_quality: DataQuality,
    /// Provenance of `dist_to_green`.
    pub distance_quality: DataQuality,
}

/// A scored grid cell, identified by its lattice index and lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCell {
    /// Lattice column (x step count from the region's minimum x).
    pub column: usize,
    /// Lattice row (y step count from the region's minimum y).
    pub row: usize,
    /// Lower-left x coordinate in the projected CRS.
    pub min_x: f64,
    /// Lower-left y coordinate in the projected CRS.
    pub min_y: f64,
    /// Edge length of the cell.
    pub size: f64,
    /// Computed scores.
    pub score: CellScore,
}

/// Aggregate statistics over a scored grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// Number of cells in the grid.
    pub cell_count: usize,
    /// Mean `score_total` across all cells.
    pub mean_score: f64,
    /// Lowest `score_total`.
    pub min_score: f64,
    /// Highest `score_total`.
    pub max_score: f64,
    /// Cells whose density score used the fallback ratio.
    pub density_fallback_cells: usize,
    /// Cells whose distance score used the fallback distance.
    pub distance_fallback_cells: usize,
}

/// Greening potential of a single street segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetScore {
    /// Position of the scored segment in the input slice. Identifiers may
    /// repeat, so this is the key back to the segment geometry.
    pub segment: usize,
    /// Identifier carried over from the input feature, if any.
    pub id: Option<String>,
    /// Street name carried over from the input feature, if any.
    pub name: Option<String>,
    /// Mean `score_total` of the cells touching the buffered segment.
    /// `None` when no cell intersects the buffer.
    pub greening_potential: Option<f64>,
    /// Number of cells that contributed to the mean.
    pub intersecting_cells: usize,
    /// Label of the catalog tier that matched, if any.
    pub tier: Option<String>,
    /// Recommended tree species for this segment.
    pub recommended_species: Vec<String>,
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// A single temperature reading at a geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Mean temperature over the queried period, in °C.
    pub mean_temperature: f64,
}

/// Deviation of a sample from the reference temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferenceSample {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// `mean_temperature - reference_temperature`.
    pub delta: f64,
}

/// How the reference temperature of a [`TemperatureField`] was chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceSource {
    /// A sample within the tolerance window of the query center.
    CenterSample,
    /// No sample was near the center; the mean of all samples was used.
    SampleMean,
}

/// Temperature deviations around a query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureField {
    /// Baseline all deltas are computed against.
    pub reference_temperature: f64,
    /// Rule that produced the baseline.
    pub reference_source: ReferenceSource,
    /// One entry per usable input sample.
    pub samples: Vec<DifferenceSample>,
}

/// Qualitative brightness category of a pixel cluster.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BrightnessBucket {
    /// Mean brightness above the `very_bright` threshold.
    VeryBright,
    /// Mean brightness above the `bright` threshold.
    Bright,
    /// Mean brightness above the `medium` threshold.
    Medium,
    /// Everything else.
    Dark,
}

/// Descriptive statistics of a non-empty cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    /// Mean brightness of the cluster's pixels, in `[0, 1]`.
    pub mean_brightness: f64,
    /// Bucket assigned by the threshold ladder.
    pub bucket: BrightnessBucket,
}

/// Summary of one cluster label. `stats` is `None` for clusters that
/// received no pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster label in `0..k`.
    pub label: usize,
    /// Number of pixels carrying this label.
    pub pixel_count: usize,
    /// Statistics, or `None` when the cluster is empty.
    pub stats: Option<ClusterStats>,
}

/// One tier of the street tree catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTier {
    /// Short label (e.g. `"high"`).
    pub label: String,
    /// Lowest greening potential this tier applies to (inclusive).
    pub min_potential: f64,
    /// Species recommended for streets in this tier.
    pub species: Vec<String>,
}

/// Catalog of tree species, tiered by greening potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCatalog {
    /// Tiers in any order; lookups pick the highest matching minimum.
    pub tiers: Vec<SpeciesTier>,
}

impl SpeciesCatalog {
    /// Returns the tier with the highest `min_potential` that `potential`
    /// reaches, if any.
    #[must_use]
    pub fn tier_for(&self, potential: f64) -> Option<&SpeciesTier> {
        self.tiers
            .iter()
            .filter(|tier| potential >= tier.min_potential)
            .max_by(|a, b| a.min_potential.total_cmp(&b.min_potential))
    }
}
