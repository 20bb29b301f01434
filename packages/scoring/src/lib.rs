#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grid-based scoring engine for urban greening analysis.
//!
//! Partitions a region polygon into square cells, scores every cell by
//! building density and distance to the nearest green space, and fuses
//! the two into a single priority score. Side aggregations turn the
//! scored grid into per-street potentials, irregular temperature samples
//! into deviations from a reference, and labelled satellite pixels into
//! brightness cluster summaries.
//!
//! Everything here is synchronous and a pure function of its inputs.
//! Missing feature data never fails a run; it degrades to documented
//! fallback values. Only an unusable region (no area, no cells) is fatal.

pub mod clusters;
pub mod density;
pub mod fusion;
pub mod grid;
pub mod layer;
pub mod pipeline;
pub mod proximity;
pub mod region;
pub mod species;
pub mod streets;
pub mod temperature;

pub use pipeline::{Analysis, AnalysisInput, analyze};
pub use urban_greening_scoring_models as models;

use thiserror::Error;

/// Errors that abort a scoring or aggregation call.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The region has no polygon or no area.
    #[error("Region is empty or has no area")]
    EmptyRegion,

    /// Rasterization produced no cells.
    #[error("Region produced an empty grid (area too small for analysis)")]
    EmptyGrid,

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Which value is wrong and why.
        message: String,
    },

    /// No usable temperature samples were supplied.
    #[error("No temperature data")]
    NoTemperatureData,

    /// Label and brightness arrays are inconsistent.
    #[error("Invalid cluster input: {message}")]
    ClusterInput {
        /// Description of the inconsistency.
        message: String,
    },

    /// A species catalog could not be parsed.
    #[error("Species catalog error: {0}")]
    Catalog(#[from] toml::de::Error),
}

/// A geometry query that failed for a single cell.
///
/// Never escapes a batch: scorers log it and substitute the fallback
/// value for that cell.
#[derive(Debug, Error)]
pub enum CellError {
    /// The computation produced NaN or infinity.
    #[error("non-finite {quantity} for cell ({column}, {row})")]
    NonFinite {
        /// Name of the quantity being computed.
        quantity: &'static str,
        /// Cell column.
        column: usize,
        /// Cell row.
        row: usize,
    },
}

pub(crate) fn invalid_config(message: impl Into<String>) -> ScoringError {
    ScoringError::InvalidConfig {
        message: message.into(),
    }
}
