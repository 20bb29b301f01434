//! Configuration schema for an analysis run.
//!
//! Every field has a default so a partial TOML file (or none at all)
//! yields a usable configuration.

use serde::{Deserialize, Serialize};

use crate::BrightnessBucket;

/// Top-level configuration, one section per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Grid rasterization.
    pub grid: GridConfig,
    /// Density/proximity scoring and fusion.
    pub scoring: ScoringConfig,
    /// Street segment aggregation.
    pub streets: StreetConfig,
    /// Temperature lattice and reference selection.
    pub temperature: TemperatureConfig,
    /// Brightness bucket thresholds.
    pub clusters: BrightnessThresholds,
    /// Weather API access.
    pub weather: WeatherConfig,
}

/// Grid rasterization settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of each square cell, in projected units (metres).
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { cell_size: 50.0 }
    }
}

/// Relative weights of the two normalized sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of `score_density_norm`.
    pub density: f64,
    /// Weight of `score_distance_norm`.
    pub distance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            density: 0.5,
            distance: 0.5,
        }
    }
}

/// Density and proximity scoring settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fusion weights.
    pub weights: ScoreWeights,
    /// Distance beyond which green space no longer counts (saturates to 1).
    pub max_green_distance: f64,
    /// Building ratio assumed for every cell when no building data exists.
    pub fallback_building_ratio: f64,
    /// Cap `building_ratio` at 1 when overlapping footprints sum past it.
    pub clip_building_ratio: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            max_green_distance: 500.0,
            fallback_building_ratio: 0.1,
            clip_building_ratio: true,
        }
    }
}

/// Street segment aggregation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetConfig {
    /// Buffer distance around each segment, in projected units.
    pub buffer_distance: f64,
}

impl Default for StreetConfig {
    fn default() -> Self {
        Self {
            buffer_distance: 15.0,
        }
    }
}

/// Temperature sampling lattice, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Spacing between lattice points.
    pub lattice_step: f64,
    /// Half-width of the lattice around the center.
    pub lattice_radius: f64,
    /// Half-width of the window around the center that qualifies a
    /// sample as the reference.
    pub center_tolerance: f64,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            lattice_step: 0.005,
            lattice_radius: 0.01,
            center_tolerance: 0.0005,
        }
    }
}

/// Four-tier brightness ladder. A mean brightness strictly above a
/// threshold qualifies for that tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessThresholds {
    /// Lower bound (exclusive) of "very bright".
    pub very_bright: f64,
    /// Lower bound (exclusive) of "bright".
    pub bright: f64,
    /// Lower bound (exclusive) of "medium".
    pub medium: f64,
}

impl Default for BrightnessThresholds {
    fn default() -> Self {
        Self {
            very_bright: 0.75,
            bright: 0.5,
            medium: 0.35,
        }
    }
}

impl BrightnessThresholds {
    /// Assigns the bucket for a mean brightness value.
    #[must_use]
    pub fn bucket(&self, mean_brightness: f64) -> BrightnessBucket {
        if mean_brightness > self.very_bright {
            BrightnessBucket::VeryBright
        } else if mean_brightness > self.bright {
            BrightnessBucket::Bright
        } else if mean_brightness > self.medium {
            BrightnessBucket::Medium
        } else {
            BrightnessBucket::Dark
        }
    }
}

/// Weather API access settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint.
    pub base_url: String,
    /// Number of days of history to average.
    pub history_days: u32,
    /// Maximum number of in-flight requests during a lattice fetch.
    pub concurrent_requests: usize,
    /// Retries per request after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub retry_base_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            history_days: 7,
            concurrent_requests: 6,
            max_retries: 3,
            retry_base_delay_ms: 500,
            timeout_secs: 20,
        }
    }
}
