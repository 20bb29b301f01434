//! Weighted fusion of the normalized sub-scores.

use urban_greening_scoring_models::{CellScore, ScoredCell, config::ScoreWeights};

use crate::{
    ScoringError, density::DensityScore, grid::GridCell, invalid_config,
    proximity::ProximityScore,
};

/// Combines density and distance scores with fixed weights.
///
/// Weights are normalized to sum to 1 so the fused score stays in
/// `[0, 1]` whatever scale the configuration uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFuser {
    weights: ScoreWeights,
}

impl ScoreFuser {
    /// Validates and normalizes `weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if a weight is negative or
    /// not finite, or if both are zero.
    pub fn new(weights: ScoreWeights) -> Result<Self, ScoringError> {
        let ScoreWeights { density, distance } = weights;
        if !density.is_finite() || !distance.is_finite() || density < 0.0 || distance < 0.0 {
            return Err(invalid_config(format!(
                "weights must be finite and non-negative, got density={density} distance={distance}"
            )));
        }

        let sum = density + distance;
        if sum <= 0.0 {
            return Err(invalid_config("weights must not both be zero"));
        }

        Ok(Self {
            weights: ScoreWeights {
                density: density / sum,
                distance: distance / sum,
            },
        })
    }

    /// The normalized weights.
    #[must_use]
    pub const fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// `w_d · density_norm + w_g · distance_norm`, clamped to `[0, 1]`.
    #[must_use]
    pub fn fuse(&self, density_norm: f64, distance_norm: f64) -> f64 {
        self.weights
            .density
            .mul_add(density_norm, self.weights.distance * distance_norm)
            .clamp(0.0, 1.0)
    }

    /// Assembles the full score record for one cell.
    #[must_use]
    pub fn score_cell(
        &self,
        cell: &GridCell,
        density: DensityScore,
        proximity: ProximityScore,
    ) -> ScoredCell {
        let score_density_norm = density.score_density_norm();
        ScoredCell {
            column: cell.column,
            row: cell.row,
            min_x: cell.min.x,
            min_y: cell.min.y,
            size: cell.size,
            score: CellScore {
                building_ratio: density.building_ratio,
                dist_to_green: proximity.dist_to_green,
                score_density: density.score_density(),
                score_density_norm,
                score_distance_norm: proximity.score_distance_norm,
                score_total: self.fuse(score_density_norm, proximity.score_distance_norm),
                density_quality: density.quality,
                distance_quality: proximity.quality,
            },
        }
    }
}

impl Default for ScoreFuser {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
        }
    }
}
