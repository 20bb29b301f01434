//! Building density per grid cell.
//!
//! `building_ratio` is the summed area of building ∩ cell over the full
//! nominal cell area. Overlapping footprints are not merged first, so the
//! raw sum can exceed 1; by default it is capped at 1.

use geo::{Area, BooleanOps, Intersects, Polygon};
use urban_greening_scoring_models::{DataQuality, config::ScoringConfig};
use urban_greening_spatial::FeatureIndex;

use crate::{CellError, ScoringError, grid::GridCell, invalid_config, layer::FeatureLayer};

/// Density result for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityScore {
    /// Covered fraction of the cell.
    pub building_ratio: f64,
    /// Whether the ratio was measured or substituted.
    pub quality: DataQuality,
}

impl DensityScore {
    /// Greening headroom: `1 - building_ratio`.
    #[must_use]
    pub fn score_density(&self) -> f64 {
        1.0 - self.building_ratio
    }

    /// Normalized density score. Identity of [`Self::score_density`] for
    /// now; kept separate so the mapping can become non-linear.
    #[must_use]
    pub fn score_density_norm(&self) -> f64 {
        self.score_density()
    }
}

/// Scores cells against an indexed building layer.
pub struct DensityScorer {
    buildings: FeatureLayer,
    fallback_ratio: f64,
    clip: bool,
}

impl DensityScorer {
    /// Indexes `buildings` and captures the fallback policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if the fallback ratio is not
    /// within `[0, 1]`.
    pub fn new(buildings: Vec<Polygon<f64>>, config: &ScoringConfig) -> Result<Self, ScoringError> {
        let fallback_ratio = config.fallback_building_ratio;
        if !(0.0..=1.0).contains(&fallback_ratio) {
            return Err(invalid_config(format!(
                "fallback_building_ratio must be within [0, 1], got {fallback_ratio}"
            )));
        }

        Ok(Self {
            buildings: FeatureLayer::from_polygons("building", buildings),
            fallback_ratio,
            clip: config.clip_building_ratio,
        })
    }

    /// The building layer.
    #[must_use]
    pub const fn layer(&self) -> &FeatureLayer {
        &self.buildings
    }

    /// Density score for `cell`.
    ///
    /// Never fails: a missing layer or a failed geometry query yields the
    /// fallback ratio.
    #[must_use]
    pub fn score(&self, cell: &GridCell) -> DensityScore {
        let FeatureLayer::Available(index) = &self.buildings else {
            return self.fallback();
        };

        match covered_ratio(index, cell) {
            Ok(ratio) => DensityScore {
                building_ratio: if self.clip { ratio.min(1.0) } else { ratio },
                quality: DataQuality::Measured,
            },
            Err(e) => {
                log::warn!("Density query failed: {e}; using fallback ratio");
                self.fallback()
            }
        }
    }

    const fn fallback(&self) -> DensityScore {
        DensityScore {
            building_ratio: self.fallback_ratio,
            quality: DataQuality::Fallback,
        }
    }
}

/// Raw (unclipped) covered fraction of `cell`.
///
/// # Errors
///
/// Returns [`CellError::NonFinite`] if the cell geometry or the summed
/// intersection area is not finite.
pub fn covered_ratio(index: &FeatureIndex, cell: &GridCell) -> Result<f64, CellError> {
    let non_finite = CellError::NonFinite {
        quantity: "building ratio",
        column: cell.column,
        row: cell.row,
    };
    if !(cell.min.x.is_finite() && cell.min.y.is_finite() && cell.size.is_finite()) {
        return Err(non_finite);
    }

    let cell_polygon = cell.polygon();

    let covered: f64 = index
        .candidates(&cell.rect())
        .filter(|(_, building)| building.intersects(&cell_polygon))
        .map(|(_, building)| cell_polygon.intersection(building).unsigned_area())
        .sum();

    let ratio = covered / cell.area();
    if !ratio.is_finite() {
        return Err(non_finite);
    }

    Ok(ratio)
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Rect, coord};

    use super::*;

    fn cell() -> GridCell {
        GridCell {
            column: 0,
            row: 0,
            min: Coord { x: 0.0, y: 0.0 },
            size: 10.0,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon()
    }

    #[test]
    fn no_intersecting_buildings_is_zero() {
        let scorer =
            DensityScorer::new(vec![rect(50.0, 50.0, 60.0, 60.0)], &ScoringConfig::default())
                .unwrap();
        let score = scorer.score(&cell());
        assert!(score.building_ratio.abs() < f64::EPSILON);
        assert_eq!(score.quality, DataQuality::Measured);
        assert!((score.score_density_norm() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_cover_counts_only_inside_area() {
        let scorer = DensityScorer::new(
            vec![rect(-5.0, 0.0, 5.0, 10.0), rect(8.0, 8.0, 20.0, 20.0)],
            &ScoringConfig::default(),
        )
        .unwrap();
        let score = scorer.score(&cell());
        // 50 from the first building, 4 from the second.
        assert!((score.building_ratio - 0.54).abs() < 1e-9);
        assert!((score.score_density() - 0.46).abs() < 1e-9);
    }

    #[test]
    fn overlapping_buildings_are_capped_by_default() {
        let buildings = vec![rect(0.0, 0.0, 10.0, 10.0), rect(0.0, 0.0, 10.0, 5.0)];
        let capped = DensityScorer::new(buildings.clone(), &ScoringConfig::default()).unwrap();
        assert!((capped.score(&cell()).building_ratio - 1.0).abs() < 1e-9);

        let raw = DensityScorer::new(
            buildings,
            &ScoringConfig {
                clip_building_ratio: false,
                ..ScoringConfig::default()
            },
        )
        .unwrap();
        assert!((raw.score(&cell()).building_ratio - 1.5).abs() < 1e-9);
    }

    #[test]
    fn failed_cell_falls_back_while_neighbours_are_measured() {
        let scorer =
            DensityScorer::new(vec![rect(0.0, 0.0, 30.0, 5.0)], &ScoringConfig::default()).unwrap();
        let at = |column: usize, x: f64| GridCell {
            column,
            row: 0,
            min: Coord { x, y: 0.0 },
            size: 10.0,
        };
        let cells = [at(0, 0.0), at(1, f64::NAN), at(2, 20.0)];
        let scores: Vec<DensityScore> = cells.iter().map(|c| scorer.score(c)).collect();

        assert_eq!(scores[1].quality, DataQuality::Fallback);
        assert!((scores[1].building_ratio - 0.1).abs() < f64::EPSILON);
        for neighbour in [scores[0], scores[2]] {
            assert_eq!(neighbour.quality, DataQuality::Measured);
            assert!((neighbour.building_ratio - 0.5).abs() < 1e-9);
        }

        let FeatureLayer::Available(index) = scorer.layer() else {
            panic!("building layer should be indexed");
        };
        assert!(matches!(
            covered_ratio(index, &cells[1]),
            Err(CellError::NonFinite { column: 1, .. })
        ));
        assert!(covered_ratio(index, &at(3, f64::INFINITY)).is_err());
    }

    #[test]
    fn missing_layer_uses_fallback() {
        let scorer = DensityScorer::new(Vec::new(), &ScoringConfig::default()).unwrap();
        let score = scorer.score(&cell());
        assert!((score.building_ratio - 0.1).abs() < f64::EPSILON);
        assert_eq!(score.quality, DataQuality::Fallback);
        assert!((score.score_density_norm() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_fallback() {
        let config = ScoringConfig {
            fallback_building_ratio: 1.5,
            ..ScoringConfig::default()
        };
        assert!(DensityScorer::new(Vec::new(), &config).is_err());
    }
}
