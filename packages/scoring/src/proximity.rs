//! Distance from each cell to the nearest green space.
//!
//! All green polygons are repaired and unioned once per run and the parts
//! of the union are indexed. A cell's distance is measured from its centroid and
//! is 0 when the centroid lies inside green space.

use geo::Polygon;
use urban_greening_scoring_models::{DataQuality, config::ScoringConfig};
use urban_greening_spatial::{FeatureIndex, repair_polygons};

use crate::{CellError, ScoringError, grid::GridCell, invalid_config, layer::FeatureLayer};

/// Proximity result for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityScore {
    /// Distance to the nearest green space.
    pub dist_to_green: f64,
    /// `dist_to_green / max_dist`, clipped to `[0, 1]`.
    pub score_distance_norm: f64,
    /// Whether the distance was measured or substituted.
    pub quality: DataQuality,
}

/// Scores cells against the union of all green spaces.
pub struct ProximityScorer {
    greens: FeatureLayer,
    max_dist: f64,
}

impl ProximityScorer {
    /// Repairs, unions and indexes `greens`.
    ///
    /// Self-intersecting parks are repaired rather than dropped; only parts
    /// left without area are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if `max_green_distance` is
    /// not a positive finite number.
    pub fn new(greens: &[Polygon<f64>], config: &ScoringConfig) -> Result<Self, ScoringError> {
        let max_dist = config.max_green_distance;
        if !max_dist.is_finite() || max_dist <= 0.0 {
            return Err(invalid_config(format!(
                "max_green_distance must be positive, got {max_dist}"
            )));
        }

        let union = repair_polygons(greens);
        log::debug!(
            "Unioned {} green features into {} parts",
            greens.len(),
            union.0.len()
        );

        Ok(Self {
            greens: FeatureLayer::from_polygons("green", union.0),
            max_dist,
        })
    }

    /// The green layer (parts of the union).
    #[must_use]
    pub const fn layer(&self) -> &FeatureLayer {
        &self.greens
    }

    /// Saturation distance.
    #[must_use]
    pub const fn max_dist(&self) -> f64 {
        self.max_dist
    }

    /// Proximity score for `cell`.
    ///
    /// Never fails: a missing layer or failed query yields
    /// `dist_to_green = max_dist` and a normalized score of 1.
    #[must_use]
    pub fn score(&self, cell: &GridCell) -> ProximityScore {
        let FeatureLayer::Available(index) = &self.greens else {
            return self.fallback();
        };

        match green_distance(index, cell) {
            Ok(dist) => ProximityScore {
                dist_to_green: dist,
                score_distance_norm: normalize_distance(dist, self.max_dist),
                quality: DataQuality::Measured,
            },
            Err(e) => {
                log::warn!("Proximity query failed: {e}; using fallback distance");
                self.fallback()
            }
        }
    }

    const fn fallback(&self) -> ProximityScore {
        ProximityScore {
            dist_to_green: self.max_dist,
            score_distance_norm: 1.0,
            quality: DataQuality::Fallback,
        }
    }
}

/// Distance from the centroid of `cell` to the nearest indexed polygon.
///
/// # Errors
///
/// Returns [`CellError::NonFinite`] if the index is empty or the centroid
/// or distance is not finite.
pub fn green_distance(index: &FeatureIndex, cell: &GridCell) -> Result<f64, CellError> {
    index
        .nearest_distance(cell.centroid())
        .filter(|d| d.is_finite())
        .ok_or(CellError::NonFinite {
            quantity: "green distance",
            column: cell.column,
            row: cell.row,
        })
}

/// Maps a distance to `[0, 1]`, saturating at `max_dist`.
///
/// Non-finite distances map to 1 (maximal need).
#[must_use]
pub fn normalize_distance(dist: f64, max_dist: f64) -> f64 {
    let ratio = dist / max_dist;
    if ratio.is_nan() {
        return 1.0;
    }
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Rect, coord, polygon};

    use super::*;

    fn cell_at(x: f64, y: f64) -> GridCell {
        GridCell {
            column: 0,
            row: 0,
            min: Coord { x, y },
            size: 10.0,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon()
    }

    #[test]
    fn measures_from_centroid_to_nearest_green() {
        let scorer = ProximityScorer::new(
            &[rect(100.0, 0.0, 110.0, 10.0), rect(-300.0, 0.0, -290.0, 10.0)],
            &ScoringConfig::default(),
        )
        .unwrap();
        let score = scorer.score(&cell_at(0.0, 0.0));
        assert!((score.dist_to_green - 95.0).abs() < 1e-9);
        assert!((score.score_distance_norm - 0.19).abs() < 1e-9);
        assert_eq!(score.quality, DataQuality::Measured);
    }

    #[test]
    fn inside_green_is_zero() {
        let scorer =
            ProximityScorer::new(&[rect(0.0, 0.0, 50.0, 50.0)], &ScoringConfig::default())
                .unwrap();
        let score = scorer.score(&cell_at(10.0, 10.0));
        assert!(score.dist_to_green.abs() < 1e-12);
        assert!(score.score_distance_norm.abs() < 1e-12);
    }

    #[test]
    fn far_cells_saturate() {
        let scorer =
            ProximityScorer::new(&[rect(0.0, 0.0, 10.0, 10.0)], &ScoringConfig::default())
                .unwrap();
        let score = scorer.score(&cell_at(2000.0, 0.0));
        assert!((score.dist_to_green - 1995.0).abs() < 1e-9);
        assert!((score.score_distance_norm - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlapping_greens_are_unioned() {
        let scorer = ProximityScorer::new(
            &[rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 0.0, 20.0, 10.0)],
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(scorer.layer().len(), 1);
    }

    #[test]
    fn self_intersecting_green_is_repaired() {
        // Bowtie park spanning x in [10, 30]; its left lobe touches x = 10.
        let bowtie = polygon![
            (x: 10.0, y: 0.0),
            (x: 30.0, y: 10.0),
            (x: 30.0, y: 0.0),
            (x: 10.0, y: 10.0),
        ];
        let scorer = ProximityScorer::new(&[bowtie], &ScoringConfig::default()).unwrap();
        assert!(!scorer.layer().is_missing());

        let score = scorer.score(&cell_at(0.0, 0.0));
        assert_eq!(score.quality, DataQuality::Measured);
        assert!((score.dist_to_green - 5.0).abs() < 1e-6);
        assert!((score.score_distance_norm - 0.01).abs() < 1e-6);
    }

    #[test]
    fn failed_cell_falls_back_while_neighbours_are_measured() {
        let scorer =
            ProximityScorer::new(&[rect(100.0, 0.0, 110.0, 10.0)], &ScoringConfig::default())
                .unwrap();
        let broken = GridCell {
            column: 1,
            row: 0,
            min: Coord {
                x: f64::NAN,
                y: 0.0,
            },
            size: 10.0,
        };
        let cells = [cell_at(0.0, 0.0), broken, cell_at(20.0, 0.0)];
        let scores: Vec<ProximityScore> = cells.iter().map(|c| scorer.score(c)).collect();

        assert_eq!(scores[1].quality, DataQuality::Fallback);
        assert!((scores[1].dist_to_green - 500.0).abs() < f64::EPSILON);
        assert!((scores[1].score_distance_norm - 1.0).abs() < f64::EPSILON);

        assert_eq!(scores[0].quality, DataQuality::Measured);
        assert!((scores[0].dist_to_green - 95.0).abs() < 1e-9);
        assert_eq!(scores[2].quality, DataQuality::Measured);
        assert!((scores[2].dist_to_green - 75.0).abs() < 1e-9);

        let FeatureLayer::Available(index) = scorer.layer() else {
            panic!("green layer should be indexed");
        };
        assert!(matches!(
            green_distance(index, &cells[1]),
            Err(CellError::NonFinite { column: 1, .. })
        ));
    }

    #[test]
    fn missing_layer_uses_worst_case() {
        let scorer = ProximityScorer::new(&[], &ScoringConfig::default()).unwrap();
        let score = scorer.score(&cell_at(0.0, 0.0));
        assert!((score.dist_to_green - 500.0).abs() < f64::EPSILON);
        assert!((score.score_distance_norm - 1.0).abs() < f64::EPSILON);
        assert_eq!(score.quality, DataQuality::Fallback);
    }

    #[test]
    fn normalization_is_monotone_and_bounded() {
        let mut previous = 0.0;
        for step in 0..=100 {
            let d = f64::from(step) * 10.0;
            let n = normalize_distance(d, 500.0);
            assert!((0.0..=1.0).contains(&n));
            assert!(n >= previous);
            if d >= 500.0 {
                assert!((n - 1.0).abs() < f64::EPSILON);
            }
            previous = n;
        }
        assert!((normalize_distance(f64::NAN, 500.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_positive_max_dist() {
        let config = ScoringConfig {
            max_green_distance: 0.0,
            ..ScoringConfig::default()
        };
        assert!(ProximityScorer::new(&[], &config).is_err());
    }
}
