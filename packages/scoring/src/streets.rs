//! Per-street greening potential.
//!
//! Each segment is buffered by a fixed distance; its potential is the
//! mean fused score of the grid cells touching that buffer. Segments that
//! touch no cell get no potential and no recommendation.

use geo::{BoundingRect, Buffer, Coord, Intersects, LineString, Rect};
use urban_greening_scoring_models::{
    ScoredCell, SpeciesCatalog, StreetScore, config::StreetConfig,
};
use urban_greening_spatial::FeatureIndex;

use crate::{ScoringError, invalid_config};

/// A street segment in the grid's CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSegment {
    /// Identifier from the source data.
    pub id: Option<String>,
    /// Street name from the source data.
    pub name: Option<String>,
    /// Centreline.
    pub geometry: LineString<f64>,
}

fn cell_rect(cell: &ScoredCell) -> Rect<f64> {
    Rect::new(
        Coord {
            x: cell.min_x,
            y: cell.min_y,
        },
        Coord {
            x: cell.min_x + cell.size,
            y: cell.min_y + cell.size,
        },
    )
}

/// Scores every segment against `cells`.
///
/// Results are ordered by descending potential; segments without a
/// potential come last, in input order.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidConfig`] if the buffer distance is not a
/// positive finite number.
#[allow(clippy::cast_precision_loss)]
pub fn score_streets(
    segments: &[StreetSegment],
    cells: &[ScoredCell],
    config: &StreetConfig,
    catalog: &SpeciesCatalog,
) -> Result<Vec<StreetScore>, ScoringError> {
    let distance = config.buffer_distance;
    if !distance.is_finite() || distance <= 0.0 {
        return Err(invalid_config(format!(
            "buffer_distance must be positive, got {distance}"
        )));
    }

    let index = FeatureIndex::new(
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (i, cell_rect(cell).to_polygon())),
    );

    let mut scores: Vec<StreetScore> = segments
        .iter()
        .enumerate()
        .map(|(position, segment)| {
            let buffered = segment.geometry.buffer(distance);
            let totals: Vec<f64> = buffered
                .bounding_rect()
                .map(|bounds| {
                    index
                        .candidates(&bounds)
                        .filter(|(_, cell)| buffered.intersects(*cell))
                        .map(|(i, _)| cells[i].score.score_total)
                        .collect()
                })
                .unwrap_or_default();

            let greening_potential =
                (!totals.is_empty()).then(|| totals.iter().sum::<f64>() / totals.len() as f64);
            let tier = greening_potential.and_then(|p| catalog.tier_for(p));

            StreetScore {
                segment: position,
                id: segment.id.clone(),
                name: segment.name.clone(),
                greening_potential,
                intersecting_cells: totals.len(),
                tier: tier.map(|t| t.label.clone()),
                recommended_species: tier.map(|t| t.species.clone()).unwrap_or_default(),
            }
        })
        .collect();

    let unscored = scores
        .iter()
        .filter(|s| s.greening_potential.is_none())
        .count();
    if unscored > 0 {
        log::info!("{unscored} of {} street segments touch no grid cell", scores.len());
    }

    scores.sort_by(|a, b| match (a.greening_potential, b.greening_potential) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use geo::line_string;
    use urban_greening_scoring_models::{CellScore, DataQuality};

    use super::*;
    use crate::species::default_catalog;

    #[allow(clippy::cast_precision_loss)]
    fn scored(column: usize, row: usize, total: f64) -> ScoredCell {
        ScoredCell {
            column,
            row,
            min_x: column as f64 * 10.0,
            min_y: row as f64 * 10.0,
            size: 10.0,
            score: CellScore {
                building_ratio: 0.0,
                dist_to_green: 0.0,
                score_density: 1.0,
                score_density_norm: 1.0,
                score_distance_norm: 0.0,
                score_total: total,
                density_quality: DataQuality::Measured,
                distance_quality: DataQuality::Measured,
            },
        }
    }

    fn segment(id: &str, geometry: LineString<f64>) -> StreetSegment {
        StreetSegment {
            id: Some(id.to_string()),
            name: None,
            geometry,
        }
    }

    #[test]
    fn averages_cells_within_buffer() {
        let cells = vec![scored(0, 0, 0.2), scored(1, 0, 0.4), scored(5, 5, 1.0)];
        let street = segment("a", line_string![(x: 2.0, y: 5.0), (x: 18.0, y: 5.0)]);
        let scores = score_streets(
            &[street],
            &cells,
            &StreetConfig { buffer_distance: 2.0 },
            &default_catalog(),
        )
        .unwrap();
        assert_eq!(scores[0].intersecting_cells, 2);
        assert!((scores[0].greening_potential.unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(scores[0].tier.as_deref(), Some("low"));
        assert!(!scores[0].recommended_species.is_empty());
    }

    #[test]
    fn segment_outside_grid_is_unscored_and_last() {
        let cells = vec![scored(0, 0, 0.9)];
        let far = segment("far", line_string![(x: 500.0, y: 500.0), (x: 520.0, y: 500.0)]);
        let near = segment("near", line_string![(x: 0.0, y: 5.0), (x: 10.0, y: 5.0)]);
        let scores = score_streets(
            &[far, near],
            &cells,
            &StreetConfig::default(),
            &default_catalog(),
        )
        .unwrap();
        assert_eq!(scores[0].id.as_deref(), Some("near"));
        assert_eq!(scores[0].tier.as_deref(), Some("high"));
        assert_eq!(scores[1].id.as_deref(), Some("far"));
        assert!(scores[1].greening_potential.is_none());
        assert!(scores[1].recommended_species.is_empty());
        assert!(scores[1].tier.is_none());
    }

    #[test]
    fn sorted_scores_keep_their_input_position() {
        let cells = vec![scored(0, 0, 0.9)];
        let far = segment("7", line_string![(x: 1000.0, y: 5.0), (x: 1010.0, y: 5.0)]);
        let near = segment("7", line_string![(x: 0.0, y: 5.0), (x: 10.0, y: 5.0)]);
        let scores = score_streets(
            &[far, near],
            &cells,
            &StreetConfig::default(),
            &default_catalog(),
        )
        .unwrap();
        assert_eq!(scores[0].segment, 1);
        assert!(scores[0].greening_potential.is_some());
        assert_eq!(scores[1].segment, 0);
        assert!(scores[1].greening_potential.is_none());
    }

    #[test]
    fn rejects_non_positive_buffer() {
        let result = score_streets(
            &[],
            &[],
            &StreetConfig {
                buffer_distance: 0.0,
            },
            &default_catalog(),
        );
        assert!(result.is_err());
    }
}
