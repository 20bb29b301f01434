//! End-to-end grid analysis: rasterize, score, fuse, aggregate streets.

use std::time::Instant;

use geo::Polygon;
use urban_greening_scoring_models::{
    DataQuality, GridSummary, ScoredCell, SpeciesCatalog, StreetScore, config::AnalysisConfig,
};

use crate::{
    ScoringError,
    density::DensityScorer,
    fusion::ScoreFuser,
    grid::{GridCell, rasterize},
    proximity::ProximityScorer,
    region::Region,
    streets::{StreetSegment, score_streets},
};

/// Geometry for one analysis run, all in the same metric CRS.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    /// Region parts. Must cover a non-zero area.
    pub region: Vec<Polygon<f64>>,
    /// Building footprints. May be empty.
    pub buildings: Vec<Polygon<f64>>,
    /// Green spaces. May be empty.
    pub greens: Vec<Polygon<f64>>,
    /// Street centrelines. May be empty.
    pub streets: Vec<StreetSegment>,
}

/// Result of [`analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// One record per grid cell, in grid order.
    pub cells: Vec<ScoredCell>,
    /// Aggregate statistics over `cells`.
    pub summary: GridSummary,
    /// Street potentials, highest first.
    pub streets: Vec<StreetScore>,
}

/// Runs the full grid analysis.
///
/// Missing building or green layers degrade to fallback values for every
/// cell; only an unusable region or configuration is fatal.
///
/// # Errors
///
/// * [`ScoringError::EmptyRegion`] if the region has no area.
/// * [`ScoringError::EmptyGrid`] if no cell intersects the region.
/// * [`ScoringError::InvalidConfig`] if a configured value is out of range.
pub fn analyze(
    input: AnalysisInput,
    config: &AnalysisConfig,
    catalog: &SpeciesCatalog,
) -> Result<Analysis, ScoringError> {
    let start = Instant::now();

    let fuser = ScoreFuser::new(config.scoring.weights)?;
    let region = Region::new(&input.region)?;
    let grid = rasterize(&region, config.grid.cell_size)?;
    log::debug!("Region area {:.0} m², {} cells", region.area(), grid.len());

    let density = DensityScorer::new(input.buildings, &config.scoring)?;
    let proximity = ProximityScorer::new(&input.greens, &config.scoring)?;
    log::info!(
        "Indexed {} building(s) and {} green space(s)",
        density.layer().len(),
        proximity.layer().len()
    );

    let cells = score_cells(grid.cells(), &density, &proximity, &fuser);

    let summary = summarize(&cells);
    log::info!(
        "Scored {} cells: mean {:.3}, range [{:.3}, {:.3}]",
        summary.cell_count,
        summary.mean_score,
        summary.min_score,
        summary.max_score
    );

    let streets = if input.streets.is_empty() {
        Vec::new()
    } else {
        let streets = score_streets(&input.streets, &cells, &config.streets, catalog)?;
        log::info!("Scored {} street segment(s)", streets.len());
        streets
    };

    log::info!("Analysis finished in {:.2?}", start.elapsed());

    Ok(Analysis {
        cells,
        summary,
        streets,
    })
}

/// Scores and fuses every cell. A cell whose geometry query fails gets
/// fallback values without affecting the rest of the batch.
fn score_cells(
    cells: &[GridCell],
    density: &DensityScorer,
    proximity: &ProximityScorer,
    fuser: &ScoreFuser,
) -> Vec<ScoredCell> {
    cells
        .iter()
        .map(|cell| fuser.score_cell(cell, density.score(cell), proximity.score(cell)))
        .collect()
}

/// Aggregate statistics over scored cells.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(cells: &[ScoredCell]) -> GridSummary {
    let totals = cells.iter().map(|c| c.score.score_total);
    let (sum, min, max) = totals.fold(
        (0.0_f64, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), t| (sum + t, min.min(t), max.max(t)),
    );

    let count = cells.len();
    let (mean_score, min_score, max_score) = if count == 0 {
        (0.0, 0.0, 0.0)
    } else {
        (sum / count as f64, min, max)
    };

    GridSummary {
        cell_count: count,
        mean_score,
        min_score,
        max_score,
        density_fallback_cells: cells
            .iter()
            .filter(|c| c.score.density_quality == DataQuality::Fallback)
            .count(),
        distance_fallback_cells: cells
            .iter()
            .filter(|c| c.score.distance_quality == DataQuality::Fallback)
            .count(),
    }
}
