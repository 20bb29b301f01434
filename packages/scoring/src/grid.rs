//! Uniform square grid over a region.
//!
//! Candidates are laid on the lattice anchored at the region's minimum
//! corner; a candidate is kept when it intersects the region at all.
//! Boundary cells keep their full nominal size, so later ratios always
//! use the full cell area as denominator.

use geo::{Coord, Intersects, Point, Polygon, Rect};

use crate::{ScoringError, invalid_config, region::Region};

/// One square analysis unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Lattice column from the region's minimum x.
    pub column: usize,
    /// Lattice row from the region's minimum y.
    pub row: usize,
    /// Lower-left corner.
    pub min: Coord<f64>,
    /// Edge length.
    pub size: f64,
}

impl GridCell {
    /// The cell as an axis-aligned rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            self.min,
            Coord {
                x: self.min.x + self.size,
                y: self.min.y + self.size,
            },
        )
    }

    /// The cell as a polygon.
    #[must_use]
    pub fn polygon(&self) -> Polygon<f64> {
        self.rect().to_polygon()
    }

    /// Centre point.
    #[must_use]
    pub fn centroid(&self) -> Point<f64> {
        Point::new(
            self.min.x + self.size / 2.0,
            self.min.y + self.size / 2.0,
        )
    }

    /// Nominal area (`size²`).
    #[must_use]
    pub fn area(&self) -> f64 {
        self.size * self.size
    }
}

/// The cells covering a region, ordered column-major.
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f64,
    columns: usize,
    rows: usize,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Edge length shared by all cells.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of lattice columns considered (kept or not).
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of lattice rows considered (kept or not).
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Kept cells.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Number of kept cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell was kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Number of lattice steps of `size` needed to span `extent`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn steps(extent: f64, size: f64) -> usize {
    (extent / size).ceil().max(0.0) as usize
}

/// Partitions `region` into square cells of edge `cell_size`.
///
/// # Errors
///
/// * [`ScoringError::InvalidConfig`] if `cell_size` is not a positive
///   finite number.
/// * [`ScoringError::EmptyGrid`] if no cell intersects the region.
#[allow(clippy::cast_precision_loss)]
pub fn rasterize(region: &Region, cell_size: f64) -> Result<Grid, ScoringError> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(invalid_config(format!(
            "cell_size must be positive, got {cell_size}"
        )));
    }

    let bounds = region.bounds();
    let (min, max) = (bounds.min(), bounds.max());
    let columns = steps(max.x - min.x, cell_size);
    let rows = steps(max.y - min.y, cell_size);

    let mut cells = Vec::new();
    for column in 0..columns {
        let x = (column as f64).mul_add(cell_size, min.x);
        if x >= max.x {
            break;
        }
        for row in 0..rows {
            let y = (row as f64).mul_add(cell_size, min.y);
            if y >= max.y {
                break;
            }
            let cell = GridCell {
                column,
                row,
                min: Coord { x, y },
                size: cell_size,
            };
            if cell.polygon().intersects(region.shape()) {
                cells.push(cell);
            }
        }
    }

    if cells.is_empty() {
        return Err(ScoringError::EmptyGrid);
    }

    log::info!(
        "Rasterized region into {} cells of {cell_size} (lattice {columns}x{rows})",
        cells.len()
    );

    Ok(Grid {
        cell_size,
        columns,
        rows,
        cells,
    })
}
