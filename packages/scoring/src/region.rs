//! The polygonal area under analysis.

use geo::{Area, BoundingRect, MultiPolygon, Polygon, Rect};
use urban_greening_spatial::repair_polygons;

use crate::ScoringError;

/// A region in a projected, metric CRS.
///
/// Construction repairs each part and unions the results, which resolves
/// self-intersections and overlapping parts the way a zero-width buffer
/// would.
#[derive(Debug, Clone)]
pub struct Region {
    shape: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

impl Region {
    /// Builds a region from one or more polygons.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::EmptyRegion`] if there are no polygons or the
    /// repaired shape has no area.
    pub fn new(polygons: &[Polygon<f64>]) -> Result<Self, ScoringError> {
        if polygons.is_empty() {
            return Err(ScoringError::EmptyRegion);
        }

        let shape = repair_polygons(polygons);
        let area = shape.unsigned_area();
        if !area.is_finite() || area <= 0.0 {
            return Err(ScoringError::EmptyRegion);
        }

        let bounds = shape.bounding_rect().ok_or(ScoringError::EmptyRegion)?;

        log::debug!(
            "Region: {} part(s), area {area:.0}, bounds ({:.1}, {:.1})-({:.1}, {:.1})",
            shape.0.len(),
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y,
        );

        Ok(Self { shape, bounds })
    }

    /// The repaired region shape.
    #[must_use]
    pub const fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Axis-aligned bounding box of the shape.
    #[must_use]
    pub const fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Area of the repaired shape.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }
}
