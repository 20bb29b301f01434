#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over polygon features.
//!
//! Building footprints, green spaces and grid cells are loaded once per
//! analysis run into R-tree indexes keyed by bounding envelope. Scorers
//! use the index to narrow intersection and distance queries to nearby
//! features instead of scanning every feature for every cell.
//!
//! Also hosts the geometry plumbing shared by the scoring core and the
//! CLI: `GeoJSON` parsing ([`geojson_io`]) and the local metric
//! projection ([`projection`]).

pub mod geojson_io;
pub mod projection;

use geo::{
    Area, BooleanOps, BoundingRect, CoordsIter, Distance, Euclidean, MultiPolygon, Point, Polygon,
    Rect, Validation,
    algorithm::bool_ops::{FillRule, OpType},
    unary_union,
};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use thiserror::Error;

/// Errors from spatial parsing and projection.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// `GeoJSON` text could not be parsed or converted.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A projection origin or input coordinate was unusable.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },
}

/// A polygon stored in the R-tree with the caller's identifier.
struct IndexEntry {
    id: usize,
    envelope: AABB<[f64; 2]>,
    polygon: Polygon<f64>,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        Euclidean
            .distance(&Point::new(point[0], point[1]), &self.polygon)
            .powi(2)
    }
}

/// R-tree over polygons, each tagged with a caller-supplied id.
pub struct FeatureIndex {
    tree: RTree<IndexEntry>,
}

impl FeatureIndex {
    /// Bulk-loads `(id, polygon)` pairs into a new index.
    ///
    /// Polygons without a bounding box (empty exteriors) are skipped.
    #[must_use]
    pub fn new(polygons: impl IntoIterator<Item = (usize, Polygon<f64>)>) -> Self {
        let entries = polygons
            .into_iter()
            .filter_map(|(id, polygon)| {
                let envelope = rect_envelope(&polygon.bounding_rect()?);
                Some(IndexEntry {
                    id,
                    envelope,
                    polygon,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Builds an index whose ids are the polygons' positions in `polygons`.
    #[must_use]
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Self {
        Self::new(polygons.into_iter().enumerate())
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Polygons whose envelope intersects `rect`.
    ///
    /// This is the coarse filter only; callers run the exact geometric
    /// test on the returned polygons.
    pub fn candidates(&self, rect: &Rect<f64>) -> impl Iterator<Item = (usize, &Polygon<f64>)> {
        self.tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|entry| (entry.id, &entry.polygon))
    }

    /// Euclidean distance from `point` to the nearest indexed polygon
    /// (0 when the point lies inside one).
    ///
    /// The R-tree walks envelopes in order of their lower-bound distance
    /// and stops once no envelope can beat the best exact distance, so the
    /// cost stays logarithmic however far away the nearest polygon is.
    /// Returns `None` for an empty index or a non-finite point.
    #[must_use]
    pub fn nearest_distance(&self, point: Point<f64>) -> Option<f64> {
        if !point.x().is_finite() || !point.y().is_finite() {
            return None;
        }

        self.tree
            .nearest_neighbor(&[point.x(), point.y()])
            .map(|entry| Euclidean.distance(&point, &entry.polygon))
    }
}

/// Drops polygons that are invalid (self-intersecting, non-finite
/// coordinates) or have zero area.
#[must_use]
pub fn sanitize_polygons(polygons: Vec<Polygon<f64>>) -> Vec<Polygon<f64>> {
    let total = polygons.len();
    let kept: Vec<Polygon<f64>> = polygons
        .into_iter()
        .filter(|p| p.is_valid() && p.unsigned_area() > 0.0)
        .collect();

    if kept.len() < total {
        log::debug!(
            "Dropped {} invalid or empty polygons out of {total}",
            total - kept.len()
        );
    }

    kept
}

/// Repairs and merges `polygons` into non-overlapping parts.
///
/// Each polygon is first re-noded on its own under the non-zero winding
/// rule, so a self-intersecting ring keeps every lobe it encloses whatever
/// its orientation. The repaired pieces are then unioned. Polygons with
/// non-finite coordinates and parts without positive area are dropped.
#[must_use]
pub fn repair_polygons(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let nothing = MultiPolygon::<f64>::new(Vec::new());
    let pieces: Vec<Polygon<f64>> = polygons
        .iter()
        .filter(|p| p.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()))
        .flat_map(|p| p.boolean_op_with_fill_rule(&nothing, OpType::Union, FillRule::NonZero))
        .collect();

    let parts: Vec<Polygon<f64>> = unary_union(&pieces)
        .into_iter()
        .filter(|p| {
            let area = p.unsigned_area();
            area.is_finite() && area > 0.0
        })
        .collect();

    log::debug!(
        "Repaired {} polygon(s) into {} part(s)",
        polygons.len(),
        parts.len()
    );

    MultiPolygon::new(parts)
}

/// Converts a [`Rect`] into an R-tree envelope.
fn rect_envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
