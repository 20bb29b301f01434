//! Feature layers that may be absent.

use geo::Polygon;
use urban_greening_spatial::{FeatureIndex, sanitize_polygons};

/// A set of indexed polygons, or an explicit marker that none exist.
///
/// Scorers branch on this instead of treating an empty index as a
/// neutral value.
pub enum FeatureLayer {
    /// No usable features were supplied.
    Missing,
    /// Features indexed for spatial queries.
    Available(FeatureIndex),
}

impl FeatureLayer {
    /// Sanitizes `polygons` and indexes the survivors.
    ///
    /// Yields [`FeatureLayer::Missing`] when nothing usable remains.
    #[must_use]
    pub fn from_polygons(name: &str, polygons: Vec<Polygon<f64>>) -> Self {
        let supplied = polygons.len();
        let polygons = sanitize_polygons(polygons);

        if polygons.is_empty() {
            log::warn!("No usable {name} features ({supplied} supplied); using fallback scores");
            return Self::Missing;
        }

        log::info!(
            "Indexed {} {name} features ({supplied} supplied)",
            polygons.len()
        );
        Self::Available(FeatureIndex::from_polygons(polygons))
    }

    /// Whether the layer is absent.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Number of indexed features (0 when missing).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Missing => 0,
            Self::Available(index) => index.len(),
        }
    }

    /// Whether the layer holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
