//! Local equirectangular projection between WGS84 and metres.
//!
//! Analyses cover a single district, so a tangent-plane approximation
//! centred on the area is accurate to well under a metre per kilometre.

use geo::{BoundingRect, Coord, MapCoords};

use crate::SpatialError;

/// Mean earth radius (IUGG), in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Maps lon/lat degrees to x/y metres relative to a fixed origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: Coord<f64>,
    cos_lat: f64,
}

impl LocalProjection {
    /// Creates a projection centred on `(lon, lat)`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if the origin is not finite or
    /// lies too close to a pole for an equirectangular plane.
    pub fn new(lon: f64, lat: f64) -> Result<Self, SpatialError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(SpatialError::Projection {
                message: format!("non-finite origin ({lon}, {lat})"),
            });
        }
        if lat.abs() > 85.0 || lon.abs() > 180.0 {
            return Err(SpatialError::Projection {
                message: format!("origin ({lon}, {lat}) outside supported range"),
            });
        }

        Ok(Self {
            origin: Coord { x: lon, y: lat },
            cos_lat: lat.to_radians().cos(),
        })
    }

    /// Creates a projection centred on the bounding box of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if the geometry is empty or its
    /// centre is unusable as an origin.
    pub fn centered_on<G>(geometry: &G) -> Result<Self, SpatialError>
    where
        G: BoundingRect<f64>,
    {
        let rect: Option<geo::Rect<f64>> = geometry.bounding_rect().into();
        let rect = rect.ok_or_else(|| SpatialError::Projection {
            message: "cannot centre a projection on an empty geometry".to_string(),
        })?;
        let center = rect.center();
        Self::new(center.x, center.y)
    }

    /// The origin as `(lon, lat)`.
    #[must_use]
    pub const fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Projects a lon/lat coordinate to metres.
    #[must_use]
    pub fn project_coord(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin.x).to_radians() * EARTH_RADIUS_M * self.cos_lat,
            y: (c.y - self.origin.y).to_radians() * EARTH_RADIUS_M,
        }
    }

    /// Inverse of [`Self::project_coord`].
    #[must_use]
    pub fn unproject_coord(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + (c.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            y: self.origin.y + (c.y / EARTH_RADIUS_M).to_degrees(),
        }
    }

    /// Projects every coordinate of a geometry.
    #[must_use]
    pub fn project<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(|c| self.project_coord(c))
    }

    /// Unprojects every coordinate of a geometry back to lon/lat.
    #[must_use]
    pub fn unproject<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(|c| self.unproject_coord(c))
    }
}
