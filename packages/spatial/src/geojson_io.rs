//! `GeoJSON` parsing into `geo` geometries.
//!
//! Accepts a `FeatureCollection`, a single `Feature` or a bare geometry.
//! Features with null or unconvertible geometry are skipped rather than
//! failing the whole file.

use geo::{Geometry, LineString, Polygon};
use geojson::{GeoJson, JsonObject};

use crate::SpatialError;

/// A feature's geometry together with its properties.
#[derive(Debug, Clone)]
pub struct ParsedFeature {
    /// Converted geometry.
    pub geometry: Geometry<f64>,
    /// Raw `GeoJSON` properties, if any.
    pub properties: Option<JsonObject>,
}

impl ParsedFeature {
    /// Returns a property as a string, stringifying numbers.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.as_ref()?.get(key)? {
            serde_json::Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Parses `GeoJSON` text into features.
///
/// # Errors
///
/// Returns [`SpatialError::GeoJson`] if the text is not valid `GeoJSON`.
pub fn parse_features(text: &str) -> Result<Vec<ParsedFeature>, SpatialError> {
    let geojson: GeoJson = text.parse()?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => {
            return Ok(vec![ParsedFeature {
                geometry: Geometry::<f64>::try_from(geometry)?,
                properties: None,
            }]);
        }
    };

    let total = features.len();
    let parsed: Vec<ParsedFeature> = features
        .into_iter()
        .filter_map(|feature| {
            let geometry = feature.geometry?;
            match Geometry::<f64>::try_from(geometry) {
                Ok(geometry) => Some(ParsedFeature {
                    geometry,
                    properties: feature.properties,
                }),
                Err(e) => {
                    log::warn!("Skipping feature with unconvertible geometry: {e}");
                    None
                }
            }
        })
        .collect();

    if parsed.len() < total {
        log::info!(
            "Parsed {} of {total} features ({} without usable geometry)",
            parsed.len(),
            total - parsed.len()
        );
    }

    Ok(parsed)
}

/// Extracts the polygonal parts of a geometry.
///
/// Points and lines contribute nothing; collections are flattened.
#[must_use]
pub fn polygons_of(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(polygons_of).collect(),
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => Vec::new(),
    }
}

/// Extracts the linear parts of a geometry.
#[must_use]
pub fn lines_of(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        Geometry::Line(l) => vec![LineString::from(vec![l.start, l.end])],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(lines_of).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_collection_and_skips_null_geometry() {
        let text = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Park", "osm_id": 42 },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                    }
                },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        })
        .to_string();

        let features = parse_features(&text).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].property_str("name").as_deref(), Some("Park"));
        assert_eq!(features[0].property_str("osm_id").as_deref(), Some("42"));
        assert_eq!(polygons_of(&features[0].geometry).len(), 1);
    }

    #[test]
    fn parses_bare_geometry() {
        let text = r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#;
        let features = parse_features(text).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(lines_of(&features[0].geometry).len(), 1);
        assert!(polygons_of(&features[0].geometry).is_empty());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_features("not geojson").is_err());
    }
}
