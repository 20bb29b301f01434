//! File input and output for the CLI.
//!
//! Inputs are WGS84 `GeoJSON`. Geometry is projected into a local metric
//! frame centred on the region before scoring, and mapped back to lon/lat
//! on output.

use std::path::{Path, PathBuf};

use geo::{BoundingRect as _, MultiPolygon, Polygon, Rect, coord};
use serde::Serialize;
use urban_greening_scoring::{
    models::{Coordinate, ScoredCell, SpeciesCatalog, StreetScore, config::AnalysisConfig},
    species::{default_catalog, parse_catalog},
    streets::StreetSegment,
};
use urban_greening_spatial::{
    geojson_io::{ParsedFeature, lines_of, parse_features, polygons_of},
    projection::LocalProjection,
};

type BoxError = Box<dyn std::error::Error>;

/// Loads the analysis configuration, or the defaults when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, BoxError> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config = toml::de::from_str(&text)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Loads a species catalog, or the embedded default.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_catalog(path: Option<&Path>) -> Result<SpeciesCatalog, BoxError> {
    let Some(path) = path else {
        return Ok(default_catalog());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(parse_catalog(&text)?)
}

fn read_features(path: &Path) -> Result<Vec<ParsedFeature>, BoxError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(parse_features(&text)?)
}

/// Reads an optional layer file, treating an absent flag or file as empty.
fn read_optional_features(
    path: Option<&Path>,
    layer: &str,
) -> Result<Vec<ParsedFeature>, BoxError> {
    match path {
        None => {
            log::warn!("No {layer} file given; treating the layer as empty");
            Ok(Vec::new())
        }
        Some(path) if !path.exists() => {
            log::warn!(
                "{layer} file {} does not exist; treating the layer as empty",
                path.display()
            );
            Ok(Vec::new())
        }
        Some(path) => read_features(path),
    }
}

/// Polygons of the first polygonal feature in `path`, in lon/lat.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no polygon.
pub fn read_region_wgs84(path: &Path) -> Result<Vec<Polygon<f64>>, BoxError> {
    read_features(path)?
        .iter()
        .map(|f| polygons_of(&f.geometry))
        .find(|polygons| !polygons.is_empty())
        .ok_or_else(|| format!("No polygon feature in region file {}", path.display()).into())
}

/// The centre of the region's bounding box as a coordinate.
///
/// # Errors
///
/// Returns an error if the region file is unusable.
pub fn region_center(path: &Path) -> Result<Coordinate, BoxError> {
    let region = MultiPolygon::new(read_region_wgs84(path)?);
    let center = region
        .bounding_rect()
        .ok_or("Region has no extent")?
        .center();
    Ok(Coordinate {
        latitude: center.y,
        longitude: center.x,
    })
}

/// Reads the region and builds the projection centred on it.
///
/// # Errors
///
/// Returns an error if the file is unusable or its centre cannot anchor a
/// projection.
pub fn read_region(path: &Path) -> Result<(Vec<Polygon<f64>>, LocalProjection), BoxError> {
    let region = read_region_wgs84(path)?;
    let projection = LocalProjection::centered_on(&MultiPolygon::new(region.clone()))?;
    let origin = projection.origin();
    log::info!("Projecting around ({:.5}, {:.5})", origin.y, origin.x);
    let projected = region.iter().map(|p| projection.project(p)).collect();
    Ok((projected, projection))
}

/// Reads every polygon of an optional layer file, projected.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or parsed.
pub fn read_polygon_layer(
    path: Option<&Path>,
    layer: &str,
    projection: &LocalProjection,
) -> Result<Vec<Polygon<f64>>, BoxError> {
    let polygons: Vec<Polygon<f64>> = read_optional_features(path, layer)?
        .iter()
        .flat_map(|f| polygons_of(&f.geometry))
        .map(|p| projection.project(&p))
        .collect();
    log::info!("Read {} {layer} polygon(s)", polygons.len());
    Ok(polygons)
}

/// Reads street centrelines, projected.
///
/// Segments without an `id` property are identified by their position in
/// the file so scores can be joined back to geometry.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or parsed.
pub fn read_streets(
    path: Option<&Path>,
    projection: &LocalProjection,
) -> Result<Vec<StreetSegment>, BoxError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    let mut segments = Vec::new();
    for (i, feature) in read_optional_features(Some(path), "street")?.iter().enumerate() {
        let id = feature
            .property_str("id")
            .or_else(|| feature.property_str("osm_id"))
            .unwrap_or_else(|| format!("#{i}"));
        let name = feature.property_str("name");
        let lines = lines_of(&feature.geometry);
        let multi = lines.len() > 1;
        for (part, line) in lines.iter().enumerate() {
            segments.push(StreetSegment {
                id: Some(if multi { format!("{id}/{part}") } else { id.clone() }),
                name: name.clone(),
                geometry: projection.project(line),
            });
        }
    }
    log::info!("Read {} street segment(s)", segments.len());
    Ok(segments)
}

fn cell_polygon(cell: &ScoredCell) -> Polygon<f64> {
    Rect::new(
        coord! { x: cell.min_x, y: cell.min_y },
        coord! { x: cell.min_x + cell.size, y: cell.min_y + cell.size },
    )
    .to_polygon()
}

/// Scored cells as a `GeoJSON` feature collection in lon/lat.
///
/// # Errors
///
/// Returns an error if a score record fails to serialize.
pub fn cells_to_geojson(
    cells: &[ScoredCell],
    projection: &LocalProjection,
) -> Result<serde_json::Value, BoxError> {
    let features = cells
        .iter()
        .map(|cell| {
            let mut properties = serde_json::to_value(cell.score)?;
            properties["column"] = cell.column.into();
            properties["row"] = cell.row.into();
            let polygon = projection.unproject(&cell_polygon(cell));
            Ok::<_, serde_json::Error>(serde_json::json!({
                "type": "Feature",
                "geometry": geojson::Geometry::new(geojson::Value::from(&polygon)),
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

/// Street scores joined back to their centrelines, in lon/lat.
///
/// Each score is matched to `segments[score.segment]`, so `segments` must
/// be the slice that was scored.
///
/// # Errors
///
/// Returns an error if a score record fails to serialize.
pub fn streets_to_geojson(
    scores: &[StreetScore],
    segments: &[StreetSegment],
    projection: &LocalProjection,
) -> Result<serde_json::Value, BoxError> {
    let features = scores
        .iter()
        .map(|score| {
            let geometry = segments.get(score.segment).map(|s| {
                geojson::Geometry::new(geojson::Value::from(&projection.unproject(&s.geometry)))
            });
            Ok::<_, serde_json::Error>(serde_json::json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": serde_json::to_value(score)?,
            }))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

/// Writes `value` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<(), BoxError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Default path for the street output next to the cell output.
#[must_use]
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    path.with_file_name(format!("{stem}{suffix}.geojson"))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use geo::line_string;

    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "urban_greening_io_{}_{name}",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const REGION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [11.0, 48.0] } },
            { "type": "Feature", "properties": { "name": "district" }, "geometry": {
                "type": "Polygon",
                "coordinates": [[[11.0, 48.0], [11.01, 48.0], [11.01, 48.01], [11.0, 48.01], [11.0, 48.0]]]
            } }
        ]
    }"#;

    #[test]
    fn region_is_first_polygonal_feature() {
        let path = temp_file("region.geojson", REGION);
        let region = read_region_wgs84(&path).unwrap();
        assert_eq!(region.len(), 1);

        let center = region_center(&path).unwrap();
        assert!((center.latitude - 48.005).abs() < 1e-9);
        assert!((center.longitude - 11.005).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_layer_file_is_empty() {
        let projection = LocalProjection::new(11.0, 48.0).unwrap();
        let missing = std::env::temp_dir().join("urban_greening_io_does_not_exist.geojson");
        let polygons = read_polygon_layer(Some(&missing), "building", &projection).unwrap();
        assert!(polygons.is_empty());
        assert!(read_polygon_layer(None, "green", &projection).unwrap().is_empty());
    }

    #[test]
    fn streets_without_id_get_positional_ids() {
        let path = temp_file(
            "streets.geojson",
            r#"{
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "properties": { "name": "Hauptstraße" }, "geometry": {
                        "type": "LineString", "coordinates": [[11.0, 48.0], [11.001, 48.0]]
                    } },
                    { "type": "Feature", "properties": { "id": 42 }, "geometry": {
                        "type": "LineString", "coordinates": [[11.0, 48.001], [11.001, 48.001]]
                    } }
                ]
            }"#,
        );
        let projection = LocalProjection::new(11.0, 48.0).unwrap();
        let streets = read_streets(Some(&path), &projection).unwrap();
        assert_eq!(streets[0].id.as_deref(), Some("#0"));
        assert_eq!(streets[0].name.as_deref(), Some("Hauptstraße"));
        assert_eq!(streets[1].id.as_deref(), Some("42"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn street_features_follow_their_own_segment() {
        let projection = LocalProjection::new(11.0, 48.0).unwrap();
        let street = |x: f64| StreetSegment {
            id: Some("7".to_string()),
            name: None,
            geometry: line_string![(x: x, y: 5.0), (x: x + 10.0, y: 5.0)],
        };
        let segments = vec![street(0.0), street(1000.0)];
        let score = |segment: usize, greening_potential: Option<f64>| StreetScore {
            segment,
            id: Some("7".to_string()),
            name: None,
            greening_potential,
            intersecting_cells: usize::from(greening_potential.is_some()),
            tier: None,
            recommended_species: Vec::new(),
        };
        let scores = [score(0, Some(0.9)), score(1, None)];

        let collection = streets_to_geojson(&scores, &segments, &projection).unwrap();
        let first_lon = |i: usize| {
            collection["features"][i]["geometry"]["coordinates"][0][0]
                .as_f64()
                .unwrap()
        };
        assert!((first_lon(0) - 11.0).abs() < 1e-9);
        assert!(first_lon(1) > 11.01);
        assert_eq!(collection["features"][0]["properties"]["segment"], 0);
        assert_eq!(collection["features"][1]["properties"]["segment"], 1);
    }

    #[test]
    fn default_config_without_file() {
        assert_eq!(load_config(None).unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn sibling_path_appends_suffix() {
        assert_eq!(
            sibling_path(Path::new("out/cells.geojson"), "_streets"),
            PathBuf::from("out/cells_streets.geojson")
        );
    }
}
