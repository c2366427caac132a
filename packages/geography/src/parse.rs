//! Parses `GeoJSON` feature collections into model features.
//!
//! Tracts may be `Polygon` or `MultiPolygon` features; wells must be
//! `Point` features. Features without a geometry are skipped with a
//! warning, any other geometry type is an error.

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};
use nitrate_map_geography_models::{AttributeValue, PointFeature, PolygonFeature, Properties};

use crate::GeoError;

/// Parses a `FeatureCollection` of point features.
///
/// # Errors
///
/// Returns [`GeoError`] if the input is not a `FeatureCollection` or a
/// feature has a non-point geometry.
pub fn parse_point_collection(input: &str) -> Result<Vec<PointFeature>, GeoError> {
    let collection = feature_collection(input)?;
    let mut points = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = properties_from_json(feature.properties.as_ref());
        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping point feature {index}: no geometry");
            continue;
        };

        match geo::Geometry::<f64>::try_from(geometry)? {
            geo::Geometry::Point(position) => points.push(PointFeature {
                position,
                properties,
            }),
            other => {
                return Err(GeoError::Conversion {
                    message: format!(
                        "Feature {index}: expected Point geometry, found {}",
                        geometry_name(&other)
                    ),
                });
            }
        }
    }

    Ok(points)
}

/// Parses a `FeatureCollection` of polygon or multipolygon features.
///
/// # Errors
///
/// Returns [`GeoError`] if the input is not a `FeatureCollection` or a
/// feature has a non-polygonal geometry.
pub fn parse_polygon_collection(input: &str) -> Result<Vec<PolygonFeature>, GeoError> {
    let collection = feature_collection(input)?;
    let mut polygons = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = properties_from_json(feature.properties.as_ref());
        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping polygon feature {index}: no geometry");
            continue;
        };

        let boundary = match geo::Geometry::<f64>::try_from(geometry)? {
            geo::Geometry::MultiPolygon(mp) => mp,
            geo::Geometry::Polygon(p) => geo::MultiPolygon(vec![p]),
            other => {
                return Err(GeoError::Conversion {
                    message: format!(
                        "Feature {index}: expected Polygon or MultiPolygon geometry, found {}",
                        geometry_name(&other)
                    ),
                });
            }
        };

        polygons.push(PolygonFeature {
            boundary,
            properties,
        });
    }

    Ok(polygons)
}

fn feature_collection(input: &str) -> Result<FeatureCollection, GeoError> {
    match input.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(GeoError::Conversion {
            message: "Expected a FeatureCollection, found a single Feature".to_string(),
        }),
        GeoJson::Geometry(_) => Err(GeoError::Conversion {
            message: "Expected a FeatureCollection, found a bare Geometry".to_string(),
        }),
    }
}

/// Converts a `GeoJSON` properties object into [`Properties`].
///
/// Numbers, strings, and all-numeric arrays are kept; nulls, booleans,
/// objects, and mixed arrays are dropped.
#[must_use]
pub fn properties_from_json(object: Option<&JsonObject>) -> Properties {
    let mut properties = Properties::new();
    let Some(object) = object else {
        return properties;
    };

    for (key, value) in object {
        let converted = match value {
            JsonValue::Number(n) => n.as_f64().map(AttributeValue::Number),
            JsonValue::String(s) => Some(AttributeValue::Text(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(JsonValue::as_f64)
                .collect::<Option<Vec<f64>>>()
                .map(AttributeValue::Values),
            JsonValue::Null | JsonValue::Bool(_) | JsonValue::Object(_) => None,
        };

        if let Some(converted) = converted {
            properties.insert(key.clone(), converted);
        }
    }

    properties
}

const fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use nitrate_map_geography_models::Attributed as _;

    use super::*;

    const WELLS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"id": 1, "nitconc": 3.456},
             "geometry": {"type": "Point", "coordinates": [-89.5, 44.1]}},
            {"type": "Feature", "properties": {"id": 2, "nitconc": 0.5},
             "geometry": null},
            {"type": "Feature", "properties": {"id": 3, "nitconc": "7.25", "note": null},
             "geometry": {"type": "Point", "coordinates": [-90.0, 45.0]}}
        ]
    }"#;

    const TRACTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"geoid": "55001950100", "canrate": 0.12},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}},
            {"type": "Feature", "properties": {"geoid": "55001950200", "canrate": 0.08},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[2,2],[2,3],[3,3],[3,2],[2,2]]],
                [[[4,4],[4,5],[5,5],[5,4],[4,4]]]
             ]}}
        ]
    }"#;

    #[test]
    fn parses_points_and_skips_missing_geometry() {
        let wells = parse_point_collection(WELLS).unwrap();
        assert_eq!(wells.len(), 2);
        assert_eq!(wells[0].number("nitconc"), Some(3.456));
        assert!((wells[0].position.x() - -89.5).abs() < 1e-12);
        assert_eq!(wells[1].number("nitconc"), Some(7.25));
        assert!(!wells[1].properties.contains_key("note"));
    }

    #[test]
    fn parses_polygons_and_multipolygons() {
        let tracts = parse_polygon_collection(TRACTS).unwrap();
        assert_eq!(tracts.len(), 2);
        assert_eq!(tracts[0].boundary.0.len(), 1);
        assert_eq!(tracts[1].boundary.0.len(), 2);
        assert_eq!(
            tracts[0].properties["geoid"],
            AttributeValue::Text("55001950100".to_string())
        );
    }

    #[test]
    fn rejects_wrong_geometry_kind() {
        assert!(matches!(
            parse_point_collection(TRACTS),
            Err(GeoError::Conversion { .. })
        ));
        assert!(matches!(
            parse_polygon_collection(WELLS),
            Err(GeoError::Conversion { .. })
        ));
    }

    #[test]
    fn rejects_non_collection() {
        let single = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(
            parse_point_collection(single),
            Err(GeoError::Conversion { .. })
        ));
        assert!(matches!(
            parse_point_collection("not json"),
            Err(GeoError::GeoJson(_))
        ));
    }
}
