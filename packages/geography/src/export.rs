//! Converts grid cells into a `GeoJSON` `FeatureCollection`.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use nitrate_map_geography_models::{AttributeValue, GridCell, GridGeometry, Properties};

/// Builds a `FeatureCollection` from grid cells, one feature per cell.
#[must_use]
pub fn grid_to_feature_collection(cells: &[GridCell]) -> FeatureCollection {
    let features = cells
        .iter()
        .map(|cell| {
            let value = match &cell.geometry {
                GridGeometry::Point(point) => geojson::Value::from(point),
                GridGeometry::Polygon(polygon) => geojson::Value::from(polygon),
            };

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(value)),
                id: None,
                properties: Some(properties_to_json(&cell.properties)),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Converts [`Properties`] into a `GeoJSON` properties object.
///
/// Non-finite numbers become `null`.
#[must_use]
pub fn properties_to_json(properties: &Properties) -> JsonObject {
    properties
        .iter()
        .map(|(key, value)| {
            let json = match value {
                AttributeValue::Number(n) => number_to_json(*n),
                AttributeValue::Values(values) => {
                    JsonValue::Array(values.iter().copied().map(number_to_json).collect())
                }
                AttributeValue::Text(s) => JsonValue::String(s.clone()),
            };
            (key.clone(), json)
        })
        .collect()
}

fn number_to_json(n: f64) -> JsonValue {
    serde_json::Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
}
