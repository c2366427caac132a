//! Asynchronous loading of the two input datasets.
//!
//! Both files are read concurrently and both must succeed; a failure of
//! either aborts loading rather than producing a partial session.

use std::path::Path;

use nitrate_map_geography_models::{PointFeature, PolygonFeature};

use crate::GeoError;
use crate::parse::{parse_point_collection, parse_polygon_collection};

/// The raw input collections, exactly as loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    /// Census tract polygons.
    pub tracts: Vec<PolygonFeature>,
    /// Test well points.
    pub wells: Vec<PointFeature>,
}

/// Loads the tract and well feature collections.
///
/// # Errors
///
/// Returns [`GeoError`] if either file cannot be read or parsed.
pub async fn load_inputs(tracts_path: &Path, wells_path: &Path) -> Result<InputData, GeoError> {
    log::info!(
        "Loading tracts from {} and wells from {}",
        tracts_path.display(),
        wells_path.display()
    );

    let (tracts_json, wells_json) =
        tokio::try_join!(read_file(tracts_path), read_file(wells_path))?;

    let tracts = parse_polygon_collection(&tracts_json)?;
    log::info!("Loaded {} census tracts", tracts.len());

    let wells = parse_point_collection(&wells_json)?;
    log::info!("Loaded {} test wells", wells.len());

    Ok(InputData { tracts, wells })
}

async fn read_file(path: &Path) -> Result<String, GeoError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GeoError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nitrate_map_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn loads_both_collections() {
        let tracts_path = temp_path("tracts.json");
        let wells_path = temp_path("wells.json");
        std::fs::write(
            &tracts_path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"geoid": "1", "canrate": 0.1},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            &wells_path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"id": 1, "nitconc": 2.0},
                 "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}
            ]}"#,
        )
        .unwrap();

        let data = load_inputs(&tracts_path, &wells_path).await.unwrap();
        assert_eq!(data.tracts.len(), 1);
        assert_eq!(data.wells.len(), 1);

        std::fs::remove_file(tracts_path).ok();
        std::fs::remove_file(wells_path).ok();
    }

    #[tokio::test]
    async fn missing_file_aborts_loading() {
        let wells_path = temp_path("present_wells.json");
        std::fs::write(&wells_path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        let result = load_inputs(&temp_path("does_not_exist.json"), &wells_path).await;
        assert!(matches!(result, Err(GeoError::Read { .. })));

        std::fs::remove_file(wells_path).ok();
    }
}
