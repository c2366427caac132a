//! Working copies derived from the raw input collections.
//!
//! The pipeline never touches the loaded features directly. Tract
//! centroids and rounded well samples are fresh collections with their
//! own attribute maps, so derived values written to them cannot leak back
//! into the source data.

use geo::{Coord, LineString, MultiPolygon, Point};
use nitrate_map_geography_models::{Attributed, PointFeature, PolygonFeature, round_to};

use crate::GeoError;

/// Derives one centroid point per tract, carrying a copy of the tract's
/// attributes.
///
/// The centroid is the mean of the boundary vertices, not the area
/// centroid.
///
/// # Errors
///
/// Returns [`GeoError::Conversion`] if a tract has an empty boundary.
pub fn tract_centroids(tracts: &[PolygonFeature]) -> Result<Vec<PointFeature>, GeoError> {
    tracts
        .iter()
        .enumerate()
        .map(|(index, tract)| {
            let position = vertex_mean(&tract.boundary).ok_or_else(|| GeoError::Conversion {
                message: format!("Tract {index} has an empty boundary"),
            })?;

            Ok(PointFeature {
                position,
                properties: tract.properties.clone(),
            })
        })
        .collect()
}

/// Mean of every ring vertex across `boundary`, counting each closed ring's
/// repeated first vertex once.
fn vertex_mean(boundary: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let mut count = 0_u32;
    let (mut x, mut y) = (0.0, 0.0);

    for ring in boundary
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
    {
        for coord in open_ring(ring) {
            x += coord.x;
            y += coord.y;
            count += 1;
        }
    }

    (count > 0).then(|| Point::new(x / f64::from(count), y / f64::from(count)))
}

fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    let coords = ring.0.as_slice();
    if ring.is_closed() && coords.len() > 1 {
        &coords[..coords.len() - 1]
    } else {
        coords
    }
}

/// Copies `points`, rounding `attribute` to `decimals` places where present.
#[must_use]
pub fn rounded_copy(points: &[PointFeature], attribute: &str, decimals: i32) -> Vec<PointFeature> {
    points
        .iter()
        .map(|point| {
            let mut copy = point.clone();
            if let Some(value) = copy.number(attribute) {
                copy.set_number(attribute, round_to(value, decimals));
            }
            copy
        })
        .collect()
}

/// Checks that every feature carries a finite numeric `attribute`.
///
/// # Errors
///
/// Returns [`GeoError::Conversion`] naming the first offending feature.
pub fn require_attribute<F: Attributed>(
    features: &[F],
    attribute: &str,
    layer: &str,
) -> Result<(), GeoError> {
    match features.iter().position(|f| f.number(attribute).is_none()) {
        Some(index) => Err(GeoError::Conversion {
            message: format!("{layer} feature {index} has no numeric '{attribute}' attribute"),
        }),
        None => Ok(()),
    }
}
