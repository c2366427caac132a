//! Inverse-distance-weighted interpolation onto a lattice.

use geo::Point;
use nitrate_map_geography_models::{Attributed as _, GridCell, GridType, PointFeature, round4};

use crate::{DistanceMetric, SpatialError, lattice};

/// Parameters of a single interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationOptions {
    /// Lattice spacing in kilometers.
    pub cell_size_km: f64,
    /// IDW exponent.
    pub distance_decay: f64,
    /// Lattice layout.
    pub grid_type: GridType,
    /// Distance metric between lattice locations and samples.
    pub metric: DistanceMetric,
}

/// Interpolates `attribute` from `points` onto a lattice covering their
/// extent.
///
/// Each cell receives the IDW estimate at its center (or at the lattice
/// point itself), rounded to four decimal places, stored under
/// `attribute`. The input points are not modified.
///
/// # Errors
///
/// Returns [`SpatialError`] if there are no points, a point lacks the
/// attribute, a parameter is not a positive finite number, the points
/// span a degenerate extent, or the lattice has no cells.
pub fn interpolate(
    points: &[PointFeature],
    attribute: &str,
    options: &InterpolationOptions,
) -> Result<Vec<GridCell>, SpatialError> {
    check_positive("cell size", options.cell_size_km)?;
    check_positive("distance decay", options.distance_decay)?;

    let samples = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            point
                .number(attribute)
                .map(|value| (point.position, value))
                .ok_or_else(|| SpatialError::MissingAttribute {
                    index,
                    attribute: attribute.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let positions: Vec<Point<f64>> = samples.iter().map(|&(position, _)| position).collect();
    let extent = lattice::extent_of(&positions).ok_or_else(|| SpatialError::NoPoints {
        attribute: attribute.to_string(),
    })?;
    if extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(SpatialError::DegenerateExtent);
    }

    let geometries = lattice::build(&extent, options.cell_size_km, options.grid_type);
    if geometries.is_empty() {
        return Err(SpatialError::EmptyGrid {
            grid_type: options.grid_type,
            cell_size_km: options.cell_size_km,
        });
    }

    log::debug!(
        "Interpolating '{attribute}' from {} samples onto {} {} cells ({} km, decay {})",
        samples.len(),
        geometries.len(),
        options.grid_type,
        options.cell_size_km,
        options.distance_decay,
    );

    let cells = geometries
        .into_iter()
        .filter_map(|geometry| {
            let location = geometry.center()?;
            let value = idw(location, &samples, options.distance_decay, options.metric);
            Some(GridCell::new(geometry, attribute, round4(value)))
        })
        .collect();

    Ok(cells)
}

/// IDW estimate at `location` from `(position, value)` samples.
///
/// A sample at distance zero is returned as is. Weights are computed
/// relative to the nearest sample, `(d_min / d_i)^decay`, which equals
/// `d_i^-decay` up to a common factor but cannot underflow to zero for
/// large exponents.
///
/// `samples` must not be empty.
#[must_use]
pub fn idw(
    location: Point<f64>,
    samples: &[(Point<f64>, f64)],
    decay: f64,
    metric: DistanceMetric,
) -> f64 {
    let distances: Vec<f64> = samples
        .iter()
        .map(|&(position, _)| metric.distance(location, position))
        .collect();

    let mut nearest = f64::INFINITY;
    for (&d, &(_, value)) in distances.iter().zip(samples) {
        if d <= 0.0 {
            return value;
        }
        nearest = nearest.min(d);
    }

    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&d, &(_, value)) in distances.iter().zip(samples) {
        let weight = (nearest / d).powf(decay);
        weighted += weight * value;
        total += weight;
    }

    weighted / total
}

fn check_positive(name: &'static str, value: f64) -> Result<(), SpatialError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SpatialError::InvalidParameter { name, value })
    }
}
