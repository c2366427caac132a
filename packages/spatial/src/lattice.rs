//! Regular lattices over a geographic extent.
//!
//! Cell sizes are given in kilometers and converted to degrees separately
//! along each axis by measuring the extent's edges, so cells are square
//! (or regular) on the ground rather than in degree space. Every layout is
//! centered within the extent, leaving equal margins on opposite sides.

use geo::{BoundingRect as _, Coord, LineString, MultiPoint, Point, Polygon, Rect};
use nitrate_map_geography_models::{GridGeometry, GridType};

use crate::distance::haversine_km;

/// Bounding rectangle of `points`, or `None` for an empty slice.
#[must_use]
pub fn extent_of(points: &[Point<f64>]) -> Option<Rect<f64>> {
    MultiPoint::from(points.to_vec()).bounding_rect()
}

/// Builds the lattice of `grid_type` cells covering `extent`.
#[must_use]
pub fn build(extent: &Rect<f64>, cell_size_km: f64, grid_type: GridType) -> Vec<GridGeometry> {
    match grid_type {
        GridType::Hex => hex_lattice(extent, cell_size_km)
            .into_iter()
            .map(GridGeometry::Polygon)
            .collect(),
        GridType::Square => square_lattice(extent, cell_size_km)
            .into_iter()
            .map(GridGeometry::Polygon)
            .collect(),
        GridType::Point => point_lattice(extent, cell_size_km)
            .into_iter()
            .map(GridGeometry::Point)
            .collect(),
    }
}

/// Cell width and height in degrees for a ground distance of `km`,
/// measured along the south and west edges.
fn degree_steps(extent: &Rect<f64>, km: f64) -> (f64, f64) {
    let (min, max) = (extent.min(), extent.max());
    let width_km = haversine_km(Point::new(min.x, min.y), Point::new(max.x, min.y));
    let height_km = haversine_km(Point::new(min.x, min.y), Point::new(min.x, max.y));
    (
        km / width_km * extent.width(),
        km / height_km * extent.height(),
    )
}

/// Whole steps of `step` that fit in `span`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_steps(span: f64, step: f64) -> usize {
    let steps = (span / step).floor();
    if steps.is_finite() && steps > 0.0 {
        steps as usize
    } else {
        0
    }
}

/// Points spaced `cell_size_km` apart, inclusive of both ends of each axis.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn point_lattice(extent: &Rect<f64>, cell_size_km: f64) -> Vec<Point<f64>> {
    let (cell_width, cell_height) = degree_steps(extent, cell_size_km);
    let columns = whole_steps(extent.width(), cell_width);
    let rows = whole_steps(extent.height(), cell_height);
    let delta_x = (extent.width() - columns as f64 * cell_width) / 2.0;
    let delta_y = (extent.height() - rows as f64 * cell_height) / 2.0;
    let min = extent.min();

    let mut points = Vec::with_capacity((columns + 1) * (rows + 1));
    for column in 0..=columns {
        let x = (column as f64).mul_add(cell_width, min.x + delta_x);
        for row in 0..=rows {
            let y = (row as f64).mul_add(cell_height, min.y + delta_y);
            points.push(Point::new(x, y));
        }
    }
    points
}

/// Square cells with sides of `cell_size_km`, fully inside the extent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn square_lattice(extent: &Rect<f64>, cell_size_km: f64) -> Vec<Polygon<f64>> {
    let (cell_width, cell_height) = degree_steps(extent, cell_size_km);
    let columns = whole_steps(extent.width(), cell_width);
    let rows = whole_steps(extent.height(), cell_height);
    let delta_x = (extent.width() - columns as f64 * cell_width) / 2.0;
    let delta_y = (extent.height() - rows as f64 * cell_height) / 2.0;
    let min = extent.min();

    let mut cells = Vec::with_capacity(columns * rows);
    for column in 0..columns {
        let x = (column as f64).mul_add(cell_width, min.x + delta_x);
        for row in 0..rows {
            let y = (row as f64).mul_add(cell_height, min.y + delta_y);
            let ring = LineString::from(vec![
                (x, y),
                (x, y + cell_height),
                (x + cell_width, y + cell_height),
                (x + cell_width, y),
                (x, y),
            ]);
            cells.push(Polygon::new(ring, vec![]));
        }
    }
    cells
}

/// Flat-topped hexagons whose center-to-vertex radius is `cell_size_km`.
///
/// Columns are spaced three quarters of a hexagon width apart and odd
/// columns are shifted down by half a hexagon height. The radius is
/// measured across the extent's center lines.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn hex_lattice(extent: &Rect<f64>, cell_size_km: f64) -> Vec<Polygon<f64>> {
    let (min, max) = (extent.min(), extent.max());
    let center = extent.center();

    let width_km = haversine_km(Point::new(min.x, center.y), Point::new(max.x, center.y));
    let height_km = haversine_km(Point::new(center.x, min.y), Point::new(center.x, max.y));
    let cell_width = cell_size_km * 2.0 / width_km * extent.width();
    let cell_height = cell_size_km * 2.0 / height_km * extent.height();

    let radius = cell_width / 2.0;
    let hex_width = radius * 2.0;
    let hex_height = 3f64.sqrt() / 2.0 * cell_height;
    let box_width = extent.width();
    let box_height = extent.height();

    let x_interval = 0.75 * hex_width;
    let y_interval = hex_height;

    let x_span = (box_width - hex_width) / (hex_width - radius / 2.0);
    let y_span = (box_height - hex_height) / hex_height;
    if !(x_span.is_finite() && y_span.is_finite()) || x_span < 0.0 || y_span < 0.0 {
        return Vec::new();
    }
    let x_count = x_span.floor();
    let y_count = y_span.floor();

    let x_adjust =
        (x_count.mul_add(x_interval, -radius / 2.0) - box_width) / 2.0 - radius / 2.0
            + x_interval / 2.0;
    let mut y_adjust = y_count.mul_add(-hex_height, box_height) / 2.0;
    let has_offset_y = y_count.mul_add(hex_height, -box_height) > hex_height / 2.0;
    if has_offset_y {
        y_adjust -= hex_height / 4.0;
    }

    let unit: Vec<(f64, f64)> = (0..6_i32)
        .map(|i| {
            let angle = std::f64::consts::FRAC_PI_3 * f64::from(i);
            (angle.cos(), angle.sin())
        })
        .collect();

    let (x_count, y_count) = (x_count as usize, y_count as usize);
    let mut cells = Vec::with_capacity((x_count + 1) * (y_count + 1));
    for x in 0..=x_count {
        let is_odd = x % 2 == 1;
        for y in 0..=y_count {
            if y == 0 && (is_odd || has_offset_y) {
                continue;
            }

            let cx = (x as f64).mul_add(x_interval, min.x) - x_adjust;
            let mut cy = (y as f64).mul_add(y_interval, min.y) + y_adjust;
            if is_odd {
                cy -= hex_height / 2.0;
            }

            cells.push(hexagon(cx, cy, cell_width / 2.0, cell_height / 2.0, &unit));
        }
    }
    cells
}

fn hexagon(cx: f64, cy: f64, rx: f64, ry: f64, unit: &[(f64, f64)]) -> Polygon<f64> {
    let mut ring: Vec<Coord<f64>> = unit
        .iter()
        .map(|&(cos, sin)| Coord {
            x: rx.mul_add(cos, cx),
            y: ry.mul_add(sin, cy),
        })
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString::from(ring), vec![])
}
