//! Joins a secondary grid onto a primary polygon grid.
//!
//! Primary cells are loaded into an R-tree keyed by their envelopes. Each
//! secondary location is matched against the envelopes it falls in and
//! then checked exactly against the cell polygon. A location on an edge
//! shared by two cells counts for both.

use geo::{BoundingRect as _, Intersects as _, Polygon};
use nitrate_map_geography_models::{
    AttributeValue, Attributed as _, GridCell, GridGeometry, round4,
};
use rstar::{AABB, RTree, RTreeObject};

use crate::SpatialError;

/// Attribute names used by [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAttributes<'a> {
    /// Attribute read from each secondary cell.
    pub source: &'a str,
    /// Attribute receiving the mean on each primary cell.
    pub target: &'a str,
    /// Attribute receiving the list of collected values on each primary cell.
    pub collected: &'a str,
}

/// Counts of primary cells with and without an aggregated value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Cells that received at least one secondary value.
    pub matched: usize,
    /// Cells that received none and carry no target attribute.
    pub missing: usize,
}

/// A primary cell's envelope, pointing back at the cell by index.
struct CellEntry<'a> {
    index: usize,
    polygon: &'a Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CellEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Collects `attrs.source` values from `secondary` into the `primary`
/// cells containing them, then stores each cell's mean (rounded to four
/// places) under `attrs.target` and the collected list under
/// `attrs.collected`.
///
/// Previous target and collected attributes are removed from every
/// primary cell first, so repeated calls never see stale values. Cells
/// without any match end up with neither attribute. Secondary cells
/// lacking the source attribute are ignored.
///
/// # Errors
///
/// Returns [`SpatialError::PointPrimaryGrid`] if any primary cell is a
/// point.
pub fn aggregate(
    primary: &mut [GridCell],
    secondary: &[GridCell],
    attrs: &JoinAttributes<'_>,
) -> Result<AggregateSummary, SpatialError> {
    for cell in primary.iter_mut() {
        cell.clear(attrs.target);
        cell.clear(attrs.collected);
    }

    let collected = collect_values(primary, secondary, attrs.source)?;

    let mut summary = AggregateSummary::default();
    for (cell, values) in primary.iter_mut().zip(collected) {
        if values.is_empty() {
            summary.missing += 1;
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        cell.set_number(attrs.target, round4(mean));
        cell.properties_mut()
            .insert(attrs.collected.to_string(), AttributeValue::Values(values));
        summary.matched += 1;
    }

    log::debug!(
        "Aggregated '{}' into '{}': {} cells matched, {} missing",
        attrs.source,
        attrs.target,
        summary.matched,
        summary.missing
    );

    Ok(summary)
}

/// Per-primary-cell lists of secondary values, in secondary order.
fn collect_values(
    primary: &[GridCell],
    secondary: &[GridCell],
    source: &str,
) -> Result<Vec<Vec<f64>>, SpatialError> {
    let entries = primary
        .iter()
        .enumerate()
        .map(|(index, cell)| match &cell.geometry {
            GridGeometry::Polygon(polygon) => Ok(CellEntry {
                index,
                polygon,
                envelope: compute_envelope(polygon),
            }),
            GridGeometry::Point(_) => Err(SpatialError::PointPrimaryGrid),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let tree = RTree::bulk_load(entries);

    let mut collected = vec![Vec::new(); primary.len()];
    for cell in secondary {
        let (Some(value), Some(location)) = (cell.number(source), cell.geometry.center()) else {
            continue;
        };

        let query_env = AABB::from_point([location.x(), location.y()]);
        for entry in tree.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.intersects(&location) {
                collected[entry.index].push(value);
            }
        }
    }

    Ok(collected)
}

fn compute_envelope(polygon: &Polygon<f64>) -> AABB<[f64; 2]> {
    polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;

    const ATTRS: JoinAttributes<'static> = JoinAttributes {
        source: "canrate",
        target: "canrate",
        collected: "values",
    };

    fn square(x0: f64, y0: f64) -> GridCell {
        let ring = LineString::from(vec![
            (x0, y0),
            (x0, y0 + 1.0),
            (x0 + 1.0, y0 + 1.0),
            (x0 + 1.0, y0),
            (x0, y0),
        ]);
        GridCell::new(GridGeometry::Polygon(Polygon::new(ring, vec![])), "nitconc", 1.0)
    }

    fn point(x: f64, y: f64, rate: f64) -> GridCell {
        GridCell::new(GridGeometry::Point(Point::new(x, y)), "canrate", rate)
    }

    fn secondary() -> Vec<GridCell> {
        vec![
            point(0.25, 0.25, 0.1),
            point(0.75, 0.75, 0.2),
            point(1.5, 0.5, 0.4),
            point(9.0, 9.0, 0.9),
        ]
    }

    #[test]
    fn collects_and_averages_values() {
        let mut primary = vec![square(0.0, 0.0), square(1.0, 0.0), square(5.0, 5.0)];
        let summary = aggregate(&mut primary, &secondary(), &ATTRS).unwrap();

        assert_eq!(summary, AggregateSummary { matched: 2, missing: 1 });
        assert_eq!(primary[0].number("canrate"), Some(0.15));
        assert_eq!(
            primary[0].properties["values"].as_values(),
            Some(&[0.1, 0.2][..])
        );
        assert_eq!(primary[1].number("canrate"), Some(0.4));
    }

    #[test]
    fn unmatched_cells_have_no_value() {
        let mut primary = vec![square(5.0, 5.0)];
        aggregate(&mut primary, &secondary(), &ATTRS).unwrap();
        assert!(!primary[0].properties.contains_key("canrate"));
        assert!(!primary[0].properties.contains_key("values"));
        assert_eq!(primary[0].number("nitconc"), Some(1.0));
    }

    #[test]
    fn shared_edge_counts_for_both_cells() {
        let mut primary = vec![square(0.0, 0.0), square(1.0, 0.0)];
        aggregate(&mut primary, &[point(1.0, 0.5, 0.3)], &ATTRS).unwrap();
        assert_eq!(primary[0].number("canrate"), Some(0.3));
        assert_eq!(primary[1].number("canrate"), Some(0.3));
    }

    #[test]
    fn repeated_runs_are_idempotent_and_clear_stale_values() {
        let mut primary = vec![square(0.0, 0.0), square(1.0, 0.0), square(5.0, 5.0)];
        primary[2].set_number("canrate", 42.0);
        primary[2]
            .properties
            .insert("values".to_string(), AttributeValue::Values(vec![42.0]));

        let first = aggregate(&mut primary, &secondary(), &ATTRS).unwrap();
        let snapshot = primary.clone();
        let second = aggregate(&mut primary, &secondary(), &ATTRS).unwrap();

        assert_eq!(first, second);
        assert_eq!(primary, snapshot);
        assert!(!primary[2].properties.contains_key("canrate"));
        assert!(!primary[2].properties.contains_key("values"));
    }

    #[test]
    fn point_primary_is_rejected() {
        let mut primary = vec![point(0.0, 0.0, 0.1)];
        assert!(matches!(
            aggregate(&mut primary, &secondary(), &ATTRS),
            Err(SpatialError::PointPrimaryGrid)
        ));
    }
}
