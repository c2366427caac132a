#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature, attribute, and grid cell types.
//!
//! These types carry the two input datasets (census tract polygons and
//! test well points) and the grids produced from them by interpolation.
//! Every feature owns a flat attribute map; derived values such as the
//! aggregated cancer rate or the regression residual are added to that
//! map as the pipeline runs.

use std::collections::BTreeMap;

use geo::{Centroid, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Well attribute holding the nitrate concentration (ppm).
pub const NITRATE_ATTR: &str = "nitconc";

/// Tract attribute holding the cancer rate (fraction in `[0, 1]`).
pub const CANCER_RATE_ATTR: &str = "canrate";

/// Grid attribute holding the secondary values collected into a cell.
pub const COLLECTED_ATTR: &str = "values";

/// Grid attribute holding the regression prediction.
pub const PREDICTED_ATTR: &str = "canrate_predicted";

/// Grid attribute holding observed minus predicted.
pub const RESIDUAL_ATTR: &str = "residual";

/// Decimal places kept for interpolated, aggregated, and fitted values.
pub const VALUE_PRECISION: i32 = 4;

/// Rounds `value` to `decimals` decimal places (half away from zero).
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds `value` to [`VALUE_PRECISION`] decimal places.
#[must_use]
pub fn round4(value: f64) -> f64 {
    round_to(value, VALUE_PRECISION)
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A numeric value.
    Number(f64),
    /// A list of numeric values (e.g. values collected by a spatial join).
    Values(Vec<f64>),
    /// A text value (identifiers, names).
    Text(String),
}

impl AttributeValue {
    /// Returns the numeric value, parsing numeric text if necessary.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Values(_) => None,
        }
    }

    /// Returns the list of values, if this is a list.
    #[must_use]
    pub fn as_values(&self) -> Option<&[f64]> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Values(values)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Named attributes of a feature, ordered by name.
pub type Properties = BTreeMap<String, AttributeValue>;

/// Anything that carries a [`Properties`] map.
///
/// The numeric accessors treat non-finite numbers as missing so that
/// downstream statistics never see `NaN` or infinities.
pub trait Attributed {
    /// The feature's attributes.
    fn properties(&self) -> &Properties;

    /// Mutable access to the feature's attributes.
    fn properties_mut(&mut self) -> &mut Properties;

    /// Returns the finite numeric value of `name`, if present.
    fn number(&self, name: &str) -> Option<f64> {
        self.properties()
            .get(name)
            .and_then(AttributeValue::as_f64)
            .filter(|v| v.is_finite())
    }

    /// Sets `name` to a numeric value, replacing any previous value.
    fn set_number(&mut self, name: &str, value: f64) {
        self.properties_mut()
            .insert(name.to_string(), AttributeValue::Number(value));
    }

    /// Removes `name`, returning its previous value.
    fn clear(&mut self, name: &str) -> Option<AttributeValue> {
        self.properties_mut().remove(name)
    }
}

/// A point sample, e.g. a test well or a tract centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    /// Longitude/latitude of the sample.
    pub position: Point<f64>,
    /// Sample attributes.
    pub properties: Properties,
}

impl PointFeature {
    /// Creates a point feature at `(lon, lat)`.
    #[must_use]
    pub fn new(lon: f64, lat: f64, properties: Properties) -> Self {
        Self {
            position: Point::new(lon, lat),
            properties,
        }
    }
}

impl Attributed for PointFeature {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

/// A polygon feature, e.g. a census tract boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    /// Boundary rings. Single polygons are stored as one-member multipolygons.
    pub boundary: MultiPolygon<f64>,
    /// Tract attributes.
    pub properties: Properties,
}

impl Attributed for PolygonFeature {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

/// Lattice layout produced by the interpolator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GridType {
    /// Flat-topped hexagonal cells.
    Hex,
    /// Square cells.
    Square,
    /// Bare lattice points.
    Point,
}

/// Geometry of a single grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum GridGeometry {
    /// A lattice point (point-grid mode).
    Point(Point<f64>),
    /// A closed hexagon or square.
    Polygon(Polygon<f64>),
}

impl GridGeometry {
    /// The location used for distance calculations and spatial joins:
    /// the point itself, or the polygon centroid.
    #[must_use]
    pub fn center(&self) -> Option<Point<f64>> {
        match self {
            Self::Point(point) => Some(*point),
            Self::Polygon(polygon) => polygon
                .centroid()
                .or_else(|| polygon.exterior().points().next()),
        }
    }
}

/// One cell of an interpolated grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// Cell geometry.
    pub geometry: GridGeometry,
    /// Interpolated value plus any derived attributes.
    pub properties: Properties,
}

impl GridCell {
    /// Creates a cell holding a single attribute.
    #[must_use]
    pub fn new(geometry: GridGeometry, attribute: &str, value: f64) -> Self {
        let mut properties = Properties::new();
        properties.insert(attribute.to_string(), AttributeValue::Number(value));
        Self {
            geometry,
            properties,
        }
    }
}

impl Attributed for GridCell {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}
