#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial interpolation and grid aggregation.
//!
//! Builds regular lattices (hexagons, squares, or bare points) over the
//! extent of a sample set, fills them by inverse-distance weighting, and
//! joins a secondary point grid onto a primary polygon grid using an
//! R-tree of cell envelopes with exact point-in-polygon checks.

pub mod aggregate;
pub mod distance;
pub mod interpolate;
pub mod lattice;

use nitrate_map_geography_models::GridType;
use thiserror::Error;

pub use aggregate::{AggregateSummary, JoinAttributes, aggregate};
pub use distance::DistanceMetric;
pub use interpolate::{InterpolationOptions, interpolate};

/// Errors that can occur during interpolation or aggregation.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// No sample points were supplied.
    #[error("No sample points to interpolate '{attribute}' from")]
    NoPoints {
        /// Attribute being interpolated.
        attribute: String,
    },

    /// A sample point lacks the interpolated attribute.
    #[error("Sample point {index} has no numeric '{attribute}' attribute")]
    MissingAttribute {
        /// Position of the point in the input.
        index: usize,
        /// Attribute being interpolated.
        attribute: String,
    },

    /// A numeric parameter is non-finite or not positive.
    #[error("Invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// The samples span zero width or zero height.
    #[error("Sample extent has zero width or height")]
    DegenerateExtent,

    /// The lattice produced no cells (extent smaller than one cell).
    #[error("{grid_type} lattice with {cell_size_km} km cells has no cells for this extent")]
    EmptyGrid {
        /// Requested lattice layout.
        grid_type: GridType,
        /// Requested cell size.
        cell_size_km: f64,
    },

    /// The primary grid of an aggregation must consist of polygons.
    #[error("Aggregation target grid contains point cells; polygon cells are required")]
    PointPrimaryGrid,
}
