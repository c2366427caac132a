#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Classification and regression over feature attributes.
//!
//! [`breaks`] derives natural-breaks (ckmeans) and standard-deviation class
//! boundaries, [`regression`] fits and applies an ordinary least squares
//! line relating two attributes of the same features. Features missing an
//! attribute are left out of both, never treated as zero.

pub mod breaks;
pub mod regression;
pub mod stats;

use thiserror::Error;

/// Errors that can occur during classification or regression.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Fewer distinct values than requested classes.
    #[error(
        "Cannot form {class_count} classes for '{attribute}' from {distinct} distinct values"
    )]
    InsufficientData {
        /// Attribute being classified.
        attribute: String,
        /// Requested class count.
        class_count: usize,
        /// Distinct finite values available.
        distinct: usize,
    },

    /// A class count of zero was requested.
    #[error("Class count for '{attribute}' must be at least 1")]
    InvalidClassCount {
        /// Attribute being classified.
        attribute: String,
    },

    /// Fewer than two paired samples.
    #[error(
        "Regressing '{dependent}' on '{independent}' needs at least 2 paired samples, found {found}"
    )]
    InsufficientSamples {
        /// Independent attribute.
        independent: String,
        /// Dependent attribute.
        dependent: String,
        /// Paired samples available.
        found: usize,
    },

    /// Every sample has the same independent value, so the slope is undefined.
    #[error("All {count} samples share one '{independent}' value; slope is undefined")]
    DegenerateSamples {
        /// Independent attribute.
        independent: String,
        /// Paired samples available.
        count: usize,
    },
}
