#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `GeoJSON` loading and export for the nitrate/cancer surface.
//!
//! Reads the census tract and test well feature collections into the
//! shared model types, derives the working copies the pipeline operates
//! on (tract centroids, rounded well samples), and converts computed grid
//! cells back into a `GeoJSON` `FeatureCollection` for the renderer.

pub mod export;
pub mod load;
pub mod parse;
pub mod working;

use std::path::PathBuf;

use thiserror::Error;

pub use load::{InputData, load_inputs};

/// Errors that can occur while loading or converting features.
#[derive(Debug, Error)]
pub enum GeoError {
    /// An input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `GeoJSON` parsing or geometry conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(Box<geojson::Error>),

    /// A feature has an unexpected shape or is missing data.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<geojson::Error> for GeoError {
    fn from(e: geojson::Error) -> Self {
        Self::GeoJson(Box::new(e))
    }
}
