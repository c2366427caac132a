//! Pipeline configuration.
//!
//! The defaults live in `config/default.toml` and are embedded at compile
//! time. A deployment can load a full replacement file instead.

use std::path::Path;

use nitrate_map_geography_models::GridType;
use nitrate_map_spatial::DistanceMetric;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Inclusive bounds for a user parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
}

impl ParameterRange {
    /// Whether `value` is finite and within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Accepted ranges for the two run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRanges {
    /// IDW exponent.
    pub distance_decay: ParameterRange,
    /// Lattice spacing in kilometers.
    pub cell_size_km: ParameterRange,
}

/// Attribute names read and written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeNames {
    /// Well attribute interpolated onto the primary grid (independent).
    pub primary: String,
    /// Tract attribute interpolated onto the secondary grid (dependent).
    pub secondary: String,
    /// List of secondary values collected into each primary cell.
    pub collected: String,
    /// Predicted dependent value.
    pub predicted: String,
    /// Observed minus predicted.
    pub residual: String,
}

/// Lattice layouts and distance metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Layout of the grid the surface is drawn on.
    pub primary: GridType,
    /// Layout of the grid joined into the primary grid.
    pub secondary: GridType,
    /// Distance metric for interpolation.
    pub metric: DistanceMetric,
}

/// Class counts and residual break multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSettings {
    /// Classes for the tract and well layers.
    pub sample: usize,
    /// Classes for the interpolated grid layers.
    pub surface: usize,
    /// Standard deviation multiples used as residual breaks.
    pub residual_multiples: Vec<f64>,
}

/// Adjustments applied once when inputs are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingSettings {
    /// Decimal places the primary well attribute is rounded to.
    pub primary_precision: i32,
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Accepted parameter ranges.
    pub parameters: ParameterRanges,
    /// Attribute names.
    pub attributes: AttributeNames,
    /// Grid layouts.
    pub grids: GridSettings,
    /// Classification settings.
    pub classes: ClassSettings,
    /// Load-time settings.
    pub loading: LoadingSettings,
}

impl PipelineConfig {
    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the embedded file does not
    /// parse or validate.
    pub fn embedded() -> Result<Self, PipelineError> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] on a parse or validation failure.
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::de::from_str(input).map_err(|e| PipelineError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file cannot be read, parsed,
    /// or validated.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let input = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        log::info!("Loading pipeline configuration from {}", path.display());
        Self::from_toml(&input)
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, range) in [
            ("distance_decay", &self.parameters.distance_decay),
            ("cell_size_km", &self.parameters.cell_size_km),
        ] {
            if !(range.min.is_finite() && range.max.is_finite())
                || range.min <= 0.0
                || range.max < range.min
            {
                return Err(config_error(format!(
                    "parameters.{name} must satisfy 0 < min <= max, got [{}, {}]",
                    range.min, range.max
                )));
            }
        }

        let attributes = &self.attributes;
        for (name, value) in [
            ("primary", &attributes.primary),
            ("secondary", &attributes.secondary),
            ("collected", &attributes.collected),
            ("predicted", &attributes.predicted),
            ("residual", &attributes.residual),
        ] {
            if value.trim().is_empty() {
                return Err(config_error(format!("attributes.{name} must not be empty")));
            }
        }

        if self.grids.primary == GridType::Point {
            return Err(config_error(
                "grids.primary must be a polygon layout (hex or square)".to_string(),
            ));
        }

        if self.classes.sample == 0 || self.classes.surface == 0 {
            return Err(config_error(
                "classes.sample and classes.surface must be at least 1".to_string(),
            ));
        }

        let multiples = &self.classes.residual_multiples;
        if multiples.iter().any(|m| !m.is_finite()) || !multiples.windows(2).all(|w| w[0] < w[1])
        {
            return Err(config_error(
                "classes.residual_multiples must be finite and strictly ascending".to_string(),
            ));
        }

        if !(0..=15).contains(&self.loading.primary_precision) {
            return Err(config_error(format!(
                "loading.primary_precision must be between 0 and 15, got {}",
                self.loading.primary_precision
            )));
        }

        Ok(())
    }
}

const fn config_error(message: String) -> PipelineError {
    PipelineError::Config { message }
}
