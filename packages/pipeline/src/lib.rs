#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The nitrate / cancer rate analysis session.
//!
//! A [`Session`] owns the loaded tracts and wells plus the working copies
//! derived from them, and turns a pair of user parameters into a
//! [`Surface`]: an interpolated nitrate grid joined with interpolated
//! cancer rates, a regression between the two, and class breaks for every
//! layer. Runs are all-or-nothing; a failed run leaves the previous
//! surface (or the idle state) exactly as it was.

pub mod config;
pub mod progress;
pub mod stages;

use std::sync::Arc;

use nitrate_map_analytics::{AnalyticsError, breaks::compute_feature_breaks};
use nitrate_map_geography::{
    GeoError, InputData, export,
    working::{require_attribute, rounded_copy, tract_centroids},
};
use nitrate_map_geography_models::{PointFeature, PolygonFeature};
use nitrate_map_pipeline_models::{
    ErrorKind, ErrorReport, Layer, LayerBreaks, PipelineParams, RegressionSummary, SessionState,
    SurfaceSnapshot,
};
use nitrate_map_spatial::SpatialError;
use thiserror::Error;

pub use config::PipelineConfig;
pub use progress::{NullProgress, ProgressCallback, Stage, null_progress};
pub use stages::Surface;

/// Errors that can occur in a session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A user parameter is outside its accepted range.
    #[error("Invalid {name}: {value} (expected a number between {min} and {max})")]
    Validation {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// A run was requested while another was in progress.
    #[error("A calculation is already running")]
    Busy,

    /// Interpolation or aggregation failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// Classification or regression failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Input data could not be loaded or is incomplete.
    #[error(transparent)]
    Input(#[from] GeoError),

    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl PipelineError {
    /// Category reported to the renderer.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Busy => ErrorKind::Busy,
            Self::Spatial(_) => ErrorKind::Spatial,
            Self::Analytics(
                AnalyticsError::InsufficientData { .. } | AnalyticsError::InvalidClassCount { .. },
            ) => ErrorKind::InsufficientData,
            Self::Analytics(
                AnalyticsError::InsufficientSamples { .. }
                | AnalyticsError::DegenerateSamples { .. },
            ) => ErrorKind::InsufficientSamples,
            Self::Input(_) => ErrorKind::Input,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// The error as it crosses the core boundary.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<&PipelineError> for ErrorReport {
    fn from(error: &PipelineError) -> Self {
        error.report()
    }
}

/// One analysis session over a fixed pair of input datasets.
pub struct Session {
    config: PipelineConfig,
    progress: Arc<dyn ProgressCallback>,
    tracts: Vec<PolygonFeature>,
    wells: Vec<PointFeature>,
    centroids: Vec<PointFeature>,
    rounded_wells: Vec<PointFeature>,
    sample_breaks: Vec<LayerBreaks>,
    state: SessionState,
    surface: Option<Surface>,
}

impl Session {
    /// Starts a session over `inputs`.
    ///
    /// Derives the tract centroid and rounded well working copies and
    /// computes breaks for the two sample layers.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for an inconsistent configuration,
    /// [`PipelineError::Input`] if a tract or well lacks its attribute or a
    /// centroid cannot be derived, and [`PipelineError::Analytics`] if a
    /// sample layer has too few distinct values to classify.
    pub fn new(
        inputs: InputData,
        config: PipelineConfig,
        progress: Arc<dyn ProgressCallback>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let InputData { tracts, wells } = inputs;
        let attrs = &config.attributes;

        require_attribute(&tracts, &attrs.secondary, "Tract")?;
        require_attribute(&wells, &attrs.primary, "Well")?;

        let centroids = tract_centroids(&tracts)?;
        let rounded_wells = rounded_copy(&wells, &attrs.primary, config.loading.primary_precision);

        let sample_breaks = vec![
            LayerBreaks {
                layer: Layer::TractRate,
                breaks: compute_feature_breaks(&tracts, &attrs.secondary, config.classes.sample)?,
            },
            LayerBreaks {
                layer: Layer::WellNitrate,
                breaks: compute_feature_breaks(
                    &rounded_wells,
                    &attrs.primary,
                    config.classes.sample,
                )?,
            },
        ];

        log::info!(
            "Session ready with {} tracts and {} wells",
            tracts.len(),
            wells.len()
        );

        Ok(Self {
            config,
            progress,
            tracts,
            wells,
            centroids,
            rounded_wells,
            sample_breaks,
            state: SessionState::Idle,
            surface: None,
        })
    }

    /// Checks raw user input against the configured parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] naming the first parameter
    /// that is non-finite or out of range.
    pub fn validate(
        &self,
        distance_decay: f64,
        cell_size_km: f64,
    ) -> Result<PipelineParams, PipelineError> {
        let ranges = &self.config.parameters;
        for (name, value, range) in [
            ("distance decay", distance_decay, &ranges.distance_decay),
            ("cell size", cell_size_km, &ranges.cell_size_km),
        ] {
            if !range.contains(value) {
                return Err(PipelineError::Validation {
                    name,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(PipelineParams {
            distance_decay,
            cell_size_km,
        })
    }

    /// Computes a new surface with `params`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if a run is in progress,
    /// [`PipelineError::Validation`] for out-of-range parameters, or the
    /// error of the first failing stage. On error the session keeps its
    /// previous state and surface.
    pub fn run(&mut self, params: PipelineParams) -> Result<&Surface, PipelineError> {
        if self.state == SessionState::Running {
            return Err(PipelineError::Busy);
        }
        let params = self.validate(params.distance_decay, params.cell_size_km)?;

        log::info!(
            "Calculating surface (distance decay {}, cell size {} km)",
            params.distance_decay,
            params.cell_size_km
        );
        let previous = self.state;
        self.state = SessionState::Running;

        match stages::compute_surface(
            &self.rounded_wells,
            &self.centroids,
            &self.config,
            params,
            self.progress.as_ref(),
        ) {
            Ok(surface) => {
                self.progress.finish(format!(
                    "Surface ready: {} cells, {}",
                    surface.grid.len(),
                    surface.regression.equation()
                ));
                self.state = SessionState::Ready;
                Ok(self.surface.insert(surface))
            }
            Err(e) => {
                self.progress.finish_and_clear();
                self.state = previous;
                log::warn!("Calculation failed, keeping previous state ({previous}): {e}");
                Err(e)
            }
        }
    }

    /// Discards the surface and returns to [`SessionState::Idle`].
    ///
    /// Inputs, working copies, and sample breaks are kept.
    pub fn reset(&mut self) {
        if self.surface.take().is_some() {
            log::info!("Surface discarded");
        }
        self.state = SessionState::Idle;
    }

    /// Whether the current surface was computed with exactly `params`.
    #[must_use]
    pub fn is_current(&self, params: PipelineParams) -> bool {
        self.state == SessionState::Ready
            && self.surface.as_ref().is_some_and(|s| s.params == params)
    }

    /// Serializable view of the session for the renderer.
    #[must_use]
    pub fn snapshot(&self) -> SurfaceSnapshot {
        let mut breaks = self.sample_breaks.clone();
        if let Some(surface) = &self.surface {
            breaks.extend(surface.breaks.iter().cloned());
        }

        SurfaceSnapshot {
            state: self.state,
            params: self.surface.as_ref().map(|s| s.params),
            grid: self
                .surface
                .as_ref()
                .map(|s| export::grid_to_feature_collection(&s.grid)),
            breaks,
            regression: self
                .surface
                .as_ref()
                .map(|s| RegressionSummary::new(&s.regression, s.missing_cells)),
        }
    }

    /// Replaces the progress reporter used by later runs.
    pub fn set_progress(&mut self, progress: Arc<dyn ProgressCallback>) {
        self.progress = progress;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The current surface, if any.
    #[must_use]
    pub const fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Breaks for the tract and well layers.
    #[must_use]
    pub fn sample_breaks(&self) -> &[LayerBreaks] {
        &self.sample_breaks
    }

    /// Tracts as loaded.
    #[must_use]
    pub fn tracts(&self) -> &[PolygonFeature] {
        &self.tracts
    }

    /// Wells as loaded.
    #[must_use]
    pub fn wells(&self) -> &[PointFeature] {
        &self.wells
    }

    /// Tract centroids carrying the tract attributes.
    #[must_use]
    pub fn centroids(&self) -> &[PointFeature] {
        &self.centroids
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
