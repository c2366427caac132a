#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types shared between the pipeline session and whatever renders it.
//!
//! A [`SurfaceSnapshot`] is everything a map front end needs after a run:
//! the session state and parameters, the grid as a `GeoJSON` feature
//! collection, class breaks per layer, and a summary of the regression.
//! Failures cross the same boundary as an [`ErrorReport`].

use nitrate_map_analytics_models::{ClassBreaks, RegressionResult};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle of a pipeline session.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum SessionState {
    /// Inputs loaded, no surface computed.
    #[default]
    Idle,
    /// A run is in progress.
    Running,
    /// A surface is available.
    Ready,
}

/// Validated user parameters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineParams {
    /// IDW exponent.
    pub distance_decay: f64,
    /// Lattice spacing in kilometers.
    pub cell_size_km: f64,
}

/// A classified layer the renderer draws.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Layer {
    /// Cancer rate of the census tracts.
    TractRate,
    /// Nitrate concentration of the wells.
    WellNitrate,
    /// Interpolated nitrate on the grid.
    GridNitrate,
    /// Aggregated cancer rate on the grid.
    GridRate,
    /// Regression residual on the grid.
    GridResidual,
}

/// Class breaks for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerBreaks {
    /// Layer the breaks apply to.
    pub layer: Layer,
    /// Attribute and break values.
    pub breaks: ClassBreaks,
}

/// Regression figures shown next to the residual surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionSummary {
    /// Independent attribute.
    pub independent: String,
    /// Dependent attribute.
    pub dependent: String,
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// The fitted line as text, four decimals each.
    pub equation: String,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Sample standard deviation of the residuals.
    pub residual_std_dev: f64,
    /// Grid cells used in the fit.
    pub sample_count: usize,
    /// Grid cells left without an aggregated dependent value.
    pub missing_cells: usize,
}

impl RegressionSummary {
    /// Summarizes `result`, recording how many cells had no dependent value.
    #[must_use]
    pub fn new(result: &RegressionResult, missing_cells: usize) -> Self {
        Self {
            independent: result.independent.clone(),
            dependent: result.dependent.clone(),
            slope: result.slope,
            intercept: result.intercept,
            equation: result.equation().to_string(),
            r_squared: result.r_squared,
            residual_std_dev: result.residual_std_dev,
            sample_count: result.sample_count(),
            missing_cells,
        }
    }
}

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    /// Session state when the snapshot was taken.
    pub state: SessionState,
    /// Parameters of the current surface, if any.
    pub params: Option<PipelineParams>,
    /// The grid with every derived attribute, if a surface exists.
    pub grid: Option<geojson::FeatureCollection>,
    /// Breaks for every classified layer, sample layers first.
    pub breaks: Vec<LayerBreaks>,
    /// Regression summary, if a surface exists.
    pub regression: Option<RegressionSummary>,
}

impl SurfaceSnapshot {
    /// Breaks for `layer`, if present.
    #[must_use]
    pub fn breaks_for(&self, layer: Layer) -> Option<&ClassBreaks> {
        self.breaks
            .iter()
            .find(|entry| entry.layer == layer)
            .map(|entry| &entry.breaks)
    }
}

/// Category of a pipeline failure.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Parameters out of range or not finite.
    Validation,
    /// Too few distinct values for the requested classes.
    InsufficientData,
    /// Regression undefined for the available samples.
    InsufficientSamples,
    /// Interpolation or aggregation failed.
    Spatial,
    /// A run was requested while another was in progress.
    Busy,
    /// Input data could not be read or parsed.
    Input,
    /// Configuration could not be read or is inconsistent.
    Config,
}

/// A failure as reported to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RegressionResult {
        RegressionResult {
            independent: "nitconc".to_string(),
            dependent: "canrate".to_string(),
            slope: 0.0123,
            intercept: 0.0849,
            r_squared: 0.0421,
            residual_std_dev: 0.05,
            fitted: Vec::new(),
        }
    }

    #[test]
    fn state_string_forms() {
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!("idle".parse::<SessionState>().unwrap(), SessionState::Idle);
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn layer_and_error_kind_string_forms() {
        assert_eq!(Layer::GridResidual.as_ref(), "grid_residual");
        assert_eq!(ErrorKind::InsufficientData.to_string(), "INSUFFICIENT_DATA");
        assert_eq!(
            serde_json::to_value(ErrorKind::Busy).unwrap(),
            serde_json::json!("BUSY")
        );
    }

    #[test]
    fn summary_copies_result() {
        let summary = RegressionSummary::new(&result(), 3);
        assert_eq!(summary.equation, "y = 0.0123x + 0.0849");
        assert_eq!(summary.sample_count, 0);
        assert_eq!(summary.missing_cells, 3);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = SurfaceSnapshot {
            state: SessionState::Ready,
            params: Some(PipelineParams {
                distance_decay: 2.0,
                cell_size_km: 6.0,
            }),
            grid: None,
            breaks: vec![LayerBreaks {
                layer: Layer::WellNitrate,
                breaks: ClassBreaks {
                    attribute: "nitconc".to_string(),
                    breaks: vec![1.0, 2.0],
                },
            }],
            regression: Some(RegressionSummary::new(&result(), 0)),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["params"]["cellSizeKm"], 6.0);
        assert_eq!(json["breaks"][0]["layer"], "well_nitrate");
        assert_eq!(json["regression"]["rSquared"], 0.0421);
        assert!(json["grid"].is_null());

        assert_eq!(
            snapshot.breaks_for(Layer::WellNitrate).map(|b| b.breaks.len()),
            Some(2)
        );
        assert!(snapshot.breaks_for(Layer::GridRate).is_none());
    }
}
