//! The run sequence: interpolate both grids, join them, fit, classify.
//!
//! Every stage works on values owned by this module. Nothing reaches the
//! session until the whole sequence has succeeded.

use nitrate_map_analytics::{
    breaks::{compute_feature_breaks, deviation_breaks},
    regression,
};
use nitrate_map_analytics_models::RegressionResult;
use nitrate_map_geography_models::{GridCell, PointFeature};
use nitrate_map_pipeline_models::{Layer, LayerBreaks, PipelineParams};
use nitrate_map_spatial::{InterpolationOptions, JoinAttributes, aggregate, interpolate};

use crate::{
    PipelineError,
    config::PipelineConfig,
    progress::{ProgressCallback, Stage},
};

/// Number of progress steps in one run.
pub const STAGE_COUNT: u64 = 5;

/// The outputs of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Parameters the surface was computed with.
    pub params: PipelineParams,
    /// Primary grid with interpolated, aggregated, predicted, and residual
    /// attributes.
    pub grid: Vec<GridCell>,
    /// Regression of the aggregated dependent value on the interpolated one.
    pub regression: RegressionResult,
    /// Breaks for the grid layers.
    pub breaks: Vec<LayerBreaks>,
    /// Primary cells that received no secondary value.
    pub missing_cells: usize,
}

/// Computes a full surface from the session's working copies.
///
/// # Errors
///
/// Returns [`PipelineError`] from the first stage that fails.
pub fn compute_surface(
    wells: &[PointFeature],
    centroids: &[PointFeature],
    config: &PipelineConfig,
    params: PipelineParams,
    progress: &dyn ProgressCallback,
) -> Result<Surface, PipelineError> {
    let attrs = &config.attributes;
    progress.set_total(STAGE_COUNT);

    progress.start_stage(Stage::InterpolatePrimary, &attrs.primary);
    let mut grid = interpolate(
        wells,
        &attrs.primary,
        &InterpolationOptions {
            cell_size_km: params.cell_size_km,
            distance_decay: params.distance_decay,
            grid_type: config.grids.primary,
            metric: config.grids.metric,
        },
    )?;
    log::info!(
        "Interpolated {} onto {} {} cells",
        attrs.primary,
        grid.len(),
        config.grids.primary
    );
    progress.complete_stage(Stage::InterpolatePrimary);

    progress.start_stage(Stage::InterpolateSecondary, &attrs.secondary);
    let secondary = interpolate(
        centroids,
        &attrs.secondary,
        &InterpolationOptions {
            cell_size_km: params.cell_size_km,
            distance_decay: params.distance_decay,
            grid_type: config.grids.secondary,
            metric: config.grids.metric,
        },
    )?;
    log::info!(
        "Interpolated {} onto {} {} cells",
        attrs.secondary,
        secondary.len(),
        config.grids.secondary
    );
    progress.complete_stage(Stage::InterpolateSecondary);

    progress.start_stage(Stage::Join, &attrs.secondary);
    let summary = aggregate(
        &mut grid,
        &secondary,
        &JoinAttributes {
            source: &attrs.secondary,
            target: &attrs.secondary,
            collected: &attrs.collected,
        },
    )?;
    if summary.missing > 0 {
        log::warn!(
            "{} of {} cells contain no {} grid point and are left out of the regression; \
             a larger cell size avoids this",
            summary.missing,
            grid.len(),
            attrs.secondary
        );
    }
    progress.complete_stage(Stage::Join);

    progress.start_stage(Stage::Fit, &format!("{} on {}", attrs.secondary, attrs.primary));
    let fitted = regression::fit(&grid, &attrs.primary, &attrs.secondary)?;
    regression::apply(&mut grid, &fitted, &attrs.predicted, &attrs.residual);
    log::info!(
        "Regression over {} cells: {} (r2 {})",
        fitted.sample_count(),
        fitted.equation(),
        fitted.r_squared
    );
    progress.complete_stage(Stage::Fit);

    progress.start_stage(Stage::Classify, "grid layers");
    let breaks = vec![
        LayerBreaks {
            layer: Layer::GridNitrate,
            breaks: compute_feature_breaks(&grid, &attrs.primary, config.classes.surface)?,
        },
        LayerBreaks {
            layer: Layer::GridRate,
            breaks: compute_feature_breaks(&grid, &attrs.secondary, config.classes.surface)?,
        },
        LayerBreaks {
            layer: Layer::GridResidual,
            breaks: deviation_breaks(
                fitted.residual_std_dev,
                &config.classes.residual_multiples,
                &attrs.residual,
            ),
        },
    ];
    progress.complete_stage(Stage::Classify);

    Ok(Surface {
        params,
        grid,
        regression: fitted,
        breaks,
        missing_cells: summary.missing,
    })
}

#[cfg(test)]
mod tests {
    use nitrate_map_geography_models::{Attributed as _, Properties};

    use super::*;
    use crate::progress::NullProgress;

    fn point(lon: f64, lat: f64, attribute: &str, value: f64) -> PointFeature {
        let mut properties = Properties::new();
        properties.insert(attribute.to_string(), value.into());
        PointFeature::new(lon, lat, properties)
    }

    #[test]
    fn four_wells_at_decay_two_and_six_km() {
        let wells = vec![
            point(-90.0, 44.0, "nitconc", 1.0),
            point(-89.0, 44.1, "nitconc", 2.0),
            point(-89.6, 45.0, "nitconc", 3.0),
            point(-89.3, 44.6, "nitconc", 10.0),
        ];
        let mut centroids = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                let rate = 0.05 + 0.01 * f64::from((i * 5 + j * 3) % 16);
                centroids.push(point(
                    -90.0 + f64::from(i) / 3.0,
                    44.0 + f64::from(j) / 3.0,
                    "canrate",
                    rate,
                ));
            }
        }
        let config = PipelineConfig::embedded().unwrap();
        let params = PipelineParams {
            distance_decay: 2.0,
            cell_size_km: 6.0,
        };

        let surface = compute_surface(&wells, &centroids, &config, params, &NullProgress).unwrap();

        assert!(!surface.grid.is_empty());
        for cell in &surface.grid {
            let value = cell.number("nitconc").unwrap();
            assert!((1.0..=10.0).contains(&value), "{value}");
            assert!((value * 10_000.0 - (value * 10_000.0).round()).abs() < 1e-6);
        }
        assert!(surface.regression.sample_count() >= 2);
        assert!(surface.regression.residual_std_dev >= 0.0);
        assert!(surface.regression.residual_std_dev.is_finite());
        assert_eq!(surface.breaks.len(), 3);
    }
}
