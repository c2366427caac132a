//! Ordinary least squares regression between two attributes.

use nitrate_map_analytics_models::{FittedValue, RegressionResult};
use nitrate_map_geography_models::{Attributed, round4};

use crate::{AnalyticsError, stats};

/// Fits `dependent = slope * independent + intercept` over every feature
/// carrying both attributes as finite numbers.
///
/// Each fitted value records the prediction rounded to four places and the
/// residual `observed - predicted`, also rounded to four places. R² is
/// computed from the unrounded line and is 0 when the dependent values
/// have no variance. The residual standard deviation is the sample
/// (n - 1) deviation of the rounded residuals.
///
/// # Errors
///
/// Returns [`AnalyticsError::InsufficientSamples`] for fewer than two
/// paired samples and [`AnalyticsError::DegenerateSamples`] when all
/// independent values are equal.
pub fn fit<F: Attributed>(
    features: &[F],
    independent: &str,
    dependent: &str,
) -> Result<RegressionResult, AnalyticsError> {
    let pairs: Vec<(usize, f64, f64)> = features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            Some((index, feature.number(independent)?, feature.number(dependent)?))
        })
        .collect();

    if pairs.len() < 2 {
        return Err(AnalyticsError::InsufficientSamples {
            independent: independent.to_string(),
            dependent: dependent.to_string(),
            found: pairs.len(),
        });
    }

    let (min_x, max_x) = pairs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, x, _)| {
            (lo.min(x), hi.max(x))
        });
    if max_x <= min_x {
        return Err(AnalyticsError::DegenerateSamples {
            independent: independent.to_string(),
            count: pairs.len(),
        });
    }

    let xs: Vec<f64> = pairs.iter().map(|&(_, x, _)| x).collect();
    let ys: Vec<f64> = pairs.iter().map(|&(_, _, y)| y).collect();
    let mean_x = stats::mean(&xs).unwrap_or_default();
    let mean_y = stats::mean(&ys).unwrap_or_default();

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(&ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mean_x, mean_y);

    let sse: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| (y - slope.mul_add(x, intercept)).powi(2))
        .sum();
    let r_squared = if syy > 0.0 {
        round4(1.0 - sse / syy)
    } else {
        0.0
    };

    let fitted: Vec<FittedValue> = pairs
        .iter()
        .map(|&(index, x, y)| {
            let predicted = round4(slope.mul_add(x, intercept));
            FittedValue {
                index,
                x,
                y,
                predicted,
                residual: round4(y - predicted),
            }
        })
        .collect();

    let residuals: Vec<f64> = fitted.iter().map(|f| f.residual).collect();
    let residual_std_dev = stats::sample_std_dev(&residuals).unwrap_or_default();

    log::debug!(
        "Fitted '{dependent}' on '{independent}' over {} samples: slope {slope}, intercept {intercept}, r2 {r_squared}",
        fitted.len()
    );

    Ok(RegressionResult {
        independent: independent.to_string(),
        dependent: dependent.to_string(),
        slope,
        intercept,
        r_squared,
        residual_std_dev,
        fitted,
    })
}

/// Writes each fitted sample's prediction and residual back onto the
/// feature it came from.
///
/// Both attributes are removed from every feature first, so features left
/// out of the fit carry neither.
pub fn apply<F: Attributed>(
    features: &mut [F],
    result: &RegressionResult,
    predicted_attribute: &str,
    residual_attribute: &str,
) {
    for feature in features.iter_mut() {
        feature.clear(predicted_attribute);
        feature.clear(residual_attribute);
    }

    for fitted in &result.fitted {
        if let Some(feature) = features.get_mut(fitted.index) {
            feature.set_number(predicted_attribute, fitted.predicted);
            feature.set_number(residual_attribute, fitted.residual);
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use nitrate_map_geography_models::{GridCell, GridGeometry};

    use super::*;

    fn cell(x: Option<f64>, y: Option<f64>) -> GridCell {
        let mut cell = GridCell {
            geometry: GridGeometry::Point(Point::new(0.0, 0.0)),
            properties: nitrate_map_geography_models::Properties::new(),
        };
        if let Some(x) = x {
            cell.set_number("nitconc", x);
        }
        if let Some(y) = y {
            cell.set_number("canrate", y);
        }
        cell
    }

    fn cells(pairs: &[(f64, f64)]) -> Vec<GridCell> {
        pairs.iter().map(|&(x, y)| cell(Some(x), Some(y))).collect()
    }

    #[test]
    fn exact_line_has_unit_r_squared() {
        let cells = cells(&[(1.0, 3.0), (2.0, 5.0), (3.0, 7.0), (4.0, 9.0)]);
        let result = fit(&cells, "nitconc", "canrate").unwrap();

        assert!((result.slope - 2.0).abs() < 1e-12);
        assert!((result.intercept - 1.0).abs() < 1e-12);
        assert!((result.r_squared - 1.0).abs() < f64::EPSILON);
        assert!(result.residual_std_dev.abs() < 1e-12);
        assert!(result.fitted.iter().all(|f| f.residual.abs() < 1e-12));
        assert_eq!(result.sample_count(), 4);
        assert_eq!(result.equation().to_string(), "y = 2.0000x + 1.0000");
    }

    #[test]
    fn constant_dependent_has_zero_slope_and_r_squared() {
        let cells = cells(&[(1.0, 0.2), (2.0, 0.2), (5.0, 0.2)]);
        let result = fit(&cells, "nitconc", "canrate").unwrap();

        assert!(result.slope.abs() < 1e-12);
        assert!((result.intercept - 0.2).abs() < 1e-12);
        assert!(result.r_squared.abs() < f64::EPSILON);
    }

    #[test]
    fn residuals_are_observed_minus_predicted() {
        let cells = cells(&[(0.0, 0.0), (1.0, 2.0), (2.0, 1.0), (3.0, 3.0)]);
        let result = fit(&cells, "nitconc", "canrate").unwrap();

        // Slope 0.8, intercept 0.3.
        assert!((result.slope - 0.8).abs() < 1e-12);
        assert!((result.intercept - 0.3).abs() < 1e-12);
        let second = result.fitted[1];
        assert!((second.predicted - 1.1).abs() < 1e-12);
        assert!((second.residual - 0.9).abs() < 1e-12);
        // SSE 1.8 over SST 5.
        assert!((result.r_squared - 0.64).abs() < 1e-12);
        assert!(result.r_squared >= 0.0 && result.r_squared <= 1.0);
    }

    #[test]
    fn unpaired_features_are_skipped() {
        let cells = vec![
            cell(Some(1.0), Some(1.0)),
            cell(Some(2.0), None),
            cell(None, Some(4.0)),
            cell(Some(3.0), Some(3.0)),
        ];
        let result = fit(&cells, "nitconc", "canrate").unwrap();
        assert_eq!(
            result.fitted.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 3]
        );
    }

    #[test]
    fn too_few_or_degenerate_samples() {
        let one = cells(&[(1.0, 1.0)]);
        assert!(matches!(
            fit(&one, "nitconc", "canrate"),
            Err(AnalyticsError::InsufficientSamples { found: 1, .. })
        ));

        let vertical = cells(&[(0.1, 1.0), (0.1, 2.0), (0.1, 3.0)]);
        assert!(matches!(
            fit(&vertical, "nitconc", "canrate"),
            Err(AnalyticsError::DegenerateSamples { count: 3, .. })
        ));
    }

    #[test]
    fn apply_writes_and_clears_attributes() {
        let mut cells = vec![
            cell(Some(0.0), Some(0.0)),
            cell(Some(1.0), Some(2.0)),
            cell(Some(2.0), None),
            cell(Some(2.0), Some(1.0)),
            cell(Some(3.0), Some(3.0)),
        ];
        cells[2].set_number("residual", 99.0);

        let result = fit(&cells, "nitconc", "canrate").unwrap();
        apply(&mut cells, &result, "canrate_predicted", "residual");

        assert_eq!(cells[1].number("canrate_predicted"), Some(1.1));
        assert_eq!(cells[1].number("residual"), Some(0.9));
        assert_eq!(cells[2].number("residual"), None);
        assert_eq!(cells[2].number("canrate_predicted"), None);
    }
}
