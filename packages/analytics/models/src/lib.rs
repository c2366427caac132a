#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Class break and regression result types.
//!
//! These are the numeric outputs handed to the rendering layer: ordered
//! break values for step classification, and the fitted regression line
//! with its per-cell predictions and residuals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered lower bounds of classes 2..N for one attribute.
///
/// A value below `breaks[0]` is in the first class, a value in
/// `breaks[i - 1]..breaks[i]` is in class `i`, and a value at or above the
/// last break is in the last class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassBreaks {
    /// Attribute the breaks classify.
    pub attribute: String,
    /// Ascending break values (`class_count - 1` of them).
    pub breaks: Vec<f64>,
}

impl ClassBreaks {
    /// Number of classes these breaks partition values into.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.breaks.len() + 1
    }

    /// Zero-based class of `value`: the number of breaks at or below it.
    #[must_use]
    pub fn class_index(&self, value: f64) -> usize {
        self.breaks.partition_point(|&b| b <= value)
    }
}

/// Prediction and residual for one paired sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedValue {
    /// Position of the feature in the fitted collection.
    pub index: usize,
    /// Independent value.
    pub x: f64,
    /// Observed dependent value.
    pub y: f64,
    /// `round4(slope * x + intercept)`.
    pub predicted: f64,
    /// `round4(y - predicted)`; positive means the line under-predicts.
    pub residual: f64,
}

/// An ordinary least squares fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    /// Independent attribute name.
    pub independent: String,
    /// Dependent attribute name.
    pub dependent: String,
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Coefficient of determination, rounded to four places.
    pub r_squared: f64,
    /// Sample (n - 1) standard deviation of the residuals.
    pub residual_std_dev: f64,
    /// Per-sample predictions and residuals.
    pub fitted: Vec<FittedValue>,
}

impl RegressionResult {
    /// Number of paired samples in the fit.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.fitted.len()
    }

    /// Unrounded prediction for `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }

    /// The fitted line as `y = <slope>x + <intercept>`, four decimals each.
    #[must_use]
    pub fn equation(&self) -> Equation<'_> {
        Equation(self)
    }
}

/// Display adapter returned by [`RegressionResult::equation`].
pub struct Equation<'a>(&'a RegressionResult);

impl fmt::Display for Equation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {:.4}x + {:.4}", self.0.slope, self.0.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaks() -> ClassBreaks {
        ClassBreaks {
            attribute: "nitconc".to_string(),
            breaks: vec![1.0, 2.5, 4.0],
        }
    }

    #[test]
    fn class_index_steps_at_each_break() {
        let b = breaks();
        assert_eq!(b.class_count(), 4);
        assert_eq!(b.class_index(0.0), 0);
        assert_eq!(b.class_index(0.999), 0);
        assert_eq!(b.class_index(1.0), 1);
        assert_eq!(b.class_index(2.4), 1);
        assert_eq!(b.class_index(2.5), 2);
        assert_eq!(b.class_index(4.0), 3);
        assert_eq!(b.class_index(100.0), 3);
    }

    #[test]
    fn single_class_has_no_breaks() {
        let b = ClassBreaks {
            attribute: "x".to_string(),
            breaks: vec![],
        };
        assert_eq!(b.class_count(), 1);
        assert_eq!(b.class_index(-5.0), 0);
    }

    #[test]
    fn equation_uses_four_decimals() {
        let result = RegressionResult {
            independent: "nitconc".to_string(),
            dependent: "canrate".to_string(),
            slope: 0.012_345_6,
            intercept: 0.1,
            r_squared: 0.5,
            residual_std_dev: 0.01,
            fitted: vec![],
        };
        assert_eq!(result.equation().to_string(), "y = 0.0123x + 0.1000");
        assert!((result.predict(10.0) - 0.223_456).abs() < 1e-12);
        assert_eq!(result.sample_count(), 0);

        let negative = RegressionResult {
            intercept: -0.25,
            ..result
        };
        assert_eq!(negative.equation().to_string(), "y = 0.0123x + -0.2500");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(breaks()).unwrap();
        assert_eq!(json["attribute"], "nitconc");
        assert_eq!(json["breaks"][1], 2.5);
    }
}
