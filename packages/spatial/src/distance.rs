//! Distance metrics used by interpolation.

use geo::{Distance as _, Euclidean, Haversine, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How the distance between a lattice location and a sample is measured.
///
/// IDW weights depend only on distance ratios, so the unit of the planar
/// metric (degrees) does not affect interpolated values.
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
pub enum DistanceMetric {
    /// Great-circle distance in kilometers.
    #[default]
    Haversine,
    /// Straight-line distance in coordinate units.
    Planar,
}

impl DistanceMetric {
    /// Distance between `a` and `b` under this metric.
    #[must_use]
    pub fn distance(self, a: Point<f64>, b: Point<f64>) -> f64 {
        match self {
            Self::Haversine => haversine_km(a, b),
            Self::Planar => Euclidean.distance(a, b),
        }
    }
}

/// Great-circle distance in kilometers.
#[must_use]
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(Point::new(-89.0, 44.0), Point::new(-89.0, 45.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn planar_is_euclidean_in_degrees() {
        let d = DistanceMetric::Planar.distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn metric_parses_from_config_strings() {
        assert_eq!("haversine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Haversine);
        assert_eq!(DistanceMetric::Planar.to_string(), "planar");
        assert_eq!(DistanceMetric::default(), DistanceMetric::Haversine);
    }
}
