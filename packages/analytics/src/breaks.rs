//! Class breaks for step classification.
//!
//! Natural breaks use ckmeans: an optimal 1-D k-means computed by dynamic
//! programming over the sorted values. Equal values are collapsed into one
//! weighted entry first, so a run of identical values is never split
//! between two classes and the resulting breaks are strictly ascending.

use nitrate_map_analytics_models::ClassBreaks;
use nitrate_map_geography_models::{Attributed, round4};

use crate::AnalyticsError;

/// Natural breaks for `attribute` over every feature that carries it.
///
/// # Errors
///
/// See [`compute_breaks`].
pub fn compute_feature_breaks<F: Attributed>(
    features: &[F],
    attribute: &str,
    class_count: usize,
) -> Result<ClassBreaks, AnalyticsError> {
    let values: Vec<f64> = features.iter().filter_map(|f| f.number(attribute)).collect();
    compute_breaks(&values, attribute, class_count)
}

/// Natural breaks partitioning `values` into `class_count` classes.
///
/// Returns the minimum of every cluster but the first, ascending.
/// Non-finite values are ignored. The result depends only on the multiset
/// of values, not their order.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidClassCount`] for a class count of zero
/// and [`AnalyticsError::InsufficientData`] when there are fewer distinct
/// values than classes.
pub fn compute_breaks(
    values: &[f64],
    attribute: &str,
    class_count: usize,
) -> Result<ClassBreaks, AnalyticsError> {
    if class_count == 0 {
        return Err(AnalyticsError::InvalidClassCount {
            attribute: attribute.to_string(),
        });
    }

    let (distinct, weights) = distinct_sorted(values);
    if distinct.len() < class_count {
        return Err(AnalyticsError::InsufficientData {
            attribute: attribute.to_string(),
            class_count,
            distinct: distinct.len(),
        });
    }

    let breaks: Vec<f64> = cluster_starts(&distinct, &weights, class_count)
        .into_iter()
        .map(|start| distinct[start])
        .collect();

    log::debug!("'{attribute}' breaks ({class_count} classes): {breaks:?}");

    Ok(ClassBreaks {
        attribute: attribute.to_string(),
        breaks,
    })
}

/// Breaks at fixed multiples of a standard deviation, rounded to four
/// places (e.g. `[-1.5, -1, -0.5, 0.5, 1, 1.5]` gives seven classes
/// centered on zero).
#[must_use]
pub fn deviation_breaks(std_dev: f64, multiples: &[f64], attribute: &str) -> ClassBreaks {
    ClassBreaks {
        attribute: attribute.to_string(),
        breaks: multiples.iter().map(|m| round4(m * std_dev)).collect(),
    }
}

/// Sorted distinct finite values and how often each occurs.
fn distinct_sorted(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut distinct: Vec<f64> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for value in sorted {
        match (distinct.last(), weights.last_mut()) {
            (Some(last), Some(weight)) if last.total_cmp(&value).is_eq() => *weight += 1.0,
            _ => {
                distinct.push(value);
                weights.push(1.0);
            }
        }
    }
    (distinct, weights)
}

/// Weighted prefix sums giving O(1) within-cluster sum of squares.
struct PrefixSums {
    weight: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PrefixSums {
    fn new(values: &[f64], weights: &[f64]) -> Self {
        // Shifting by the median keeps the sums small and the subtraction
        // in `ssq` well conditioned.
        let shift = values[values.len() / 2];
        let n = values.len();
        let mut prefix = Self {
            weight: Vec::with_capacity(n + 1),
            sum: Vec::with_capacity(n + 1),
            sum_sq: Vec::with_capacity(n + 1),
        };
        let (mut w, mut s, mut s2) = (0.0, 0.0, 0.0);
        prefix.weight.push(w);
        prefix.sum.push(s);
        prefix.sum_sq.push(s2);
        for (&value, &weight) in values.iter().zip(weights) {
            let shifted = value - shift;
            w += weight;
            s += weight * shifted;
            s2 += weight * shifted * shifted;
            prefix.weight.push(w);
            prefix.sum.push(s);
            prefix.sum_sq.push(s2);
        }
        prefix
    }

    /// Sum of squared deviations from the mean for entries `j..=i`.
    fn ssq(&self, j: usize, i: usize) -> f64 {
        let w = self.weight[i + 1] - self.weight[j];
        let s = self.sum[i + 1] - self.sum[j];
        let s2 = self.sum_sq[i + 1] - self.sum_sq[j];
        (s2 - s * s / w).max(0.0)
    }
}

/// Optimal cost table and the start index of the last cluster for every
/// (cluster, prefix end) pair.
struct Tables {
    cost: Vec<Vec<f64>>,
    start: Vec<Vec<usize>>,
}

/// Start indices of clusters `1..k` in an optimal `k`-clustering of the
/// sorted, distinct `values`. Requires `1 <= k <= values.len()`.
fn cluster_starts(values: &[f64], weights: &[f64], k: usize) -> Vec<usize> {
    let n = values.len();
    let prefix = PrefixSums::new(values, weights);
    let mut tables = Tables {
        cost: vec![vec![f64::INFINITY; n]; k],
        start: vec![vec![0; n]; k],
    };

    for i in 0..n {
        tables.cost[0][i] = prefix.ssq(0, i);
    }
    for cluster in 1..k {
        fill_row(&mut tables, &prefix, cluster, cluster, n - 1, cluster, n - 1);
    }

    let mut starts = Vec::with_capacity(k - 1);
    let mut end = n - 1;
    for cluster in (1..k).rev() {
        let start = tables.start[cluster][end];
        starts.push(start);
        end = start - 1;
    }
    starts.reverse();
    starts
}

/// Fills `cost[cluster][lo..=hi]` by divide and conquer. The optimal start
/// of the last cluster never moves left as the prefix grows, so the
/// candidates for the midpoint bound the search on each side.
fn fill_row(
    tables: &mut Tables,
    prefix: &PrefixSums,
    cluster: usize,
    lo: usize,
    hi: usize,
    start_lo: usize,
    start_hi: usize,
) {
    if lo > hi {
        return;
    }
    let mid = lo + (hi - lo) / 2;

    let first = start_lo.max(cluster);
    let last = start_hi.min(mid);
    let mut best = f64::INFINITY;
    let mut best_start = first;
    for j in first..=last {
        let candidate = tables.cost[cluster - 1][j - 1] + prefix.ssq(j, mid);
        if candidate < best {
            best = candidate;
            best_start = j;
        }
    }
    tables.cost[cluster][mid] = best;
    tables.start[cluster][mid] = best_start;

    if mid > lo {
        fill_row(tables, prefix, cluster, lo, mid - 1, start_lo, best_start);
    }
    fill_row(tables, prefix, cluster, mid + 1, hi, best_start, start_hi);
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use nitrate_map_geography_models::{PointFeature, Properties};

    use super::*;

    #[test]
    fn separates_obvious_clusters() {
        let values = [1.0, 1.1, 0.9, 5.0, 5.2, 4.9, 10.0, 10.3, 9.8];
        let breaks = compute_breaks(&values, "nitconc", 3).unwrap();
        assert_eq!(breaks.breaks, vec![4.9, 9.8]);
        assert_eq!(breaks.attribute, "nitconc");
    }

    #[test]
    fn returns_class_count_minus_one_ascending_members() {
        let values: Vec<f64> = (0..200)
            .map(|i| f64::from(i * 37 % 101) / 7.0 + f64::from(i % 3))
            .collect();
        for k in 1..=8 {
            let breaks = compute_breaks(&values, "v", k).unwrap();
            assert_eq!(breaks.breaks.len(), k - 1);
            assert!(breaks.breaks.windows(2).all(|w| w[0] < w[1]));
            assert!(
                breaks
                    .breaks
                    .iter()
                    .all(|b| values.iter().any(|v| v.total_cmp(b).is_eq()))
            );
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            assert!(breaks.breaks.iter().all(|&b| b > min));
        }
    }

    #[test]
    fn matches_exhaustive_search_on_small_input() {
        let values = [0.2, 0.9, 1.4, 3.3, 3.5, 6.0, 6.1, 8.7];
        let (distinct, weights) = distinct_sorted(&values);
        let prefix = PrefixSums::new(&distinct, &weights);
        let n = distinct.len();

        // Best split into three clusters by brute force.
        let mut best = (f64::INFINITY, 0, 0);
        for a in 1..n - 1 {
            for b in a + 1..n {
                let cost =
                    prefix.ssq(0, a - 1) + prefix.ssq(a, b - 1) + prefix.ssq(b, n - 1);
                if cost < best.0 {
                    best = (cost, a, b);
                }
            }
        }

        assert_eq!(cluster_starts(&distinct, &weights, 3), vec![best.1, best.2]);
    }

    #[test]
    fn is_order_independent() {
        let values = [3.0, 1.0, 7.0, 7.5, 2.0, 9.0, 1.5, 8.0];
        let mut reversed = values;
        reversed.reverse();
        assert_eq!(
            compute_breaks(&values, "v", 3).unwrap(),
            compute_breaks(&reversed, "v", 3).unwrap()
        );
    }

    #[test]
    fn duplicates_are_never_split() {
        let values = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0];
        let breaks = compute_breaks(&values, "v", 3).unwrap();
        assert_eq!(breaks.breaks, vec![2.0, 3.0]);
    }

    #[test]
    fn too_few_distinct_values() {
        let values = [1.0, 1.0, 2.0, 2.0, f64::NAN];
        match compute_breaks(&values, "canrate", 3) {
            Err(AnalyticsError::InsufficientData {
                class_count,
                distinct,
                ..
            }) => {
                assert_eq!(class_count, 3);
                assert_eq!(distinct, 2);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
        assert!(matches!(
            compute_breaks(&values, "canrate", 0),
            Err(AnalyticsError::InvalidClassCount { .. })
        ));
    }

    #[test]
    fn single_class_has_no_breaks() {
        assert!(compute_breaks(&[4.0], "v", 1).unwrap().breaks.is_empty());
    }

    #[test]
    fn feature_breaks_skip_missing_values() {
        let features: Vec<PointFeature> = [Some(1.0), None, Some(5.0), Some(9.0)]
            .iter()
            .map(|v| {
                let mut properties = Properties::new();
                if let Some(v) = v {
                    properties.insert("x".to_string(), (*v).into());
                }
                PointFeature {
                    position: Point::new(0.0, 0.0),
                    properties,
                }
            })
            .collect();
        let breaks = compute_feature_breaks(&features, "x", 3).unwrap();
        assert_eq!(breaks.breaks, vec![5.0, 9.0]);
    }

    #[test]
    fn deviation_breaks_scale_and_round() {
        let breaks = deviation_breaks(0.012_345, &[-1.5, -1.0, -0.5, 0.5, 1.0, 1.5], "residual");
        assert_eq!(breaks.attribute, "residual");
        assert_eq!(
            breaks.breaks,
            vec![-0.0185, -0.0123, -0.0062, 0.0062, 0.0123, 0.0185]
        );
        assert_eq!(breaks.class_count(), 7);
    }
}
