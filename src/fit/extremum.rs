//! Noise-robust local extremum search.
//!
//! For every interior point we fit a straight line through the `2 * window + 1`
//! points centred on it and keep the slope. A minimum candidate sits where the
//! slope of the previous point is non-positive and the slope of the next point is
//! positive. Maxima are found as minima of the negated values.
//!
//! A sign flip alone is not trusted: the mean of the `window` values before the
//! candidate and the mean of the `window` values after it must both lie above the
//! candidate's own value. Single noisy dips in otherwise monotone data fail this.

use crate::domain::{ExtremumKind, PreparedRow};
use crate::math::fit_line;

/// Local OLS slopes of `y` against `x`.
///
/// Entry `i` is `None` within `window` points of either end, or where the local
/// design is singular.
pub fn local_slopes(x: &[f64], y: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = x.len().min(y.len());
    let mut slopes = vec![None; n];
    if window == 0 || n < 2 * window + 1 {
        return slopes;
    }
    for i in window..n - window {
        let lo = i - window;
        let hi = i + window + 1;
        slopes[i] = fit_line(&x[lo..hi], &y[lo..hi]).map(|fit| fit.slope);
    }
    slopes
}

/// Indices of all extrema of `values` (against `x`) that survive the noise filter,
/// in ascending order.
pub fn extremum_candidates(x: &[f64], values: &[f64], kind: ExtremumKind, window: usize) -> Vec<usize> {
    let target: Vec<f64> = match kind {
        ExtremumKind::Minimum => values.to_vec(),
        ExtremumKind::Maximum => values.iter().map(|v| -v).collect(),
    };
    let slopes = local_slopes(x, &target, window);
    let n = slopes.len();
    if n < 3 {
        return Vec::new();
    }

    (1..n - 1)
        .filter(|&i| match (slopes[i - 1], slopes[i + 1]) {
            (Some(before), Some(after)) => before <= 0.0 && after > 0.0,
            _ => false,
        })
        .filter(|&i| is_true_extremum(&target, i, window))
        .collect()
}

/// Index of the `rank`-th surviving extremum of `value_fn` against `p_rel`.
pub fn find_extremum<F>(
    rows: &[PreparedRow],
    value_fn: F,
    kind: ExtremumKind,
    rank: usize,
    window: usize,
) -> Option<usize>
where
    F: Fn(&PreparedRow) -> f64,
{
    let x: Vec<f64> = rows.iter().map(|r| r.p_rel).collect();
    let values: Vec<f64> = rows.iter().map(value_fn).collect();
    extremum_candidates(&x, &values, kind, window)
        .get(rank)
        .copied()
}

/// Neighbourhood check on a minimum candidate.
fn is_true_extremum(target: &[f64], i: usize, window: usize) -> bool {
    if i < window || i + window >= target.len() {
        return false;
    }
    let value = target[i];
    let before = mean(&target[i - window..i]);
    let after = mean(&target[i + 1..=i + window]);
    before > value && after > value
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| 0.013 + i as f64 * step).collect()
    }

    #[test]
    fn slopes_are_undefined_near_the_edges() {
        let x = grid(9, 0.1);
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        let slopes = local_slopes(&x, &y, 3);
        assert!(slopes[..3].iter().all(Option::is_none));
        assert!(slopes[6..].iter().all(Option::is_none));
        for s in &slopes[3..6] {
            assert!((s.unwrap() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn finds_parabola_minimum() {
        let x = grid(21, 0.05);
        // Vertex between grid points so no local slope is exactly zero.
        let y: Vec<f64> = x.iter().map(|v| (v - 0.52) * (v - 0.52)).collect();
        let found = extremum_candidates(&x, &y, ExtremumKind::Minimum, 3);
        assert_eq!(found.first().copied(), Some(10));
    }

    #[test]
    fn finds_maximum_of_negated_parabola() {
        let x = grid(21, 0.05);
        let y: Vec<f64> = x.iter().map(|v| 1.0 - (v - 0.27) * (v - 0.27)).collect();
        let found = extremum_candidates(&x, &y, ExtremumKind::Maximum, 3);
        assert_eq!(found.first().copied(), Some(5));
    }

    #[test]
    fn monotone_data_has_no_extremum() {
        let x = grid(15, 0.05);
        let y: Vec<f64> = x.iter().map(|v| v.ln()).collect();
        assert!(extremum_candidates(&x, &y, ExtremumKind::Minimum, 3).is_empty());
        assert!(extremum_candidates(&x, &y, ExtremumKind::Maximum, 3).is_empty());
    }

    #[test]
    fn noise_filter_needs_both_neighbourhoods_above() {
        // A dip whose left neighbourhood is, on average, lower than the dip itself.
        let target = [0.0, 0.1, 0.2, 0.5, 0.9, 1.0, 1.1];
        assert!(!is_true_extremum(&target, 3, 3));

        let target = [3.0, 2.0, 1.0, 0.5, 1.0, 2.0, 3.0];
        assert!(is_true_extremum(&target, 3, 3));

        // Too close to the edge for a full neighbourhood.
        assert!(!is_true_extremum(&target, 2, 3));
    }

    #[test]
    fn rank_indexes_the_surviving_candidates() {
        let x = grid(41, 0.05);
        // Two wells, near 0.45 and 1.45.
        let y: Vec<f64> = x.iter().map(|v| ((v - 0.5) * (v - 1.5)).powi(2) + 0.1 * v).collect();
        let rows: Vec<PreparedRow> = x
            .iter()
            .zip(&y)
            .map(|(&p_rel, &phi)| PreparedRow {
                pressure: p_rel,
                loading: 1.0,
                p_rel,
                bet_y: 0.0,
                bet_y2: 0.0,
                phi,
            })
            .collect();

        let all = extremum_candidates(&x, &y, ExtremumKind::Minimum, 3);
        assert!(all.len() >= 2);
        assert!((x[all[0]] - 0.45).abs() < 0.11);
        assert!((x[*all.last().unwrap()] - 1.45).abs() < 0.11);

        for (rank, &idx) in all.iter().enumerate() {
            assert_eq!(find_extremum(&rows, |r| r.phi, ExtremumKind::Minimum, rank, 3), Some(idx));
        }
        assert!(find_extremum(&rows, |r| r.phi, ExtremumKind::Minimum, all.len(), 3).is_none());
    }
}
