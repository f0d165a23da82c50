//! Evaluation of one candidate linear region.
//!
//! Given rows `[start, end)` of a prepared isotherm we:
//! - fit `bet_y ~ p_rel` by OLS
//! - derive the BET parameters (`C`, `qm`, area)
//! - check the four Rouquerol consistency criteria
//! - attach the usual regression diagnostics (F-test, t-tests, studentized
//!   residuals, Shapiro–Wilk on the residuals, R²)
//!
//! The evaluator only describes a region. Whether it is acceptable is decided by
//! the selector.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::domain::{PreparedRow, RegionFit, RegionStats};
use crate::error::BetError;
use crate::fit::prepare::global_bet_y2_max;
use crate::math::{LineFit, fit_line, shapiro_wilk};
use crate::models::{c_constant, monolayer_loading, monolayer_pressure, surface_area};

/// |studentized residual| above which a point counts as an outlier.
pub const OUTLIER_THRESHOLD: f64 = 3.0;

/// Maximum relative disagreement between the two monolayer-pressure estimates for
/// the fourth criterion.
pub const CON4_TOLERANCE: f64 = 0.2;

/// Settings that affect how a region is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Molecular cross-section (m²/molecule).
    pub cross_section: f64,
    /// Replaces an intercept that is exactly zero, keeping `C` finite.
    pub zero_intercept_sentinel: f64,
}

/// Fit and score rows `[start, end)` of `rows`.
///
/// `con1_limit` is the index (into `rows`) of the consistency-1 bound; without it
/// the first maximum of `bet_y2` in `rows` is used.
pub fn evaluate_region(
    rows: &[PreparedRow],
    start: usize,
    end: usize,
    con1_limit: Option<usize>,
    opts: &EvalOptions,
) -> Result<RegionFit, BetError> {
    let degenerate = |reason: &str| BetError::DegenerateRegion {
        start,
        end,
        reason: reason.to_string(),
    };

    if end > rows.len() || start >= end || end - start < 2 {
        return Err(degenerate("a region needs at least two rows inside the table"));
    }

    let region = &rows[start..end];
    let x: Vec<f64> = region.iter().map(|r| r.p_rel).collect();
    let y: Vec<f64> = region.iter().map(|r| r.bet_y).collect();
    let fit = fit_line(&x, &y).ok_or_else(|| degenerate("singular or non-finite regression"))?;
    let stats = region_statistics(&fit, &x, &y);

    let slope = fit.slope;
    let mut intercept = fit.intercept;
    if intercept == 0.0 {
        intercept += opts.zero_intercept_sentinel;
    }
    let c = c_constant(slope, intercept);
    let qm = monolayer_loading(slope, intercept);
    let a_bet = surface_area(qm, opts.cross_section);

    let bound = match con1_limit {
        Some(index) => index,
        None => global_bet_y2_max(rows).ok_or_else(|| degenerate("no finite bet_y2 maximum"))?,
    };
    let x_max = rows
        .get(bound)
        .map(|r| r.p_rel)
        .ok_or(BetError::InvalidOverride {
            name: "con1_limit",
            index: bound,
            len: rows.len(),
        })?;

    let region_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let region_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let con1 = region_max <= x_max;
    let con2 = c > 0.0;

    let x_bet3 = monolayer_crossing(rows, qm);
    let con3 = x_bet3.is_some_and(|x3| region_min <= x3 && x3 <= region_max);

    let x_bet4 = monolayer_pressure(c);
    let con4 = x_bet3.is_some_and(|x3| ((x_bet4 - x3) / x3).abs() < CON4_TOLERANCE);

    Ok(RegionFit {
        start,
        end,
        slope,
        intercept,
        c_constant: c,
        qm,
        a_bet,
        x_max,
        x_bet3,
        x_bet4,
        con1,
        con2,
        con3,
        con4,
        stats,
    })
}

/// Relative pressure at which the measured loading crosses `qm`, by linear
/// interpolation between the bracketing rows.
///
/// The lower bracket is the largest loading (and largest `p_rel`) among rows with
/// `loading <= qm`; the upper bracket the smallest among rows with `loading > qm`.
pub fn monolayer_crossing(rows: &[PreparedRow], qm: f64) -> Option<f64> {
    let mut lower: Option<(f64, f64)> = None;
    let mut upper: Option<(f64, f64)> = None;

    for row in rows {
        if row.loading <= qm {
            lower = Some(match lower {
                Some((x, y)) => (x.max(row.p_rel), y.max(row.loading)),
                None => (row.p_rel, row.loading),
            });
        } else if row.loading > qm {
            upper = Some(match upper {
                Some((x, y)) => (x.min(row.p_rel), y.min(row.loading)),
                None => (row.p_rel, row.loading),
            });
        }
    }

    let ((lower_x, lower_y), (upper_x, upper_y)) = (lower?, upper?);
    let m = (upper_y - lower_y) / (upper_x - lower_x);
    let x = upper_x - (upper_y - qm) / m;
    x.is_finite().then_some(x)
}

/// Regression diagnostics for a fitted line.
///
/// Quantities without enough degrees of freedom come out as NaN.
fn region_statistics(fit: &LineFit, x: &[f64], y: &[f64]) -> RegionStats {
    let n = fit.n;
    let df = fit.df_resid() as f64;

    let r_squared = 1.0 - fit.ssr / fit.sst;
    let adj_r_squared = 1.0 - (n as f64 - 1.0) / df * (1.0 - r_squared);

    let ess = fit.sst - fit.ssr;
    let f_value = ess / (fit.ssr / df);
    let f_pvalue = if df > 0.0 {
        FisherSnedecor::new(1.0, df)
            .map(|dist| upper_tail(f_value, |v| dist.sf(v)))
            .unwrap_or(f64::NAN)
    } else {
        f64::NAN
    };

    let sigma2 = fit.ssr / df;
    let params = [fit.intercept, fit.slope];
    let mut t_values = [f64::NAN; 2];
    let mut t_pvalues = [f64::NAN; 2];
    let t_dist = if df > 0.0 {
        StudentsT::new(0.0, 1.0, df).ok()
    } else {
        None
    };
    for j in 0..2 {
        let se = (sigma2 * fit.cov_unscaled[(j, j)]).sqrt();
        let t = params[j] / se;
        t_values[j] = t;
        if let Some(dist) = &t_dist {
            t_pvalues[j] = 2.0 * upper_tail(t.abs(), |v| dist.sf(v));
        }
    }

    let studentized = externally_studentized(fit);
    let mut outliers = Vec::new();
    for (i, t) in studentized.iter().enumerate() {
        if t.abs() > OUTLIER_THRESHOLD {
            outliers.push((x[i], y[i]));
        }
    }
    let has_outlier = !outliers.is_empty();

    let (shapiro_w, shapiro_pvalue) = match shapiro_wilk(&standardize(&studentized)) {
        Some(res) => (res.w, res.p_value),
        None => (f64::NAN, f64::NAN),
    };

    RegionStats {
        n,
        r_squared,
        adj_r_squared,
        f_value,
        f_pvalue,
        t_values,
        t_pvalues,
        studentized,
        has_outlier,
        outliers,
        shapiro_w,
        shapiro_pvalue,
    }
}

/// Survival function that maps an infinite statistic to probability zero.
fn upper_tail(stat: f64, sf: impl Fn(f64) -> f64) -> f64 {
    if stat.is_nan() {
        f64::NAN
    } else if stat == f64::INFINITY {
        0.0
    } else {
        sf(stat)
    }
}

/// Residuals scaled by a leave-one-out estimate of their standard deviation.
fn externally_studentized(fit: &LineFit) -> Vec<f64> {
    let df = fit.df_resid() as f64;
    fit.residuals
        .iter()
        .zip(&fit.leverage)
        .map(|(&r, &h)| {
            if df < 2.0 {
                return f64::NAN;
            }
            let s2 = (fit.ssr - r * r / (1.0 - h)) / (df - 1.0);
            r / (s2 * (1.0 - h)).sqrt()
        })
        .collect()
}

/// `(v - mean) / std` with the population standard deviation.
fn standardize(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();
    values.iter().map(|v| (v - mean) / std).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{bet_loading, bet_y, bet_y2};

    fn opts() -> EvalOptions {
        EvalOptions {
            cross_section: 0.142e-18,
            zero_intercept_sentinel: 1e23,
        }
    }

    fn row(p_rel: f64, loading: f64) -> PreparedRow {
        PreparedRow {
            pressure: p_rel * 1e5,
            loading,
            p_rel,
            bet_y: bet_y(p_rel, loading),
            bet_y2: bet_y2(p_rel, loading),
            phi: 0.0,
        }
    }

    /// Exact BET isotherm with a small deterministic wobble.
    fn bet_rows(qm: f64, c: f64, wobble: f64) -> Vec<PreparedRow> {
        (0..30)
            .map(|i| {
                let p = 0.002 * 1.2f64.powi(i);
                let noise = wobble * ((i * 7 % 5) as f64 - 2.0);
                row(p, bet_loading(p, qm, c) * (1.0 + noise))
            })
            .collect()
    }

    #[test]
    fn exact_bet_region_recovers_parameters() {
        let rows = bet_rows(10.0, 100.0, 0.0);
        let fit = evaluate_region(&rows, 8, 16, Some(29), &opts()).unwrap();
        assert!((fit.c_constant - 100.0).abs() < 1e-6);
        assert!((fit.qm - 10.0).abs() < 1e-9);
        assert!((fit.a_bet - surface_area(10.0, 0.142e-18)).abs() < 1e-6);
        assert_eq!(fit.length(), 8);
        assert!(fit.con1 && fit.con2);
        assert!(fit.stats.r_squared > 0.999_999);
    }

    #[test]
    fn monolayer_crossing_interpolates_between_brackets() {
        let rows = vec![row(0.01, 2.0), row(0.02, 4.0), row(0.04, 8.0)];
        let x = monolayer_crossing(&rows, 6.0).unwrap();
        assert!((x - 0.03).abs() < 1e-12);
        assert!(monolayer_crossing(&rows, 1.0).is_none());
        assert!(monolayer_crossing(&rows, 9.0).is_none());
        assert!(monolayer_crossing(&rows, f64::NAN).is_none());
    }

    #[test]
    fn con3_and_con4_hold_around_the_monolayer_point() {
        // C = 100: monolayer pressure 1/11 ≈ 0.0909.
        let rows = bet_rows(10.0, 100.0, 0.0);
        let around = rows.iter().position(|r| r.p_rel > 0.0909).unwrap();
        let fit = evaluate_region(&rows, around - 3, around + 3, Some(29), &opts()).unwrap();
        assert!(fit.con3, "x_bet3={:?}", fit.x_bet3);
        assert!(fit.con4);

        // A region entirely below the monolayer pressure misses con3 but not con4.
        let fit = evaluate_region(&rows, 0, 5, Some(29), &opts()).unwrap();
        assert!(!fit.con3);
        assert!(fit.con4);
    }

    #[test]
    fn con1_uses_the_bound_or_the_global_maximum() {
        let rows = bet_rows(10.0, 100.0, 0.0);
        let fit = evaluate_region(&rows, 10, 16, Some(12), &opts()).unwrap();
        assert!(!fit.con1);
        assert_eq!(fit.x_max, rows[12].p_rel);

        // bet_y2 of a BET isotherm rises monotonically, so the fallback is the last row.
        let fit = evaluate_region(&rows, 10, 16, None, &opts()).unwrap();
        assert!(fit.con1);
        assert_eq!(fit.x_max, rows[29].p_rel);
    }

    #[test]
    fn statistics_are_reported() {
        let rows = bet_rows(10.0, 100.0, 0.004);
        let fit = evaluate_region(&rows, 6, 16, Some(29), &opts()).unwrap();
        let stats = &fit.stats;
        assert_eq!(stats.n, 10);
        assert_eq!(stats.studentized.len(), 10);
        assert!(stats.r_squared < 1.0 && stats.r_squared > 0.9);
        assert!(stats.adj_r_squared < stats.r_squared);
        assert!(stats.f_pvalue >= 0.0 && stats.f_pvalue < 1e-6);
        assert!(stats.max_t_pvalue() >= 0.0 && stats.max_t_pvalue() <= 1.0);
        assert!(stats.shapiro_pvalue > 0.0 && stats.shapiro_pvalue <= 1.0);
        assert!(stats.shapiro_w > 0.0 && stats.shapiro_w <= 1.0);
    }

    #[test]
    fn externally_studentized_residuals_flag_a_planted_outlier() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 1.0 + 2.0 * v + 0.01 * ((*v as i32 % 3) as f64 - 1.0)).collect();
        y[5] += 3.0;
        let fit = fit_line(&x, &y).unwrap();
        let stats = region_statistics(&fit, &x, &y);
        assert!(stats.has_outlier);
        assert_eq!(stats.outliers, vec![(5.0, y[5])]);
    }

    #[test]
    fn zero_intercept_uses_the_sentinel() {
        // bet_y exactly proportional to p_rel.
        let rows: Vec<PreparedRow> = [0.01, 0.02, 0.03, 0.04, 0.05]
            .iter()
            .map(|&p| PreparedRow {
                bet_y: 4.0 * p,
                ..row(p, 1.0)
            })
            .collect();
        let fit = evaluate_region(&rows, 0, 5, Some(4), &opts()).unwrap();
        if fit.intercept != 1e23 {
            // The SVD solve left a tiny non-zero intercept; nothing to guard.
            assert!(fit.intercept.abs() < 1e-12);
        } else {
            assert!((fit.c_constant - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_regions_are_errors() {
        let rows = bet_rows(10.0, 100.0, 0.0);
        assert!(matches!(
            evaluate_region(&rows, 3, 4, None, &opts()),
            Err(BetError::DegenerateRegion { .. })
        ));
        assert!(matches!(
            evaluate_region(&rows, 25, 31, None, &opts()),
            Err(BetError::DegenerateRegion { .. })
        ));

        let flat = vec![row(0.05, 1.0), row(0.05, 1.1), row(0.05, 1.2)];
        assert!(matches!(
            evaluate_region(&flat, 0, 3, Some(0), &opts()),
            Err(BetError::DegenerateRegion { .. })
        ));
    }
}
