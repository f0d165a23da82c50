//! End-to-end analysis of one isotherm.
//!
//! Runs the unconstrained BET search first. When it finds a region and the scope
//! asks for it, the search is repeated with the region forced to straddle the
//! excess-sorption-work minimum. Each mode either produces a [`BetResult`] or a
//! [`FailureReason`]; only malformed input is an error.

use log::{info, warn};
use rayon::prelude::*;

use crate::domain::{
    AnalysisConfig, AnalysisReport, BetResult, EswSummary, FailureReason, IsothermPoint, PreparedRow,
    Scope, Selection, SelectionMode,
};
use crate::error::BetError;
use crate::fit::prepare::{PreparedIsotherm, global_bet_y2_max, prepare};
use crate::fit::region::{EvalOptions, evaluate_region};
use crate::fit::selection::select_region;
use crate::models::surface_area;

/// Prepare `points` and run every analysis the scope asks for.
pub fn analyze(points: &[IsothermPoint], config: &AnalysisConfig) -> Result<AnalysisReport, BetError> {
    config.validate()?;
    let prepared = prepare(points, &config.adsorbate, config.window, config.manual)?;
    analyze_prepared(&prepared, config)
}

/// Analyse several isotherms in parallel. Results keep the input order.
pub fn analyze_batch(
    isotherms: &[Vec<IsothermPoint>],
    config: &AnalysisConfig,
) -> Vec<Result<AnalysisReport, BetError>> {
    isotherms
        .par_iter()
        .map(|points| analyze(points, config))
        .collect()
}

/// Run the analyses on an already prepared isotherm.
pub fn analyze_prepared(
    prepared: &PreparedIsotherm,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, BetError> {
    let rows = &prepared.rows;
    let extrema = prepared.extrema;

    let bound = extrema
        .con1_limit
        .or_else(|| global_bet_y2_max(rows))
        .ok_or(BetError::InsufficientData {
            points: rows.len(),
            required: 2 * config.window + 1,
        })?;
    let con1_p_rel = row_at(rows, "con1_limit", bound)?.p_rel;

    let cross_section = config.adsorbate.cross_section();
    let esw = extrema
        .esw_minimum
        .map(|index| {
            row_at(rows, "esw_minimum", index).map(|row| EswSummary {
                index,
                pressure: row.pressure,
                p_rel: row.p_rel,
                loading: row.loading,
                area: surface_area(row.loading, cross_section),
            })
        })
        .transpose()?;

    info!(
        "Prepared {} points: con1 bound at row {bound} (p_rel {con1_p_rel:.4}), ESW minimum {:?}.",
        rows.len(),
        extrema.esw_minimum
    );

    let bet = match select_region(rows, &extrema, SelectionMode::Bet, config) {
        Some(selection) => Ok(summarize(prepared, selection, SelectionMode::Bet, config)?),
        None => {
            warn!("No BET region satisfies the selection criteria.");
            Err(FailureReason::BetLinearFailure)
        }
    };

    let bet_esw = match (&bet, config.scope) {
        (Err(_), _) | (Ok(_), Scope::Bet) => None,
        (Ok(_), Scope::BetAndBetEsw) => Some(match extrema.esw_minimum {
            None => {
                warn!("No excess-sorption-work minimum; BET+ESW is not possible.");
                Err(FailureReason::NoEswMinima)
            }
            Some(_) => match select_region(rows, &extrema, SelectionMode::BetEsw, config) {
                Some(selection) => Ok(summarize(prepared, selection, SelectionMode::BetEsw, config)?),
                None => {
                    warn!("No BET+ESW region satisfies the selection criteria.");
                    Err(FailureReason::BetEswLinearFailure)
                }
            },
        }),
    };

    Ok(AnalysisReport {
        extrema,
        con1_p_rel,
        esw,
        bet,
        bet_esw,
    })
}

/// Re-evaluate a selected region on the full table and collect the headline numbers.
fn summarize(
    prepared: &PreparedIsotherm,
    selection: Selection,
    mode: SelectionMode,
    config: &AnalysisConfig,
) -> Result<BetResult, BetError> {
    let rows = &prepared.rows;
    let opts = EvalOptions {
        cross_section: config.adsorbate.cross_section(),
        zero_intercept_sentinel: config.zero_intercept_sentinel,
    };
    let fit = evaluate_region(
        rows,
        selection.start,
        selection.end,
        prepared.extrema.con1_limit,
        &opts,
    )?;

    // The row just past the region closes it.
    let closing = rows.get(selection.end).ok_or_else(|| BetError::DegenerateRegion {
        start: selection.start,
        end: selection.end,
        reason: "no closing row after the region".to_string(),
    })?;

    info!(
        "{}: rows [{}, {}) A = {:.2} m²/g, C = {:.3}, qm = {:.4} mol/kg, R² = {:.6}.",
        mode.display_name(),
        selection.start,
        selection.end,
        fit.a_bet,
        fit.c_constant,
        fit.qm,
        fit.stats.r_squared
    );

    Ok(BetResult {
        mode,
        c_constant: fit.c_constant,
        qm: fit.qm,
        a_bet: fit.a_bet,
        con3: fit.con3,
        con4: fit.con4,
        length: fit.length(),
        r_squared: fit.stats.r_squared,
        low_pressure: rows[selection.start].pressure,
        high_pressure: closing.pressure,
        fit,
    })
}

/// Row of an extremum index, or an error when the index is outside the table.
fn row_at(rows: &[PreparedRow], name: &'static str, index: usize) -> Result<PreparedRow, BetError> {
    rows.get(index).copied().ok_or(BetError::InvalidOverride {
        name,
        index,
        len: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ManualExtrema, ReferenceExtrema};
    use crate::models::bet_loading;

    /// BET isotherm (qm = 10, C = 100) sampled on a geometric relative-pressure grid.
    fn grid_points(n: usize, p0: f64, ratio: f64) -> Vec<IsothermPoint> {
        (0..n)
            .map(|i| {
                let p_rel = p0 * ratio.powi(i as i32);
                let noise = 0.001 * (i as f64 * 2.3).sin();
                IsothermPoint::new(p_rel * 1e5, bet_loading(p_rel, 10.0, 100.0) * (1.0 + noise))
            })
            .collect()
    }

    fn bet_points(n: usize) -> Vec<IsothermPoint> {
        grid_points(n, 0.002, 1.2)
    }

    #[test]
    fn insufficient_points_propagate() {
        let err = analyze(&bet_points(5), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, BetError::InsufficientData { points: 5, .. }));
    }

    #[test]
    fn bet_only_scope_skips_esw_analysis() {
        let config = AnalysisConfig {
            scope: Scope::Bet,
            ..AnalysisConfig::default()
        };
        let report = analyze(&bet_points(30), &config).unwrap();
        let bet = report.bet.unwrap();
        assert_eq!(bet.mode, SelectionMode::Bet);
        assert!(bet.length >= 4 && bet.length <= 10);
        assert!(bet.low_pressure < bet.high_pressure);
        assert!(report.bet_esw.is_none());
    }

    #[test]
    fn missing_esw_minimum_is_reported() {
        // phi keeps falling below p_rel = 0.01 for this isotherm.
        let report = analyze(&grid_points(30, 0.0003, 1.12), &AnalysisConfig::default()).unwrap();
        assert!(report.bet.is_ok());
        assert_eq!(report.extrema.esw_minimum, None);
        assert!(report.esw.is_none());
        assert_eq!(report.bet_esw, Some(Err(FailureReason::NoEswMinima)));
    }

    #[test]
    fn manual_esw_minimum_drives_the_constrained_search() {
        let config = AnalysisConfig {
            manual: ManualExtrema {
                con1_limit: None,
                esw_minimum: Some(15),
            },
            ..AnalysisConfig::default()
        };
        let points = bet_points(30);
        let report = analyze(&points, &config).unwrap();

        let esw = report.esw.unwrap();
        assert_eq!(esw.index, 15);
        assert!((esw.area - surface_area(esw.loading, 0.142e-18)).abs() < 1e-9);

        let constrained = report.bet_esw.unwrap().unwrap();
        assert_eq!(constrained.mode, SelectionMode::BetEsw);
        assert!(constrained.fit.start < 15 && constrained.fit.end - 1 > 15);
    }

    #[test]
    fn impossible_gates_give_bet_failure_and_no_esw_attempt() {
        let config = AnalysisConfig {
            r2_min: 1.0,
            ..AnalysisConfig::default()
        };
        let report = analyze(&bet_points(30), &config).unwrap();
        assert_eq!(report.bet, Err(FailureReason::BetLinearFailure));
        assert!(report.bet_esw.is_none());
    }

    #[test]
    fn con1_bound_on_the_last_row_reports_an_existing_closing_row() {
        let config = AnalysisConfig {
            scope: Scope::Bet,
            manual: ManualExtrema {
                con1_limit: Some(29),
                esw_minimum: None,
            },
            ..AnalysisConfig::default()
        };
        let points = bet_points(30);
        let prepared = prepare(&points, &config.adsorbate, config.window, config.manual).unwrap();
        let bet = analyze_prepared(&prepared, &config).unwrap().bet.unwrap();
        assert!(bet.fit.end <= 29);
        assert_eq!(bet.high_pressure, prepared.rows[bet.fit.end].pressure);
    }

    #[test]
    fn out_of_range_extrema_are_errors_not_panics() {
        let config = AnalysisConfig::default();
        let mut prepared = prepare(&bet_points(30), &config.adsorbate, config.window, config.manual).unwrap();

        prepared.extrema = ReferenceExtrema {
            con1_limit: Some(30),
            esw_minimum: None,
        };
        let err = analyze_prepared(&prepared, &config).unwrap_err();
        assert!(matches!(err, BetError::InvalidOverride { name: "con1_limit", index: 30, len: 30 }));

        prepared.extrema = ReferenceExtrema {
            con1_limit: Some(20),
            esw_minimum: Some(40),
        };
        let err = analyze_prepared(&prepared, &config).unwrap_err();
        assert!(matches!(err, BetError::InvalidOverride { name: "esw_minimum", index: 40, .. }));
    }

    #[test]
    fn batch_keeps_input_order() {
        let config = AnalysisConfig::default();
        let results = analyze_batch(&[bet_points(30), bet_points(4)], &config);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(BetError::InsufficientData { points: 4, .. })));
    }
}
