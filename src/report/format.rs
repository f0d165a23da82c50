//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code stays clean and testable
//! - output changes are localized

use std::fmt::Display;
use std::path::Path;

use crate::domain::{AnalysisConfig, AnalysisReport, BetResult, FailureReason};

/// Full summary of one analysis.
pub fn format_summary(
    source: &str,
    points: usize,
    report: &AnalysisReport,
    config: &AnalysisConfig,
    predicted_area: Option<f64>,
) -> String {
    let mut out = String::new();

    out.push_str("=== bet - BET surface area ===\n");
    out.push_str(&format!("Input: {source} ({points} points)\n"));
    out.push_str(&format!(
        "Adsorbate: {} | p_sat={} Pa | scope={}\n",
        config.adsorbate.display_name(),
        config.adsorbate.p_sat(),
        config.scope.display_name()
    ));
    out.push_str(&format!(
        "Consistency-1 bound: row {} (p/p0={:.4})\n",
        fmt_index(report.extrema.con1_limit),
        report.con1_p_rel
    ));

    match &report.esw {
        Some(esw) => out.push_str(&format!(
            "ESW minimum: row {} | p={:.2} Pa | q={:.4} mol/kg | A_ESW={:.1} m²/g\n",
            esw.index, esw.pressure, esw.loading, esw.area
        )),
        None => out.push_str("ESW minimum: none\n"),
    }

    out.push_str("\nBET:\n");
    out.push_str(&format_outcome(&report.bet));

    if let Some(outcome) = &report.bet_esw {
        out.push_str("\nBET+ESW:\n");
        out.push_str(&format_outcome(outcome));
    }

    if let Some(area) = predicted_area {
        out.push_str(&format!("\nPredicted area (binned-loading model): {area:.1} m²/g\n"));
    }

    out
}

/// One line per input file for `bet batch`.
pub fn format_batch_line<E: Display>(path: &Path, result: &Result<AnalysisReport, E>) -> String {
    let name = path.display();
    match result {
        Err(err) => format!("{name}: error: {err}"),
        Ok(report) => {
            let mut line = format!("{name}: BET {}", short_outcome(&report.bet));
            if let Some(outcome) = &report.bet_esw {
                line.push_str(&format!(" | BET+ESW {}", short_outcome(outcome)));
            }
            line
        }
    }
}

fn format_outcome(outcome: &Result<BetResult, FailureReason>) -> String {
    let result = match outcome {
        Ok(result) => result,
        Err(reason) => return format!("- {reason}\n"),
    };
    let fit = &result.fit;
    let mut out = String::new();
    out.push_str(&format!(
        "- A_BET = {:.1} m²/g | C = {:.2} | qm = {:.4} mol/kg\n",
        result.a_bet, result.c_constant, result.qm
    ));
    out.push_str(&format!(
        "- region: rows [{}, {}) ({} points) | p = [{:.2}, {:.2}] Pa\n",
        fit.start, fit.end, result.length, result.low_pressure, result.high_pressure
    ));
    out.push_str(&format!(
        "- R² = {:.6} | F p={} | t p={} | Shapiro-Wilk p={}\n",
        result.r_squared,
        fmt_p(fit.stats.f_pvalue),
        fmt_p(fit.stats.max_t_pvalue()),
        fmt_p(fit.stats.shapiro_pvalue)
    ));
    out.push_str(&format!(
        "- consistency: 1={} 2={} 3={} 4={}\n",
        yes_no(fit.con1),
        yes_no(fit.con2),
        yes_no(fit.con3),
        yes_no(fit.con4)
    ));
    if fit.stats.has_outlier {
        out.push_str(&format!("- outliers: {}\n", fit.stats.outliers.len()));
    }
    out
}

fn short_outcome(outcome: &Result<BetResult, FailureReason>) -> String {
    match outcome {
        Ok(r) => format!(
            "A={:.1} m²/g C={:.1} n={} R²={:.5} con3={} con4={}",
            r.a_bet,
            r.c_constant,
            r.length,
            r.r_squared,
            yes_no(r.con3),
            yes_no(r.con4)
        ),
        Err(reason) => reason.to_string(),
    }
}

fn fmt_index(index: Option<usize>) -> String {
    index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string())
}

fn fmt_p(p: f64) -> String {
    if p.is_finite() {
        format!("{p:.3e}")
    } else {
        "n/a".to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
