//! JSON report export.
//!
//! The report is the portable record of one analysis:
//! - the settings it ran with
//! - reference extrema and the ESW estimate
//! - per mode, either the result or its failure marker
//! - a fitted BET loading grid per successful mode, for quick plotting
//!
//! Non-finite statistics (for example an undefined Shapiro–Wilk p-value) are written
//! as `null`.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    AnalysisConfig, AnalysisReport, BetResult, EswSummary, FailureReason, PreparedRow, ReferenceExtrema,
};
use crate::error::AppError;
use crate::models::bet_loading;

/// Points in each fitted grid.
pub const GRID_POINTS: usize = 101;

#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    /// Input file, when the isotherm came from one.
    pub source: Option<String>,
    pub config: AnalysisConfig,
    pub extrema: ReferenceExtrema,
    pub con1_p_rel: f64,
    pub esw: Option<EswSummary>,
    pub bet: ModeEntry,
    pub bet_esw: Option<ModeEntry>,
    pub predicted_area: Option<f64>,
}

/// Outcome of one selection mode.
#[derive(Debug, Clone, Serialize)]
pub struct ModeEntry {
    /// `"OK"` or the failure marker.
    pub status: String,
    pub result: Option<BetResult>,
    pub fitted: Option<FittedGrid>,
}

/// BET loading implied by a fitted line over a relative-pressure grid.
#[derive(Debug, Clone, Serialize)]
pub struct FittedGrid {
    pub p_rel: Vec<f64>,
    pub loading: Vec<f64>,
}

/// Assemble the report for a finished analysis.
pub fn build_report(
    analysis: &AnalysisReport,
    rows: &[PreparedRow],
    config: &AnalysisConfig,
    source: Option<&Path>,
    predicted_area: Option<f64>,
) -> ReportFile {
    let p_min = rows.first().map(|r| r.p_rel).unwrap_or(0.0);
    let p_max = analysis.con1_p_rel;

    ReportFile {
        tool: "bet".to_string(),
        generated_at: Utc::now(),
        source: source.map(|p| p.display().to_string()),
        config: config.clone(),
        extrema: analysis.extrema,
        con1_p_rel: analysis.con1_p_rel,
        esw: analysis.esw,
        bet: mode_entry(&analysis.bet, p_min, p_max),
        bet_esw: analysis
            .bet_esw
            .as_ref()
            .map(|outcome| mode_entry(outcome, p_min, p_max)),
        predicted_area,
    }
}

/// Write a report as pretty JSON.
pub fn write_report_json(path: &Path, report: &ReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

fn mode_entry(outcome: &Result<BetResult, FailureReason>, p_min: f64, p_max: f64) -> ModeEntry {
    match outcome {
        Ok(result) => ModeEntry {
            status: "OK".to_string(),
            fitted: Some(build_grid(result.qm, result.c_constant, p_min, p_max, GRID_POINTS)),
            result: Some(result.clone()),
        },
        Err(reason) => ModeEntry {
            status: reason.code().to_string(),
            result: None,
            fitted: None,
        },
    }
}

fn build_grid(qm: f64, c: f64, p_min: f64, p_max: f64, n: usize) -> FittedGrid {
    let n = n.max(2);
    let (mut p0, mut p1) = (p_min, p_max);
    if !(p0.is_finite() && p1.is_finite() && p0 > 0.0 && p1 > p0 && p1 < 1.0) {
        p0 = 1e-4;
        p1 = 0.3;
    }

    let mut p_rel = Vec::with_capacity(n);
    let mut loading = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let p = p0 + u * (p1 - p0);
        p_rel.push(p);
        loading.push(bet_loading(p, qm, c));
    }

    FittedGrid { p_rel, loading }
}
