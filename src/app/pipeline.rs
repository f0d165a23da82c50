//! Shared analysis pipeline used by the `analyze` and `batch` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> prepare -> BET search -> BET+ESW search -> optional area prediction
//!
//! The commands can then focus on presentation and exports.

use std::path::Path;

use crate::domain::{AnalysisConfig, AnalysisReport, IsothermPoint};
use crate::error::AppError;
use crate::fit::{PreparedIsotherm, analyze_prepared, prepare};
use crate::io::ingest::load_isotherm;
use crate::models::AreaModel;

/// All computed outputs of one analysis.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub points: Vec<IsothermPoint>,
    pub prepared: PreparedIsotherm,
    pub report: AnalysisReport,
    pub predicted_area: Option<f64>,
}

/// Load an isotherm file and analyse it.
pub fn run_file(path: &Path, config: &AnalysisConfig, model: Option<&AreaModel>) -> Result<RunOutput, AppError> {
    let points = load_isotherm(path)?;
    run_points(points, config, model)
}

/// Analyse points that are already in memory.
pub fn run_points(
    points: Vec<IsothermPoint>,
    config: &AnalysisConfig,
    model: Option<&AreaModel>,
) -> Result<RunOutput, AppError> {
    config.validate()?;
    let prepared = prepare(&points, &config.adsorbate, config.window, config.manual)?;
    let report = analyze_prepared(&prepared, config)?;
    let predicted_area = model.and_then(|m| m.predict(&points));

    Ok(RunOutput {
        points,
        prepared,
        report,
        predicted_area,
    })
}
