//! CSV exports.
//!
//! - the prepared analysis table, for spreadsheets or downstream scripts
//! - raw isotherms in the ingest layout (used by `bet synth`)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{IsothermPoint, PreparedRow};
use crate::error::AppError;
use crate::io::ingest::{LOADING_HEADER, PRESSURE_HEADER, delimiter_for};

/// Write the prepared table, one row per measurement.
pub fn write_prepared_csv(path: &Path, rows: &[PreparedRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "index,pressure_pa,loading_mol_kg,p_rel,bet_y,bet_y2,phi_j_g")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, r) in rows.iter().enumerate() {
        writeln!(
            file,
            "{i},{},{},{:.10e},{:.10e},{:.10e},{:.10e}",
            r.pressure, r.loading, r.p_rel, r.bet_y, r.bet_y2, r.phi,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write raw points with the header `load_isotherm` expects. The delimiter follows
/// the file extension.
pub fn write_isotherm(path: &Path, points: &[IsothermPoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create isotherm '{}': {e}", path.display())))?;
    let sep = delimiter_for(path) as char;

    writeln!(file, "{PRESSURE_HEADER}{sep}{LOADING_HEADER}")
        .map_err(|e| AppError::new(2, format!("Failed to write isotherm header: {e}")))?;
    for p in points {
        writeln!(file, "{}{sep}{}", p.pressure, p.loading)
            .map_err(|e| AppError::new(2, format!("Failed to write isotherm row: {e}")))?;
    }

    Ok(())
}
