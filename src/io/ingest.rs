//! Isotherm file ingest and validation.
//!
//! Accepted layout: a header row naming `Pressure (Pa)` and `Loading (mol/kg)`
//! (any order, surrounding whitespace ignored), then one numeric row per point.
//! `.csv` files are comma separated; anything else (`.txt`, `.tsv`) is tab
//! separated.
//!
//! Unlike a permissive loader, every row must parse: a malformed row aborts the
//! ingest with its line number, since silently dropping measurements changes the
//! analysis.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::IsothermPoint;
use crate::error::AppError;

pub const PRESSURE_HEADER: &str = "Pressure (Pa)";
pub const LOADING_HEADER: &str = "Loading (mol/kg)";

/// Upper bound on `first loading / last loading` for the isotherm to reach low
/// enough pressure.
pub const LOW_PRESSURE_COVERAGE: f64 = 0.05;

/// Field delimiter implied by the file extension.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Load an isotherm file.
pub fn load_isotherm(path: &Path) -> Result<Vec<IsothermPoint>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open isotherm '{}': {e}", path.display())))?;
    let points = read_isotherm(file, delimiter_for(path))
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    Ok(points)
}

/// Parse isotherm rows from any reader.
pub fn read_isotherm<R: Read>(reader: R, delimiter: u8) -> Result<Vec<IsothermPoint>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read header row: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let pressure_col = required_column(&header_map, PRESSURE_HEADER)?;
    let loading_col = required_column(&header_map, LOADING_HEADER)?;

    let mut points = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("Line {line}: parse error: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let pressure = parse_field(&record, pressure_col, PRESSURE_HEADER, line)?;
        let loading = parse_field(&record, loading_col, LOADING_HEADER, line)?;
        points.push(IsothermPoint::new(pressure, loading));
    }

    if points.is_empty() {
        return Err(AppError::new(3, "Isotherm contains no data rows."));
    }
    check_low_pressure_coverage(&points)?;

    Ok(points)
}

/// Require the lowest-pressure loading to be well below the highest-pressure one.
pub fn check_low_pressure_coverage(points: &[IsothermPoint]) -> Result<(), AppError> {
    let lowest = points.iter().min_by(|a, b| a.pressure.total_cmp(&b.pressure));
    let highest = points.iter().max_by(|a, b| a.pressure.total_cmp(&b.pressure));
    let (Some(first), Some(last)) = (lowest, highest) else {
        return Ok(());
    };
    let ratio = first.loading / last.loading;
    if ratio < LOW_PRESSURE_COVERAGE {
        Ok(())
    } else {
        Err(AppError::new(
            2,
            format!(
                "Isotherm does not reach low enough pressure: first/last loading ratio {ratio:.3} \
                 must be below {LOW_PRESSURE_COVERAGE}."
            ),
        ))
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn required_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column '{name}'.")))
}

fn parse_field(record: &StringRecord, col: usize, name: &str, line: usize) -> Result<f64, AppError> {
    let raw = record
        .get(col)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(2, format!("Line {line}: missing '{name}' value.")))?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::new(2, format!("Line {line}: '{name}' value '{raw}' is not a number.")))
}
