//! TOML settings files and area-model files.
//!
//! A settings file may set any subset of `AnalysisConfig`; missing keys keep their
//! defaults. Example:
//!
//! ```toml
//! r2_cutoff = 0.9995
//! scope = "bet-esw"
//!
//! [adsorbate]
//! gas = "nitrogen"
//! ```

use std::fs::File;
use std::path::Path;

use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::models::{AreaModel, default_bins};

/// Read analysis settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<AnalysisConfig, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read settings '{}': {e}", path.display())))?;
    parse_settings(&text).map_err(|e| AppError::new(2, format!("{}: {e}", path.display())))
}

/// Parse settings text. The result is not yet validated.
pub fn parse_settings(text: &str) -> Result<AnalysisConfig, AppError> {
    toml::from_str(text).map_err(|e| AppError::new(2, format!("Invalid settings: {e}")))
}

/// Read an area-prediction model from JSON and check its feature layout.
pub fn read_area_model(path: &Path) -> Result<AreaModel, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: AreaModel =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    model
        .validate(default_bins().len())
        .map_err(|e| AppError::new(2, format!("Model JSON '{}': {e}", path.display())))?;
    Ok(model)
}
