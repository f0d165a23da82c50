//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during region search
//! - exported to JSON/CSV
//! - read back from TOML settings files

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BetError;

/// Ideal gas constant (J/mol/K).
pub const GAS_CONSTANT: f64 = 8.314;

/// Avogadro's number (molecules/mol), as used by the reference analysis.
pub const AVOGADRO: f64 = 6.023e23;

/// Saturation pressure (Pa) used for the built-in adsorbates.
pub const DEFAULT_P_SAT: f64 = 1e5;

/// One raw isotherm measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsothermPoint {
    /// Absolute pressure (Pa).
    pub pressure: f64,
    /// Adsorbed amount (mol/kg).
    pub loading: f64,
}

impl IsothermPoint {
    pub fn new(pressure: f64, loading: f64) -> Self {
        Self { pressure, loading }
    }
}

/// A measurement plus the derived columns used by BET analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreparedRow {
    pub pressure: f64,
    pub loading: f64,
    /// `pressure / p_sat`.
    pub p_rel: f64,
    /// BET-linearised ordinate `p_rel / (loading (1 - p_rel))`.
    pub bet_y: f64,
    /// `loading (1 - p_rel)`; its maximum bounds the first consistency criterion.
    pub bet_y2: f64,
    /// Excess sorption work (J/g).
    pub phi: f64,
}

/// Indices of the two reference extrema of a prepared isotherm.
///
/// `None` means "no trustworthy extremum"; downstream code treats it as "cannot be
/// enforced" rather than as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceExtrema {
    /// Index of the `bet_y2` maximum.
    pub con1_limit: Option<usize>,
    /// Index of the `phi` minimum.
    pub esw_minimum: Option<usize>,
}

/// Caller-supplied extrema that replace the computed ones.
///
/// A `Some` field skips the corresponding extremum search entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualExtrema {
    pub con1_limit: Option<usize>,
    pub esw_minimum: Option<usize>,
}

/// Which direction of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Minimum,
    Maximum,
}

/// Adsorbate selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GasKind {
    Argon,
    Nitrogen,
    Custom,
}

/// The adsorbate and its fixed physical constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gas", rename_all = "lowercase")]
pub enum Adsorbate {
    /// Argon at 87 K.
    Argon,
    /// Nitrogen at 77 K.
    Nitrogen,
    Custom {
        /// Saturation pressure (Pa).
        p_sat: f64,
        /// Adsorption temperature (K).
        temperature: f64,
        /// Molecular cross-section (m²/molecule).
        cross_section: f64,
    },
}

impl Adsorbate {
    pub fn p_sat(&self) -> f64 {
        match self {
            Adsorbate::Argon | Adsorbate::Nitrogen => DEFAULT_P_SAT,
            Adsorbate::Custom { p_sat, .. } => *p_sat,
        }
    }

    pub fn temperature(&self) -> f64 {
        match self {
            Adsorbate::Argon => 87.0,
            Adsorbate::Nitrogen => 77.0,
            Adsorbate::Custom { temperature, .. } => *temperature,
        }
    }

    pub fn cross_section(&self) -> f64 {
        match self {
            Adsorbate::Argon => 0.142e-18,
            Adsorbate::Nitrogen => 0.162e-18,
            Adsorbate::Custom { cross_section, .. } => *cross_section,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Adsorbate::Argon => "Argon (87 K)",
            Adsorbate::Nitrogen => "Nitrogen (77 K)",
            Adsorbate::Custom { .. } => "Custom",
        }
    }

    fn validate(&self) -> Result<(), BetError> {
        let Adsorbate::Custom {
            p_sat,
            temperature,
            cross_section,
        } = self
        else {
            return Ok(());
        };
        for (name, value) in [
            ("p_sat", p_sat),
            ("temperature", temperature),
            ("cross_section", cross_section),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                return Err(BetError::InvalidConfig(format!(
                    "custom adsorbate {name} must be finite and > 0 (got {value})."
                )));
            }
        }
        Ok(())
    }
}

/// Which analyses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Unconstrained BET only.
    Bet,
    /// BET, then BET constrained to contain the ESW minimum.
    #[value(name = "bet-esw")]
    #[serde(rename = "bet-esw")]
    BetAndBetEsw,
}

impl Scope {
    pub fn display_name(self) -> &'static str {
        match self {
            Scope::Bet => "BET",
            Scope::BetAndBetEsw => "BET and BET+ESW",
        }
    }
}

/// Region selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Any region satisfying the gates.
    Bet,
    /// Regions that strictly straddle the ESW minimum.
    BetEsw,
}

impl SelectionMode {
    pub fn display_name(self) -> &'static str {
        match self {
            SelectionMode::Bet => "BET",
            SelectionMode::BetEsw => "BET+ESW",
        }
    }
}

/// Analysis settings.
///
/// The statistical gates, the region span cap and the zero-intercept sentinel are
/// inherited policy values; changing them changes the selected regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub adsorbate: Adsorbate,
    /// R² above which a fully consistent region ends the search.
    pub r2_cutoff: f64,
    /// R² floor for a region to be a candidate at all.
    pub r2_min: f64,
    /// Minimum number of points in a region.
    pub min_line_length: usize,
    pub scope: Scope,
    /// Half-width of the extremum slope/mean windows.
    pub window: usize,
    /// Largest allowed `q - p`.
    pub max_region_span: usize,
    /// Substituted for an exactly-zero intercept.
    pub zero_intercept_sentinel: f64,
    /// Candidates need an F-test p-value below this.
    pub f_pvalue_max: f64,
    /// Candidates need both parameter t-test p-values below this.
    pub t_pvalue_max: f64,
    /// Candidates need a Shapiro–Wilk p-value above this.
    pub shapiro_pvalue_min: f64,
    pub manual: ManualExtrema,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            adsorbate: Adsorbate::Argon,
            r2_cutoff: 0.9995,
            r2_min: 0.998,
            min_line_length: 4,
            scope: Scope::BetAndBetEsw,
            window: 3,
            max_region_span: 10,
            zero_intercept_sentinel: 1e23,
            f_pvalue_max: 0.99,
            t_pvalue_max: 0.99,
            shapiro_pvalue_min: 0.01,
            manual: ManualExtrema::default(),
        }
    }
}

impl AnalysisConfig {
    /// Reject settings that would make the search meaningless.
    pub fn validate(&self) -> Result<(), BetError> {
        self.adsorbate.validate()?;
        for (name, value) in [("r2_cutoff", self.r2_cutoff), ("r2_min", self.r2_min)] {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(BetError::InvalidConfig(format!(
                    "{name} must lie in [0, 1] (got {value})."
                )));
            }
        }
        if self.min_line_length < 2 {
            return Err(BetError::InvalidConfig(
                "min_line_length must be at least 2.".to_string(),
            ));
        }
        if self.window == 0 {
            return Err(BetError::InvalidConfig("window must be at least 1.".to_string()));
        }
        if self.max_region_span < self.min_line_length {
            return Err(BetError::InvalidConfig(format!(
                "max_region_span ({}) must be >= min_line_length ({}).",
                self.max_region_span, self.min_line_length
            )));
        }
        if !(self.zero_intercept_sentinel.is_finite() && self.zero_intercept_sentinel != 0.0) {
            return Err(BetError::InvalidConfig(
                "zero_intercept_sentinel must be finite and non-zero.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistical diagnostics of a straight-line fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub n: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_value: f64,
    pub f_pvalue: f64,
    /// t statistics for `[intercept, slope]`.
    pub t_values: [f64; 2],
    /// Two-sided p-values for `[intercept, slope]`.
    pub t_pvalues: [f64; 2],
    /// Externally studentized residuals, one per point.
    pub studentized: Vec<f64>,
    /// `true` when any |studentized residual| exceeds the outlier threshold.
    pub has_outlier: bool,
    /// `(p_rel, bet_y)` of the points whose studentized residual exceeds the threshold.
    pub outliers: Vec<(f64, f64)>,
    pub shapiro_w: f64,
    pub shapiro_pvalue: f64,
}

impl RegionStats {
    /// The larger of the two parameter p-values.
    pub fn max_t_pvalue(&self) -> f64 {
        self.t_pvalues[0].max(self.t_pvalues[1])
    }
}

/// Everything derived from fitting one candidate region `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFit {
    pub start: usize,
    pub end: usize,
    pub slope: f64,
    /// Fitted intercept after the zero-intercept guard.
    pub intercept: f64,
    pub c_constant: f64,
    /// Monolayer loading (mol/kg).
    pub qm: f64,
    /// BET surface area (m²/g).
    pub a_bet: f64,
    /// Relative pressure of the consistency-1 bound.
    pub x_max: f64,
    /// Interpolated relative pressure at which `loading == qm`.
    pub x_bet3: Option<f64>,
    /// `1 / (sqrt(C) + 1)`.
    pub x_bet4: f64,
    pub con1: bool,
    pub con2: bool,
    pub con3: bool,
    pub con4: bool,
    pub stats: RegionStats,
}

impl RegionFit {
    /// Number of points in the region.
    pub fn length(&self) -> usize {
        self.end - self.start
    }

    /// Count of satisfied criteria among con3 and con4.
    pub fn consistency_score(&self) -> u8 {
        u8::from(self.con3) + u8::from(self.con4)
    }
}

/// Selected region for one selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

/// Why an analysis mode produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    BetLinearFailure,
    NoEswMinima,
    #[serde(rename = "BETESW_LINEAR_FAILURE")]
    BetEswLinearFailure,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::BetLinearFailure => "BET_LINEAR_FAILURE",
            FailureReason::NoEswMinima => "NO_ESW_MINIMA",
            FailureReason::BetEswLinearFailure => "BETESW_LINEAR_FAILURE",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Headline numbers for one successful analysis mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetResult {
    pub mode: SelectionMode,
    pub c_constant: f64,
    pub qm: f64,
    pub a_bet: f64,
    pub con3: bool,
    pub con4: bool,
    /// Number of points in the region.
    pub length: usize,
    pub r_squared: f64,
    /// Pressure (Pa) of the first row of the region.
    pub low_pressure: f64,
    /// Pressure (Pa) of the row that closes the region.
    pub high_pressure: f64,
    pub fit: RegionFit,
}

/// Monolayer estimate read directly off the ESW minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EswSummary {
    pub index: usize,
    pub pressure: f64,
    pub p_rel: f64,
    pub loading: f64,
    /// `loading * N_A * cross_section / 1000` (m²/g).
    pub area: f64,
}

/// Full output of one isotherm analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub extrema: ReferenceExtrema,
    /// Relative pressure used as the consistency-1 bound.
    pub con1_p_rel: f64,
    pub esw: Option<EswSummary>,
    pub bet: Result<BetResult, FailureReason>,
    /// `None` when the scope is BET only, or when the BET analysis already failed.
    pub bet_esw: Option<Result<BetResult, FailureReason>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_adsorbates_carry_reference_constants() {
        assert_eq!(Adsorbate::Argon.temperature(), 87.0);
        assert_eq!(Adsorbate::Nitrogen.temperature(), 77.0);
        assert_eq!(Adsorbate::Argon.cross_section(), 0.142e-18);
        assert_eq!(Adsorbate::Nitrogen.cross_section(), 0.162e-18);
        assert_eq!(Adsorbate::Argon.p_sat(), DEFAULT_P_SAT);
    }

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_line_length, 4);
        assert_eq!(config.max_region_span, 10);
    }

    #[test]
    fn config_rejects_bad_custom_gas_and_lengths() {
        let config = AnalysisConfig {
            adsorbate: Adsorbate::Custom {
                p_sat: 1e5,
                temperature: -1.0,
                cross_section: 0.1e-18,
            },
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(BetError::InvalidConfig(_))));

        let config = AnalysisConfig {
            min_line_length: 12,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn failure_reasons_render_as_markers() {
        assert_eq!(FailureReason::BetLinearFailure.to_string(), "BET_LINEAR_FAILURE");
        assert_eq!(FailureReason::NoEswMinima.to_string(), "NO_ESW_MINIMA");
        assert_eq!(
            serde_json::to_string(&FailureReason::BetEswLinearFailure).unwrap(),
            "\"BETESW_LINEAR_FAILURE\""
        );
    }
}
