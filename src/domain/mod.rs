//! Domain types used throughout the analysis.
//!
//! This module defines:
//!
//! - raw and prepared isotherm rows (`IsothermPoint`, `PreparedRow`)
//! - configuration (`AnalysisConfig`, `Adsorbate`, `Scope`)
//! - fit outputs (`RegionFit`, `BetResult`, `AnalysisReport`, etc.)

pub mod types;

pub use types::*;
