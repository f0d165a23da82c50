//! BET theory as small, pure functions.
//!
//! The region evaluator and the reporting code share these:
//! - derived columns of a measurement (`p_rel`, `bet_y`, `bet_y2`, `phi`)
//! - BET parameters from a fitted line (`C`, `qm`, area)
//! - the isotherm implied by a parameter pair

use crate::domain::{AVOGADRO, GAS_CONSTANT};

/// BET-linearised ordinate `p_rel / (loading (1 - p_rel))`.
pub fn bet_y(p_rel: f64, loading: f64) -> f64 {
    p_rel / (loading * (1.0 - p_rel))
}

/// `loading (1 - p_rel)`, maximised at the consistency-1 bound.
pub fn bet_y2(p_rel: f64, loading: f64) -> f64 {
    loading * (1.0 - p_rel)
}

/// Excess sorption work (J/g) for a loading in mol/kg at temperature `t` (K).
pub fn excess_sorption_work(p_rel: f64, loading: f64, t: f64) -> f64 {
    loading / 1000.0 * GAS_CONSTANT * t * p_rel.ln()
}

/// `C = slope / intercept + 1`.
pub fn c_constant(slope: f64, intercept: f64) -> f64 {
    slope / intercept + 1.0
}

/// Monolayer loading `qm = 1 / (slope + intercept)` (mol/kg).
pub fn monolayer_loading(slope: f64, intercept: f64) -> f64 {
    1.0 / (slope + intercept)
}

/// Surface area (m²/g) covered by `loading` mol/kg of molecules with the given
/// cross-section (m²/molecule).
pub fn surface_area(loading: f64, cross_section: f64) -> f64 {
    loading * AVOGADRO * cross_section / 1000.0
}

/// Relative pressure at which the BET isotherm reaches monolayer coverage,
/// `1 / (sqrt(C) + 1)`. NaN for negative `C`.
pub fn monolayer_pressure(c: f64) -> f64 {
    1.0 / (c.sqrt() + 1.0)
}

/// BET loading at `p_rel` for parameters `(qm, C)`.
pub fn bet_loading(p_rel: f64, qm: f64, c: f64) -> f64 {
    let y = (c - 1.0) / (qm * c) * p_rel + 1.0 / (qm * c);
    p_rel / (y * (1.0 - p_rel))
}

/// Loading of the `layers`-layer BET isotherm. It saturates at `layers * qm` and
/// reduces to [`bet_loading`] as `layers` grows.
pub fn bet_loading_layers(p_rel: f64, qm: f64, c: f64, layers: f64) -> f64 {
    let x = p_rel;
    let numerator = qm * c * x * (1.0 - (layers + 1.0) * x.powf(layers) + layers * x.powf(layers + 1.0));
    let denominator = (1.0 - x) * (1.0 + (c - 1.0) * x - c * x.powf(layers + 1.0));
    numerator / denominator
}
