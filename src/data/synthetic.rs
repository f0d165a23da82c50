//! Seeded synthetic isotherms.
//!
//! Loadings follow the finite-layer BET isotherm, which rises like a BET curve at
//! low pressure and levels off at `layers * qm`, with multiplicative Gaussian
//! noise. Pressures are log-spaced so the low-pressure region is well sampled.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_P_SAT, IsothermPoint};
use crate::error::BetError;
use crate::models::bet_loading_layers;

/// Parameters of a synthetic isotherm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSpec {
    /// Monolayer loading (mol/kg).
    pub qm: f64,
    pub c: f64,
    /// Number of adsorbed layers at saturation.
    pub layers: f64,
    pub points: usize,
    pub p_rel_min: f64,
    pub p_rel_max: f64,
    /// Relative standard deviation of the loading noise.
    pub noise: f64,
    pub p_sat: f64,
    pub seed: u64,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            qm: 10.0,
            c: 100.0,
            layers: 4.0,
            points: 40,
            p_rel_min: 1e-4,
            p_rel_max: 0.9,
            noise: 0.002,
            p_sat: DEFAULT_P_SAT,
            seed: 7,
        }
    }
}

/// Generate an isotherm sorted by pressure.
pub fn generate_isotherm(spec: &SynthSpec) -> Result<Vec<IsothermPoint>, BetError> {
    if spec.points < 2 {
        return Err(BetError::InvalidConfig("synthetic isotherm needs at least 2 points.".to_string()));
    }
    if !(spec.p_rel_min > 0.0 && spec.p_rel_min < spec.p_rel_max && spec.p_rel_max < 1.0) {
        return Err(BetError::InvalidConfig(format!(
            "synthetic relative pressures must satisfy 0 < min < max < 1 (got {} and {}).",
            spec.p_rel_min, spec.p_rel_max
        )));
    }
    for (name, value) in [("qm", spec.qm), ("c", spec.c), ("layers", spec.layers), ("p_sat", spec.p_sat)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(BetError::InvalidConfig(format!(
                "synthetic {name} must be finite and > 0 (got {value})."
            )));
        }
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise)
        .map_err(|e| BetError::InvalidConfig(format!("Noise distribution error: {e}")))?;

    let log_min = spec.p_rel_min.ln();
    let step = (spec.p_rel_max.ln() - log_min) / (spec.points - 1) as f64;

    let points = (0..spec.points)
        .map(|i| {
            let p_rel = (log_min + step * i as f64).exp();
            let clean = bet_loading_layers(p_rel, spec.qm, spec.c, spec.layers);
            let loading = (clean * (1.0 + normal.sample(&mut rng))).max(0.0);
            IsothermPoint::new(p_rel * spec.p_sat, loading)
        })
        .collect();

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_isotherm() {
        let spec = SynthSpec::default();
        assert_eq!(generate_isotherm(&spec).unwrap(), generate_isotherm(&spec).unwrap());

        let other = SynthSpec {
            seed: 8,
            ..SynthSpec::default()
        };
        assert_ne!(generate_isotherm(&spec).unwrap(), generate_isotherm(&other).unwrap());
    }

    #[test]
    fn pressures_are_log_spaced_within_range() {
        let spec = SynthSpec {
            noise: 0.0,
            ..SynthSpec::default()
        };
        let points = generate_isotherm(&spec).unwrap();
        assert_eq!(points.len(), spec.points);
        assert!((points[0].pressure - 1e-4 * 1e5).abs() < 1e-9);
        assert!((points.last().unwrap().pressure - 0.9 * 1e5).abs() < 1e-6);
        assert!(points.windows(2).all(|w| w[0].pressure < w[1].pressure));
        assert!(points.windows(2).all(|w| w[0].loading < w[1].loading));
    }

    #[test]
    fn rejects_bad_ranges() {
        let spec = SynthSpec {
            p_rel_max: 1.0,
            ..SynthSpec::default()
        };
        assert!(matches!(generate_isotherm(&spec), Err(BetError::InvalidConfig(_))));
    }
}
