//! Isotherm preparation.
//!
//! Turns raw `(pressure, loading)` pairs into the analysis table:
//! - sorted ascending by relative pressure
//! - derived columns `p_rel`, `bet_y`, `bet_y2`, `phi`
//! - the two reference extrema that bound the later region search
//!
//! A leading zero-pressure row is kept but moved to half the pressure of the next
//! row, since `p_rel = 0` would make `bet_y` and `phi` degenerate.

use log::warn;

use crate::domain::{
    Adsorbate, ExtremumKind, IsothermPoint, ManualExtrema, PreparedRow, ReferenceExtrema,
};
use crate::error::BetError;
use crate::fit::extremum::find_extremum;
use crate::models::{bet_y, bet_y2, excess_sorption_work};

/// Analysis-ready isotherm.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedIsotherm {
    pub rows: Vec<PreparedRow>,
    pub extrema: ReferenceExtrema,
}

impl PreparedIsotherm {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Prepare an isotherm and locate its reference extrema.
///
/// `window` is the extremum half-width; at least `2 * window + 1` points are
/// required. Extrema present in `manual` are taken as given.
pub fn prepare(
    points: &[IsothermPoint],
    adsorbate: &Adsorbate,
    window: usize,
    manual: ManualExtrema,
) -> Result<PreparedIsotherm, BetError> {
    let required = 2 * window + 1;
    if points.len() < required {
        return Err(BetError::InsufficientData {
            points: points.len(),
            required,
        });
    }

    let rows = prepare_rows(points, adsorbate.p_sat(), adsorbate.temperature())?;
    let extrema = reference_extrema(&rows, window, manual)?;

    Ok(PreparedIsotherm { rows, extrema })
}

/// Sort, clean and derive the per-row columns.
pub fn prepare_rows(
    points: &[IsothermPoint],
    p_sat: f64,
    temperature: f64,
) -> Result<Vec<PreparedRow>, BetError> {
    let mut sorted = points.to_vec();
    // Loading breaks pressure ties so any input permutation yields the same table.
    sorted.sort_by(|a, b| {
        a.pressure
            .total_cmp(&b.pressure)
            .then(a.loading.total_cmp(&b.loading))
    });

    if sorted.len() >= 2 && sorted[0].pressure == 0.0 {
        let replacement = sorted[1].pressure / 2.0;
        warn!("First point has zero pressure; using {replacement} Pa (half of the next point).");
        sorted[0].pressure = replacement;
    }

    sorted
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let p_rel = point.pressure / p_sat;
            if !(p_rel.is_finite() && p_rel > 0.0 && p_rel < 1.0) {
                return Err(BetError::InvalidPoint {
                    index,
                    reason: format!(
                        "relative pressure {p_rel} (pressure {} Pa) is outside (0, 1).",
                        point.pressure
                    ),
                });
            }
            if !(point.loading.is_finite() && point.loading >= 0.0) {
                return Err(BetError::InvalidPoint {
                    index,
                    reason: format!("loading {} must be finite and >= 0.", point.loading),
                });
            }
            Ok(PreparedRow {
                pressure: point.pressure,
                loading: point.loading,
                p_rel,
                bet_y: bet_y(p_rel, point.loading),
                bet_y2: bet_y2(p_rel, point.loading),
                phi: excess_sorption_work(p_rel, point.loading, temperature),
            })
        })
        .collect()
}

/// Resolve both reference extrema, honouring manual overrides.
pub fn reference_extrema(
    rows: &[PreparedRow],
    window: usize,
    manual: ManualExtrema,
) -> Result<ReferenceExtrema, BetError> {
    let len = rows.len();
    for (name, value) in [
        ("con1_limit", manual.con1_limit),
        ("esw_minimum", manual.esw_minimum),
    ] {
        if let Some(index) = value {
            if index >= len {
                return Err(BetError::InvalidOverride { name, index, len });
            }
        }
    }

    let con1_limit = match manual.con1_limit {
        Some(index) => Some(index),
        None => find_extremum(rows, |r| r.bet_y2, ExtremumKind::Maximum, 0, window),
    };
    let esw_minimum = match manual.esw_minimum {
        Some(index) => Some(index),
        None => find_extremum(rows, |r| r.phi, ExtremumKind::Minimum, 0, window),
    };

    Ok(ReferenceExtrema {
        con1_limit,
        esw_minimum,
    })
}

/// Index of the first global maximum of `bet_y2`.
pub fn global_bet_y2_max(rows: &[PreparedRow]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, row) in rows.iter().enumerate() {
        match best {
            Some(b) if rows[b].bet_y2 >= row.bet_y2 => {}
            _ if row.bet_y2.is_nan() => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<IsothermPoint> {
        (0..n)
            .map(|i| IsothermPoint::new(1000.0 * (i + 1) as f64, 0.5 * (i + 1) as f64))
            .collect()
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let err = prepare(&ramp(6), &Adsorbate::Argon, 3, ManualExtrema::default()).unwrap_err();
        assert_eq!(
            err,
            BetError::InsufficientData {
                points: 6,
                required: 7
            }
        );
    }

    #[test]
    fn rows_are_sorted_and_derived() {
        let mut points = ramp(8);
        points.reverse();
        let rows = prepare_rows(&points, 1e5, 87.0).unwrap();
        assert!(rows.windows(2).all(|w| w[0].p_rel < w[1].p_rel));

        let r = rows[2];
        assert!((r.p_rel - 0.03).abs() < 1e-15);
        assert!((r.bet_y - 0.03 / (1.5 * 0.97)).abs() < 1e-12);
        assert!((r.bet_y2 - 1.5 * 0.97).abs() < 1e-12);
        assert!((r.phi - 1.5 / 1000.0 * 8.314 * 87.0 * 0.03f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn leading_zero_pressure_is_halved_from_next_point() {
        let mut points = ramp(8);
        points[0].pressure = 0.0;
        let rows = prepare_rows(&points, 1e5, 87.0).unwrap();
        assert_eq!(rows[0].pressure, 1000.0);
        assert_eq!(rows.len(), 8);
        assert!(rows[0].phi.is_finite());
    }

    #[test]
    fn pressure_at_or_above_saturation_is_rejected() {
        let mut points = ramp(8);
        points[7].pressure = 1e5;
        let err = prepare_rows(&points, 1e5, 87.0).unwrap_err();
        assert!(matches!(err, BetError::InvalidPoint { index: 7, .. }));
    }

    #[test]
    fn manual_extrema_skip_the_search() {
        let manual = ManualExtrema {
            con1_limit: Some(5),
            esw_minimum: Some(2),
        };
        let prepared = prepare(&ramp(9), &Adsorbate::Argon, 3, manual).unwrap();
        assert_eq!(prepared.extrema.con1_limit, Some(5));
        assert_eq!(prepared.extrema.esw_minimum, Some(2));

        let manual = ManualExtrema {
            con1_limit: Some(9),
            esw_minimum: None,
        };
        let err = prepare(&ramp(9), &Adsorbate::Argon, 3, manual).unwrap_err();
        assert!(matches!(err, BetError::InvalidOverride { name: "con1_limit", .. }));
    }

    #[test]
    fn global_maximum_takes_first_of_ties() {
        let rows: Vec<PreparedRow> = [1.0, 3.0, 2.0, 3.0]
            .iter()
            .map(|&bet_y2| PreparedRow {
                pressure: 1.0,
                loading: 1.0,
                p_rel: 0.1,
                bet_y: 0.0,
                bet_y2,
                phi: 0.0,
            })
            .collect();
        assert_eq!(global_bet_y2_max(&rows), Some(1));
        assert_eq!(global_bet_y2_max(&[]), None);
    }
}
