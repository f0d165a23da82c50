//! Linear surface-area predictor on pressure-binned loadings.
//!
//! Features, in order:
//! - `c_i`: mean loading of the points with `lo <= pressure < hi` for each bin
//! - every product `c_i * c_j` with `i <= j`
//!
//! Each feature is min–max scaled with the ranges stored in the model, then the
//! score is `intercept + Σ coefficient_k * x_k`.

use serde::{Deserialize, Serialize};

use crate::domain::IsothermPoint;

/// Lowest non-zero bin edge (Pa).
pub const BIN_START: f64 = 5.0;
/// Highest bin edge (Pa).
pub const BIN_END: f64 = 1e5;
/// Number of log-spaced edges between [`BIN_START`] and [`BIN_END`].
pub const BIN_EDGES: usize = 7;

/// Half-open pressure interval `[lo, hi)` in Pa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureBin {
    pub lo: f64,
    pub hi: f64,
}

/// Log-spaced edges from `start` to `end` with a leading zero, rounded to whole
/// pascals, paired into consecutive bins.
pub fn pressure_bins(start: f64, end: f64, edges: usize) -> Vec<PressureBin> {
    let (log_start, log_end) = (start.log10(), end.log10());
    let mut points = vec![0.0];
    for i in 0..edges {
        let t = if edges > 1 {
            i as f64 / (edges - 1) as f64
        } else {
            0.0
        };
        points.push(10f64.powf(log_start + t * (log_end - log_start)).round());
    }
    points
        .windows(2)
        .map(|w| PressureBin { lo: w[0], hi: w[1] })
        .collect()
}

/// The bins the shipped model layout expects.
pub fn default_bins() -> Vec<PressureBin> {
    pressure_bins(BIN_START, BIN_END, BIN_EDGES)
}

/// Raw (unscaled) feature vector, or `None` if any bin holds no points.
pub fn bin_features(points: &[IsothermPoint], bins: &[PressureBin]) -> Option<Vec<f64>> {
    let mut means = Vec::with_capacity(bins.len());
    for bin in bins {
        let (sum, count) = points
            .iter()
            .filter(|p| p.pressure >= bin.lo && p.pressure < bin.hi)
            .fold((0.0, 0usize), |(s, c), p| (s + p.loading, c + 1));
        if count == 0 {
            return None;
        }
        means.push(sum / count as f64);
    }

    let mut features = means.clone();
    for i in 0..means.len() {
        for j in i..means.len() {
            features.push(means[i] * means[j]);
        }
    }
    Some(features)
}

/// Number of features produced for `bins` bins.
pub fn feature_count(bins: usize) -> usize {
    bins + bins * (bins + 1) / 2
}

/// Trained linear model over the binned features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub feature_min: Vec<f64>,
    pub feature_max: Vec<f64>,
}

impl AreaModel {
    /// Check that all vectors match the feature layout of `bins` bins.
    pub fn validate(&self, bins: usize) -> Result<(), String> {
        let expected = feature_count(bins);
        for (name, len) in [
            ("coefficients", self.coefficients.len()),
            ("feature_min", self.feature_min.len()),
            ("feature_max", self.feature_max.len()),
        ] {
            if len != expected {
                return Err(format!("{name} has {len} entries; expected {expected}."));
            }
        }
        Ok(())
    }

    /// Predicted surface area (m²/g), or `None` when a bin is empty.
    pub fn predict(&self, points: &[IsothermPoint]) -> Option<f64> {
        let features = bin_features(points, &default_bins())?;
        let score = features
            .iter()
            .zip(&self.coefficients)
            .zip(self.feature_min.iter().zip(&self.feature_max))
            .map(|((x, coef), (lo, hi))| coef * (x - lo) / (hi - lo))
            .sum::<f64>();
        let area = self.intercept + score;
        area.is_finite().then_some(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bins_match_layout() {
        let bins = default_bins();
        assert_eq!(bins.len(), 7);
        assert_eq!(bins[0], PressureBin { lo: 0.0, hi: 5.0 });
        assert_eq!(bins[1], PressureBin { lo: 5.0, hi: 26.0 });
        assert_eq!(bins[4].hi, 3684.0);
        assert_eq!(bins.last().unwrap().hi, 1e5);
        assert_eq!(feature_count(7), 35);
    }

    fn covering_points() -> Vec<IsothermPoint> {
        [1.0, 10.0, 50.0, 500.0, 2000.0, 10_000.0, 50_000.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| IsothermPoint::new(p, (i + 1) as f64))
            .collect()
    }

    #[test]
    fn features_are_bin_means_and_products() {
        let features = bin_features(&covering_points(), &default_bins()).unwrap();
        assert_eq!(features.len(), 35);
        assert_eq!(&features[..7], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        // c_0*c_0, c_0*c_1, ...
        assert_eq!(features[7], 1.0);
        assert_eq!(features[8], 2.0);
        assert_eq!(*features.last().unwrap(), 49.0);
    }

    #[test]
    fn empty_bin_means_no_prediction() {
        let mut points = covering_points();
        points.remove(3);
        assert!(bin_features(&points, &default_bins()).is_none());
    }

    #[test]
    fn prediction_is_scaled_linear_score() {
        let n = feature_count(7);
        let mut coefficients = vec![0.0; n];
        coefficients[0] = 100.0;
        let model = AreaModel {
            intercept: 50.0,
            coefficients,
            feature_min: vec![0.0; n],
            feature_max: vec![2.0; n],
        };
        assert!(model.validate(7).is_ok());
        let area = model.predict(&covering_points()).unwrap();
        assert!((area - (50.0 + 100.0 * 0.5)).abs() < 1e-12);

        let short = AreaModel {
            coefficients: vec![1.0],
            ..model
        };
        assert!(short.validate(7).is_err());
    }
}
