//! Ordinary least squares for straight lines.
//!
//! Every regression in this crate is a two-parameter line `y = a + b x`: the local
//! slopes of the extremum search and the BET fit of each candidate region. A region
//! search fits thousands of these, so the fit also returns the quantities the
//! inference code needs (residuals, leverages, unscaled covariance) in one pass.
//!
//! Implementation choices:
//! - Coefficients come from an SVD solve of the design matrix, which stays
//!   well-behaved for the tightly clustered relative pressures of low-pressure data.
//! - `(XᵀX)⁻¹` is formed explicitly; it is 2×2.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Result of fitting `y = intercept + slope * x`.
#[derive(Debug, Clone)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    pub n: usize,
    /// `y_i - ŷ_i`.
    pub residuals: Vec<f64>,
    /// Diagonal of the hat matrix.
    pub leverage: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Centered total sum of squares.
    pub sst: f64,
    /// `(XᵀX)⁻¹`, ordered `[intercept, slope]`.
    pub cov_unscaled: Matrix2<f64>,
}

impl LineFit {
    /// Residual degrees of freedom.
    pub fn df_resid(&self) -> usize {
        self.n.saturating_sub(2)
    }
}

/// Fit a line through `(x, y)`.
///
/// Returns `None` when fewer than two points are given, the lengths differ, or all
/// `x` values coincide (singular design).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(x_max - x_min > 0.0) {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(y);

    let xtx = design.transpose() * &design;
    let cov_unscaled = Matrix2::new(xtx[(0, 0)], xtx[(0, 1)], xtx[(1, 0)], xtx[(1, 1)])
        .try_inverse()?;

    let beta = solve_least_squares(&design, &target)?;
    let (intercept, slope) = (beta[0], beta[1]);

    let mean_y = y.iter().sum::<f64>() / n as f64;
    let mut residuals = Vec::with_capacity(n);
    let mut leverage = Vec::with_capacity(n);
    let mut ssr = 0.0;
    let mut sst = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let r = yi - (intercept + slope * xi);
        residuals.push(r);
        ssr += r * r;
        sst += (yi - mean_y) * (yi - mean_y);

        let row = Vector2::new(1.0, xi);
        leverage.push(row.dot(&(cov_unscaled * row)));
    }

    Some(LineFit {
        intercept,
        slope,
        n,
        residuals,
        leverage,
        ssr,
        sst,
        cov_unscaled,
    })
}
