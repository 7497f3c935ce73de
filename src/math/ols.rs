//! Least squares solver.
//!
//! ARIMA estimation repeatedly solves small regression problems of the form:
//!
//! ```text
//! minimize Σ (y_t - x_t^T β)^2
//! ```
//!
//! where `x_t` holds lagged observations and lagged residual estimates.
//!
//! Implementation choices:
//! - SVD solves the tall (more rows than columns) system robustly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (`p + q` plus an optional constant), so SVD
//!   cost is negligible next to building the design matrix.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    // Lagged regressors of a smooth load series are strongly collinear, so
    // progressively looser tolerances are tried before giving up.
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix from row-major regressor rows and solve it.
///
/// Returns `None` for an empty or ragged system.
pub fn regress(rows: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let n = rows.len();
    let k = rows.first()?.len();
    if n == 0 || k == 0 || n != y.len() || rows.iter().any(|r| r.len() != k) {
        return None;
    }
    let x = DMatrix::from_fn(n, k, |i, j| rows[i][j]);
    let y = DVector::from_column_slice(y);
    solve_least_squares(&x, &y).map(|beta| beta.iter().copied().collect())
}
