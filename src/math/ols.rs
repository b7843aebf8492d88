//! Small linear least squares solves.
//!
//! The curve fitter repeatedly solves the damped normal equations of a
//! Levenberg–Marquardt step:
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! The system is 3×3 but can be close to singular (e.g. when both mixture
//! scales coincide, the weight column of `J` vanishes), so we solve through SVD
//! with progressively looser tolerances instead of a plain LU/Cholesky.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
