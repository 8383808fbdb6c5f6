//! Linear least squares via SVD.
//!
//! Every damped Levenberg–Marquardt step is a small linear problem
//!
//! ```text
//! minimize ‖ [J; √λ·D] δ − [r; 0] ‖²
//! ```
//!
//! with a tall matrix (observations + parameters rows, 3 columns). Nalgebra's
//! `QR::solve` only handles square systems, so we solve through the SVD, which
//! also copes with the near-collinear Jacobian columns the Omori model produces
//! when `c` and `p` trade off against each other.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if a strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
