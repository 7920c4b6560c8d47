//! Least squares solver.
//!
//! Two places need a small dense least-squares solve:
//!
//! ```text
//! minimize ‖A x − b‖²
//! ```
//!
//! - the quadratic model's initial guess (design rows `[1, x, x²]`)
//! - every Levenberg–Marquardt step, which solves the damped system
//!   `[J; √λ·D] δ = [−r; 0]`
//!
//! Implementation choices:
//! - SVD handles tall systems (more rows than columns) directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter counts are tiny (3–4 columns), so SVD cost is negligible next to
//!   model evaluation.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() != b.len() || a.ncols() == 0 {
        return None;
    }
    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails. Nearly
    // collinear columns show up when a model's curvature terms vanish on the
    // sampled x range.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let x = solve_least_squares(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let a = DMatrix::<f64>::zeros(3, 2);
        let b = DVector::<f64>::zeros(2);
        assert!(solve_least_squares(&a, &b).is_none());
    }
}
