//! Linear least squares kernels used by the curve solver.
//!
//! Every Levenberg–Marquardt iteration solves a small linear problem for the
//! parameter step `δ`:
//!
//! ```text
//! minimize ||J δ - r||² + λ ||D δ||²
//! ```
//!
//! which is the ordinary least squares problem on the stacked system
//! `[J; √λ·D] δ = [r; 0]`. Solving the stacked system directly (instead of the
//! normal equations `JᵀJ + λD²`) keeps the condition number at `cond(J)` rather
//! than `cond(J)²`.
//!
//! Implementation choices:
//! - SVD handles the tall (`n + p` rows, `p` columns) system even when `J` is
//!   rank deficient, e.g. a quadratic fitted to three collinear points.
//! - Parameter counts are 2–3, so the SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve one damped Gauss–Newton step.
///
/// `jacobian` is `n × p`, `residuals` has length `n` (observed minus model),
/// `scale` holds the Marquardt diagonal `D` (length `p`).
pub fn solve_damped_step(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    lambda: f64,
    scale: &[f64],
) -> Option<DVector<f64>> {
    let (n, p) = jacobian.shape();
    let mut a = DMatrix::<f64>::zeros(n + p, p);
    let mut b = DVector::<f64>::zeros(n + p);

    a.rows_mut(0, n).copy_from(jacobian);
    b.rows_mut(0, n).copy_from(residuals);

    let sqrt_lambda = lambda.max(0.0).sqrt();
    for j in 0..p {
        a[(n + j, j)] = sqrt_lambda * scale[j];
    }

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn zero_damping_matches_plain_least_squares() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let step = solve_damped_step(&j, &r, 0.0, &[1.0, 1.0]).unwrap();
        assert!((step[0] - 2.0).abs() < 1e-10);
        assert!((step[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn heavy_damping_shrinks_the_step() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let free = solve_damped_step(&j, &r, 0.0, &[1.0, 1.0]).unwrap();
        let damped = solve_damped_step(&j, &r, 1e6, &[1.0, 1.0]).unwrap();
        assert!(damped.norm() < free.norm() * 1e-3);
    }
}
