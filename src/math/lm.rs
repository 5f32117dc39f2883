//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ (y_i - f(x_i; θ))²` for a scalar model `f` with a handful of
//! parameters. The Jacobian is taken by forward differences, and every damped
//! step goes through [`solve_damped_step`] (SVD on the stacked system).
//!
//! Damping follows Marquardt: the diagonal `D` tracks the largest column norm
//! of the Jacobian seen so far, `λ` shrinks ×10 after an accepted step and
//! grows ×10 after a rejected one.

use nalgebra::{DMatrix, DVector};

use crate::math::ols::solve_damped_step;

/// Relative tolerance used for both cost and step convergence.
pub const DEFAULT_TOL: f64 = 1.49012e-8;

const INITIAL_LAMBDA: f64 = 1e-3;
const MAX_LAMBDA: f64 = 1e16;
const MIN_LAMBDA: f64 = 1e-12;
const COST_FLOOR: f64 = 1e-24;

/// Solver limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    pub max_iters: usize,
    pub ftol: f64,
    pub xtol: f64,
}

impl LmOptions {
    /// Default budget for a `p`-parameter model: `200·(p+1)` iterations.
    pub fn for_params(p: usize) -> Self {
        Self {
            max_iters: 200 * (p + 1),
            ftol: DEFAULT_TOL,
            xtol: DEFAULT_TOL,
        }
    }
}

/// A converged solution.
#[derive(Debug, Clone, PartialEq)]
pub struct LmSolution {
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
}

/// Why the solver gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmError {
    /// The model is not finite at the starting point.
    NonFiniteStart,
    /// A Jacobian entry came out non-finite.
    NonFiniteJacobian,
    /// The iteration budget ran out before convergence.
    MaxIterations(usize),
    /// The solution contains non-finite parameters.
    NonFiniteResult,
}

impl std::fmt::Display for LmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LmError::NonFiniteStart => write!(f, "model is not finite at the starting point"),
            LmError::NonFiniteJacobian => write!(f, "non-finite Jacobian"),
            LmError::MaxIterations(n) => write!(f, "no convergence after {n} iterations"),
            LmError::NonFiniteResult => write!(f, "non-finite parameters"),
        }
    }
}

/// Fit `model` to `(x, y)` starting from `start`.
pub fn levenberg_marquardt<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    start: &[f64],
    opts: &LmOptions,
) -> Result<LmSolution, LmError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let p = start.len();
    let mut theta = start.to_vec();

    let mut r = residuals(&model, x, y, &theta).ok_or(LmError::NonFiniteStart)?;
    let mut cost = r.norm_squared();
    let mut lambda = INITIAL_LAMBDA;
    let mut scale = vec![0.0_f64; p];

    for iter in 0..opts.max_iters {
        if cost <= COST_FLOOR {
            return finish(theta, cost, iter);
        }

        let jac = jacobian(&model, x, &theta).ok_or(LmError::NonFiniteJacobian)?;
        for (j, d) in scale.iter_mut().enumerate() {
            let col_norm = jac.column(j).norm();
            *d = d.max(col_norm).max(f64::EPSILON);
        }

        // Inner loop: raise λ until a step lowers the cost.
        loop {
            if lambda > MAX_LAMBDA {
                // No descent direction left: θ is stationary.
                return finish(theta, cost, iter);
            }

            let Some(step) = solve_damped_step(&jac, &r, lambda, &scale) else {
                lambda *= 10.0;
                continue;
            };

            let candidate: Vec<f64> = theta.iter().zip(step.iter()).map(|(t, s)| t + s).collect();
            let Some(r_new) = residuals(&model, x, y, &candidate) else {
                lambda *= 10.0;
                continue;
            };
            let cost_new = r_new.norm_squared();
            if !(cost_new < cost) {
                lambda *= 10.0;
                continue;
            }

            let rel_reduction = (cost - cost_new) / cost;
            let theta_norm = theta.iter().map(|t| t * t).sum::<f64>().sqrt();
            let rel_step = step.norm() / (theta_norm + opts.xtol);

            theta = candidate;
            r = r_new;
            cost = cost_new;
            lambda = (lambda / 10.0).max(MIN_LAMBDA);

            if rel_reduction <= opts.ftol || rel_step <= opts.xtol {
                return finish(theta, cost, iter + 1);
            }
            break;
        }
    }

    Err(LmError::MaxIterations(opts.max_iters))
}

fn finish(params: Vec<f64>, sse: f64, iterations: usize) -> Result<LmSolution, LmError> {
    if !(params.iter().all(|v| v.is_finite()) && sse.is_finite()) {
        return Err(LmError::NonFiniteResult);
    }
    Ok(LmSolution {
        params,
        sse,
        iterations,
    })
}

/// Observed minus model. `None` if any residual is non-finite.
fn residuals<F>(model: &F, x: &[f64], y: &[f64], theta: &[f64]) -> Option<DVector<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let r = DVector::from_iterator(
        x.len(),
        x.iter().zip(y.iter()).map(|(&xi, &yi)| yi - model(xi, theta)),
    );
    r.iter().all(|v| v.is_finite()).then_some(r)
}

/// Forward-difference Jacobian of the model (not the residuals).
fn jacobian<F>(model: &F, x: &[f64], theta: &[f64]) -> Option<DMatrix<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = x.len();
    let p = theta.len();
    let base: Vec<f64> = x.iter().map(|&xi| model(xi, theta)).collect();

    let mut jac = DMatrix::<f64>::zeros(n, p);
    let mut shifted = theta.to_vec();
    for j in 0..p {
        let h = f64::EPSILON.sqrt() * theta[j].abs().max(1.0);
        shifted[j] = theta[j] + h;
        for i in 0..n {
            let d = (model(x[i], &shifted) - base[i]) / h;
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
        shifted[j] = theta[j];
    }
    Some(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_model(x: f64, t: &[f64]) -> f64 {
        t[0] * (-t[1] * x).exp() + t[2]
    }

    #[test]
    fn recovers_linear_parameters_exactly() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| -2.5 * v + 40.0).collect();
        let sol = levenberg_marquardt(|x, t| t[0] * x + t[1], &x, &y, &[1.0, 1.0], &LmOptions::for_params(2))
            .unwrap();
        assert!((sol.params[0] + 2.5).abs() < 1e-6);
        assert!((sol.params[1] - 40.0).abs() < 1e-6);
        assert!(sol.sse < 1e-10);
    }

    #[test]
    fn recovers_exponential_decay() {
        let truth = [60.0, 0.3, 8.0];
        let x: Vec<f64> = (1..=20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|&v| exp_model(v, &truth)).collect();
        let sol = levenberg_marquardt(exp_model, &x, &y, &[50.0, 0.5, 5.0], &LmOptions::for_params(3)).unwrap();
        for (got, want) in sol.params.iter().zip(truth.iter()) {
            assert!((got - want).abs() < 1e-4, "got {got}, want {want}");
        }
    }

    #[test]
    fn rejects_non_finite_start() {
        let x = [1.0, 2.0];
        let y = [1.0, 2.0];
        let err = levenberg_marquardt(|x, t| (t[0] - x).ln(), &x, &y, &[0.0], &LmOptions::for_params(1)).unwrap_err();
        assert_eq!(err, LmError::NonFiniteStart);
    }

    #[test]
    fn tiny_budget_reports_max_iterations() {
        let truth = [60.0, 0.3, 8.0];
        let x: Vec<f64> = (1..=20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|&v| exp_model(v, &truth)).collect();
        let opts = LmOptions {
            max_iters: 1,
            ftol: 0.0,
            xtol: 0.0,
        };
        let err = levenberg_marquardt(exp_model, &x, &y, &[1.0, 1.0, 1.0], &opts).unwrap_err();
        assert_eq!(err, LmError::MaxIterations(1));
    }
}
