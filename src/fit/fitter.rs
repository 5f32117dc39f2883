//! Nonlinear least squares fitting for a single family.
//!
//! Given observed `(x_i, y_i)` retention points, each family is fitted by
//! Levenberg–Marquardt:
//!
//! - from the all-ones start
//! - from every start of the family's grid (parallel)
//!
//! and the converged start with the lowest SSE wins (ties → the all-ones
//! start, then the lowest grid index).
//!
//! A failed family is not an error for the caller: [`fit_families`] drops it
//! from candidacy and records why.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{FamilyKind, RetentionData};
use crate::fit::start_grid::{default_start, start_grid};
use crate::math::{LmError, LmOptions, levenberg_marquardt};
use crate::models::predict;

/// Why a single family could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub enum FitFailure {
    /// No start converged; carries the error from the all-ones start.
    NoConvergence(LmError),
    /// The start grid could not be built.
    BadGrid(String),
}

impl std::fmt::Display for FitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitFailure::NoConvergence(e) => write!(f, "did not converge ({e})"),
            FitFailure::BadGrid(e) => write!(f, "start grid error ({e})"),
        }
    }
}

/// Best fit for a single family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyFit {
    pub kind: FamilyKind,
    pub params: Vec<f64>,
    /// Residual sum of squares over the raw observations.
    pub sse: f64,
    pub iterations: usize,
    /// `None` for the all-ones start, else the grid index that won.
    pub start_index: Option<usize>,
}

/// Outcome of fitting every family.
#[derive(Debug, Clone, Default)]
pub struct FamilyFits {
    /// Successful fits in registry order.
    pub fits: Vec<FamilyFit>,
    /// Families dropped from candidacy and why.
    pub skipped: Vec<(FamilyKind, FitFailure)>,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: Vec<f64>,
    sse: f64,
    iterations: usize,
}

/// Fit one family to the observations.
pub fn fit_family(kind: FamilyKind, x: &[f64], y: &[f64]) -> Result<FamilyFit, FitFailure> {
    let opts = LmOptions::for_params(kind.param_len());
    let model = |xi: f64, theta: &[f64]| predict(kind, xi, theta);

    let default = levenberg_marquardt(model, x, y, &default_start(kind), &opts);
    if let Err(e) = &default {
        debug!(family = kind.name(), error = %e, "default start failed");
    }

    let y_scale = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let grid = start_grid(kind, y_scale).map_err(|e| FitFailure::BadGrid(e.to_string()))?;

    // Index 0 is the default start; grid start `i` is index `i + 1`.
    let mut candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(i, start)| {
            levenberg_marquardt(model, x, y, start, &opts)
                .ok()
                .map(|sol| Candidate {
                    idx: i + 1,
                    params: sol.params,
                    sse: sol.sse,
                    iterations: sol.iterations,
                })
        })
        .collect();

    let first_err = match default {
        Ok(sol) => {
            candidates.push(Candidate {
                idx: 0,
                params: sol.params,
                sse: sol.sse,
                iterations: sol.iterations,
            });
            None
        }
        Err(e) => Some(e),
    };

    // Deterministic selection: pick the minimum SSE; break ties by start index.
    let best = candidates
        .into_iter()
        .reduce(|best, c| {
            if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
                c
            } else {
                best
            }
        })
        .ok_or(FitFailure::NoConvergence(
            first_err.unwrap_or(LmError::NonFiniteResult),
        ))?;

    Ok(FamilyFit {
        kind,
        params: best.params,
        sse: best.sse,
        iterations: best.iterations,
        start_index: best.idx.checked_sub(1),
    })
}

/// Fit every parametric family (in parallel) against the raw observations.
pub fn fit_families(data: &RetentionData) -> FamilyFits {
    let results: Vec<(FamilyKind, Result<FamilyFit, FitFailure>)> = FamilyKind::ALL
        .par_iter()
        .map(|&kind| (kind, fit_family(kind, data.x(), data.y())))
        .collect();

    let mut out = FamilyFits::default();
    for (kind, result) in results {
        match result {
            Ok(fit) => {
                debug!(family = kind.name(), sse = fit.sse, iterations = fit.iterations, "family fitted");
                out.fits.push(fit);
            }
            Err(failure) => {
                warn!(family = kind.name(), reason = %failure, "unable to fit retention curve; dropping family");
                out.skipped.push((kind, failure));
            }
        }
    }
    out
}
