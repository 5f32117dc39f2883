//! Solver start grids.
//!
//! Besides the all-ones start, every family is also fitted from a deterministic
//! grid of starts built here. Axes are scaled by the largest observed retention
//! value so that level-like parameters start near the data.

use crate::domain::FamilyKind;
use crate::error::{ForecastError, ForecastResult};

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> ForecastResult<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(ForecastError::invalid_argument(format!(
            "invalid start range: min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(ForecastError::invalid_argument("start grid steps must be >= 2"));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// The default start: every parameter set to 1.
pub fn default_start(kind: FamilyKind) -> Vec<f64> {
    vec![1.0; kind.param_len()]
}

/// Fallback starts for `kind`, scaled by `y_scale` (the largest observed
/// retention value).
pub fn start_grid(kind: FamilyKind, y_scale: f64) -> ForecastResult<Vec<Vec<f64>>> {
    let y = if y_scale.is_finite() && y_scale > 0.0 { y_scale } else { 100.0 };

    let axes: Vec<Vec<f64>> = match kind {
        FamilyKind::Log => vec![
            log_space(y / 10.0, y, 3)?,
            log_space(0.1, 10.0, 3)?,
            vec![y, 2.0 * y],
        ],
        FamilyKind::Exp => vec![
            log_space(y / 2.0, 2.0 * y, 3)?,
            log_space(0.01, 1.0, 3)?,
            vec![0.0, y / 10.0],
        ],
        FamilyKind::Linear => vec![negated(log_space(0.1, y, 3)?), vec![y, 2.0 * y]],
        FamilyKind::Quad => vec![
            log_space(0.01, 1.0, 3)?,
            negated(log_space(1.0, 10.0, 2)?),
            vec![y, 2.0 * y],
        ],
        FamilyKind::Weibull => vec![vec![0.5, 0.9, 1.5], log_space(0.1, 100.0, 4)?],
        FamilyKind::Power => vec![log_space(y / 2.0, 2.0 * y, 3)?, log_space(0.1, 1.0, 3)?],
    };

    Ok(cartesian(&axes))
}

fn negated(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().map(|v| -v).collect()
}

/// Cartesian product of the per-parameter axes, first axis varying slowest.
fn cartesian(axes: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(out.len() * axis.len());
        for prefix in &out {
            for &v in axis {
                let mut row = prefix.clone();
                row.push(v);
                next.push(row);
            }
        }
        out = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(0.1, 10.0, 5).unwrap();
        assert!((v[0] - 0.1).abs() < 1e-12);
        assert!((v[v.len() - 1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn log_space_rejects_bad_ranges() {
        assert!(log_space(0.0, 1.0, 3).is_err());
        assert!(log_space(2.0, 1.0, 3).is_err());
        assert!(log_space(1.0, 2.0, 1).is_err());
    }

    #[test]
    fn grids_match_family_arity() {
        for kind in FamilyKind::ALL {
            let grid = start_grid(kind, 40.0).unwrap();
            assert!(!grid.is_empty());
            assert!(grid.iter().all(|start| start.len() == kind.param_len()));
            assert_eq!(default_start(kind).len(), kind.param_len());
        }
    }

    #[test]
    fn cartesian_orders_first_axis_slowest() {
        let grid = cartesian(&[vec![1.0, 2.0], vec![10.0, 20.0]]);
        assert_eq!(
            grid,
            vec![vec![1.0, 10.0], vec![1.0, 20.0], vec![2.0, 10.0], vec![2.0, 20.0]]
        );
    }
}
