//! Curve evaluation for the retention families.
//!
//! The fitter relies on two primitive operations:
//! - evaluate a family from a raw parameter slice (inside the solver loop)
//! - evaluate a fitted [`Curve`] (for scoring and projections)
//!
//! Evaluation never fails: domain errors (log of a non-positive argument, a
//! negative base to a fractional power, overflow) come back as NaN/±inf and
//! are repaired by the projection step.

use serde::{Deserialize, Serialize};

use crate::domain::{CollapsedPoints, FamilyKind};
use crate::math::{Knots, LinearInterpolant, LinearSpline};

pub fn log_curve(x: f64, a: f64, b: f64, c: f64) -> f64 {
    -a * (b + x).log2() + c
}

pub fn exp_curve(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * (-b * x).exp() + c
}

pub fn linear_curve(x: f64, a: f64, b: f64) -> f64 {
    a * x + b
}

pub fn quad_curve(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * x * x + b * x + c
}

pub fn weibull_curve(x: f64, k: f64, l: f64) -> f64 {
    let u = x / l;
    (k / l) * u.powf(k - 1.0) * (-u.powf(k)).exp()
}

pub fn power_curve(x: f64, a: f64, b: f64) -> f64 {
    a * x.powf(-b)
}

/// Evaluate `kind` at `x` with a raw parameter slice.
///
/// # Panics
/// Panics if `params` is shorter than `kind.param_len()`.
pub fn predict(kind: FamilyKind, x: f64, params: &[f64]) -> f64 {
    match kind {
        FamilyKind::Log => log_curve(x, params[0], params[1], params[2]),
        FamilyKind::Exp => exp_curve(x, params[0], params[1], params[2]),
        FamilyKind::Linear => linear_curve(x, params[0], params[1]),
        FamilyKind::Quad => quad_curve(x, params[0], params[1], params[2]),
        FamilyKind::Weibull => weibull_curve(x, params[0], params[1]),
        FamilyKind::Power => power_curve(x, params[0], params[1]),
    }
}

/// Piecewise-linear curve through the collapsed points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    linear: LinearInterpolant,
    spline: LinearSpline,
}

impl Interpolation {
    /// `None` if there are fewer than two distinct days.
    pub fn from_collapsed(points: &CollapsedPoints) -> Option<Self> {
        let knots = Knots::new(points.x.clone(), points.y.clone())?;
        Some(Self {
            linear: LinearInterpolant::new(knots.clone()),
            spline: LinearSpline::new(knots),
        })
    }

    /// Linear interpolant inside the observed range, spline outside it.
    pub fn eval(&self, x: f64) -> f64 {
        self.linear.eval(x).unwrap_or_else(|| self.spline.eval(x))
    }
}

/// A fitted retention curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum Curve {
    Log { a: f64, b: f64, c: f64 },
    Exp { a: f64, b: f64, c: f64 },
    Linear { a: f64, b: f64 },
    Quad { a: f64, b: f64, c: f64 },
    Weibull { k: f64, l: f64 },
    Power { a: f64, b: f64 },
    Interpolate(Interpolation),
}

impl Curve {
    /// Wrap fitted coefficients for `kind`. `None` on an arity mismatch.
    pub fn from_params(kind: FamilyKind, params: &[f64]) -> Option<Self> {
        if params.len() != kind.param_len() {
            return None;
        }
        let curve = match kind {
            FamilyKind::Log => Curve::Log {
                a: params[0],
                b: params[1],
                c: params[2],
            },
            FamilyKind::Exp => Curve::Exp {
                a: params[0],
                b: params[1],
                c: params[2],
            },
            FamilyKind::Linear => Curve::Linear {
                a: params[0],
                b: params[1],
            },
            FamilyKind::Quad => Curve::Quad {
                a: params[0],
                b: params[1],
                c: params[2],
            },
            FamilyKind::Weibull => Curve::Weibull {
                k: params[0],
                l: params[1],
            },
            FamilyKind::Power => Curve::Power {
                a: params[0],
                b: params[1],
            },
        };
        Some(curve)
    }

    /// Parametric family, or `None` for interpolation.
    pub fn family(&self) -> Option<FamilyKind> {
        match self {
            Curve::Log { .. } => Some(FamilyKind::Log),
            Curve::Exp { .. } => Some(FamilyKind::Exp),
            Curve::Linear { .. } => Some(FamilyKind::Linear),
            Curve::Quad { .. } => Some(FamilyKind::Quad),
            Curve::Weibull { .. } => Some(FamilyKind::Weibull),
            Curve::Power { .. } => Some(FamilyKind::Power),
            Curve::Interpolate(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.family().map_or("interpolate", FamilyKind::name)
    }

    pub fn params(&self) -> Vec<f64> {
        match *self {
            Curve::Log { a, b, c } | Curve::Exp { a, b, c } | Curve::Quad { a, b, c } => {
                vec![a, b, c]
            }
            Curve::Linear { a, b } | Curve::Power { a, b } => vec![a, b],
            Curve::Weibull { k, l } => vec![k, l],
            Curve::Interpolate(_) => Vec::new(),
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Curve::Log { a, b, c } => log_curve(x, *a, *b, *c),
            Curve::Exp { a, b, c } => exp_curve(x, *a, *b, *c),
            Curve::Linear { a, b } => linear_curve(x, *a, *b),
            Curve::Quad { a, b, c } => quad_curve(x, *a, *b, *c),
            Curve::Weibull { k, l } => weibull_curve(x, *k, *l),
            Curve::Power { a, b } => power_curve(x, *a, *b),
            Curve::Interpolate(interp) => interp.eval(x),
        }
    }

    /// Evaluate at every integer offset in `[start, stop)`.
    pub fn eval_range(&self, start: u32, stop: u32) -> Vec<f64> {
        (start..stop).map(|d| self.eval(f64::from(d))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FamilyKind::Log, vec![10.0, 0.0, 50.0], 4.0, 30.0)]
    #[case(FamilyKind::Exp, vec![50.0, 0.0, 10.0], 3.0, 60.0)]
    #[case(FamilyKind::Linear, vec![-2.0, 40.0], 5.0, 30.0)]
    #[case(FamilyKind::Quad, vec![1.0, -10.0, 40.0], 2.0, 24.0)]
    #[case(FamilyKind::Power, vec![40.0, 1.0], 4.0, 10.0)]
    #[case(FamilyKind::Weibull, vec![1.0, 2.0], 0.0, 0.5)]
    fn predict_matches_closed_form(
        #[case] kind: FamilyKind,
        #[case] params: Vec<f64>,
        #[case] x: f64,
        #[case] expected: f64,
    ) {
        assert!((predict(kind, x, &params) - expected).abs() < 1e-12);
        let curve = Curve::from_params(kind, &params).unwrap();
        assert_eq!(curve.family(), Some(kind));
        assert_eq!(curve.params(), params);
        assert!((curve.eval(x) - expected).abs() < 1e-12);
    }

    #[test]
    fn domain_errors_become_non_finite_values() {
        // log2 of a negative argument.
        assert!(predict(FamilyKind::Log, 1.0, &[1.0, -5.0, 0.0]).is_nan());
        // power undefined at zero.
        assert!(predict(FamilyKind::Power, 0.0, &[1.0, 1.0]).is_infinite());
        // negative base to a fractional power.
        assert!(predict(FamilyKind::Weibull, 1.0, &[1.5, -2.0]).is_nan());
    }

    #[test]
    fn from_params_rejects_wrong_arity() {
        assert!(Curve::from_params(FamilyKind::Exp, &[1.0, 2.0]).is_none());
    }

    #[test]
    fn interpolation_uses_spline_outside_observed_range() {
        let points = CollapsedPoints {
            x: vec![2.0, 4.0],
            y: vec![30.0, 20.0],
        };
        let curve = Curve::Interpolate(Interpolation::from_collapsed(&points).unwrap());
        assert_eq!(curve.eval(3.0), 25.0);
        assert_eq!(curve.eval(6.0), 10.0);
        assert_eq!(curve.eval(1.0), 35.0);
        assert_eq!(curve.name(), "interpolate");
        assert!(curve.params().is_empty());
    }

    #[test]
    fn eval_range_is_half_open() {
        let curve = Curve::Linear { a: -1.0, b: 10.0 };
        assert_eq!(curve.eval_range(1, 4), vec![9.0, 8.0, 7.0]);
        assert_eq!(curve.eval_range(3, 4), vec![7.0]);
    }
}
