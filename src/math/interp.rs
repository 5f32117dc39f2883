//! Piecewise-linear interpolation over collapsed retention points.
//!
//! Two evaluators share the same knots:
//!
//! - [`LinearInterpolant`] answers only inside `[x_first, x_last]`
//! - [`LinearSpline`] is the degree-1 spline through the knots; outside the
//!   knot range it extends the first/last segment

use serde::{Deserialize, Serialize};

/// Sorted knots with strictly increasing `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knots {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Knots {
    /// Build knots from already-sorted, de-duplicated points.
    ///
    /// Returns `None` unless there are at least two points with strictly
    /// increasing, finite `x`.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        if x.len() < 2 || x.len() != y.len() {
            return None;
        }
        if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
            return None;
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        Some(Self { x, y })
    }

    pub fn first_x(&self) -> f64 {
        self.x[0]
    }

    pub fn last_x(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.first_x() && t <= self.last_x()
    }

    /// Index of the segment `[x_i, x_{i+1}]` used for `t` (clamped to the ends).
    fn segment(&self, t: f64) -> usize {
        let last = self.x.len() - 2;
        match self.x.partition_point(|&k| k <= t) {
            0 => 0,
            i => (i - 1).min(last),
        }
    }

    fn eval_segment(&self, i: usize, t: f64) -> f64 {
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let u = (t - x0) / (x1 - x0);
        y0 + u * (y1 - y0)
    }
}

/// Interior-only linear interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearInterpolant {
    knots: Knots,
}

impl LinearInterpolant {
    pub fn new(knots: Knots) -> Self {
        Self { knots }
    }

    /// `None` outside the knot range.
    pub fn eval(&self, t: f64) -> Option<f64> {
        if !self.knots.contains(t) {
            return None;
        }
        Some(self.knots.eval_segment(self.knots.segment(t), t))
    }
}

/// Degree-1 spline: linear interpolation that also extrapolates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSpline {
    knots: Knots,
}

impl LinearSpline {
    pub fn new(knots: Knots) -> Self {
        Self { knots }
    }

    pub fn eval(&self, t: f64) -> f64 {
        self.knots.eval_segment(self.knots.segment(t), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knots() -> Knots {
        Knots::new(vec![1.0, 2.0, 4.0], vec![40.0, 30.0, 20.0]).unwrap()
    }

    #[test]
    fn knots_require_two_increasing_points() {
        assert!(Knots::new(vec![1.0], vec![40.0]).is_none());
        assert!(Knots::new(vec![2.0, 1.0], vec![40.0, 30.0]).is_none());
        assert!(Knots::new(vec![1.0, 1.0], vec![40.0, 30.0]).is_none());
    }

    #[test]
    fn interpolant_hits_knots_and_midpoints() {
        let f = LinearInterpolant::new(knots());
        assert_eq!(f.eval(1.0), Some(40.0));
        assert_eq!(f.eval(4.0), Some(20.0));
        assert_eq!(f.eval(3.0), Some(25.0));
        assert_eq!(f.eval(1.5), Some(35.0));
    }

    #[test]
    fn interpolant_never_extrapolates() {
        let f = LinearInterpolant::new(knots());
        assert_eq!(f.eval(0.5), None);
        assert_eq!(f.eval(4.5), None);
    }

    #[test]
    fn spline_matches_interior_and_extends_end_segments() {
        let f = LinearInterpolant::new(knots());
        let s = LinearSpline::new(knots());
        for t in [1.0, 1.5, 2.0, 3.0, 4.0] {
            assert_eq!(f.eval(t), Some(s.eval(t)));
        }
        // Last segment slope: -5 per day.
        assert!((s.eval(6.0) - 10.0).abs() < 1e-12);
        // First segment slope: -10 per day.
        assert!((s.eval(0.0) - 50.0).abs() < 1e-12);
    }
}
