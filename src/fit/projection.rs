//! Day-indexed retention projection.
//!
//! A projection covers offsets `1..=horizon`; day 0 is always 100% and is not
//! stored. Bulk evaluation can hit domain errors at individual offsets, so the
//! generator repairs them:
//!
//! 1. evaluate the curve over `[1, horizon + 1)`
//! 2. drop every non-finite value
//! 3. re-evaluate each dropped offset over its own one-point range and append
//!    the results, in their original order
//! 4. clamp everything at 0

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Curve;

/// Retention at day 0, in percent.
pub const DAY_ZERO_RETENTION: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    offsets: Vec<u32>,
    values: Vec<f64>,
}

impl Projection {
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// `values()[k]` is the retention at offset `k + 1`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest offset covered (0 for an empty projection).
    pub fn max_offset(&self) -> u32 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Retention (percent) `day` days after acquisition.
    ///
    /// Day 0 is 100; days past [`Projection::max_offset`] are `None`.
    pub fn retention_at(&self, day: u32) -> Option<f64> {
        if day == 0 {
            return Some(DAY_ZERO_RETENTION);
        }
        self.values.get(day as usize - 1).copied()
    }

    /// `(offset, retention)` pairs, day 0 first.
    pub fn with_day_zero(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        std::iter::once((0, DAY_ZERO_RETENTION)).chain(self.offsets.iter().copied().zip(self.values.iter().copied()))
    }
}

/// Evaluate `curve` over offsets `1..=horizon` and repair non-finite values.
pub fn generate_projection(curve: &Curve, horizon: u32) -> Projection {
    let bulk = curve.eval_range(1, horizon.saturating_add(1));

    let mut values = Vec::with_capacity(bulk.len());
    let mut dropped = Vec::new();
    for (offset, v) in (1..).zip(bulk) {
        if v.is_finite() {
            values.push(v);
        } else {
            dropped.push(offset);
        }
    }

    for offset in dropped {
        let repaired = curve
            .eval_range(offset, offset + 1)
            .first()
            .copied()
            .unwrap_or(f64::NAN);
        if repaired.is_finite() {
            values.push(repaired);
        } else {
            warn!(curve = curve.name(), offset, "retention is not finite at offset; using 0");
            values.push(0.0);
        }
    }

    for v in &mut values {
        *v = v.max(0.0);
    }

    Projection {
        offsets: (1..=horizon).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FamilyKind;
    use proptest::prelude::*;

    #[test]
    fn covers_every_offset_and_day_zero() {
        let curve = Curve::Linear { a: -5.0, b: 45.0 };
        let p = generate_projection(&curve, 10);
        assert_eq!(p.offsets(), (1..=10).collect::<Vec<_>>().as_slice());
        assert_eq!(p.retention_at(0), Some(100.0));
        assert_eq!(p.retention_at(1), Some(40.0));
        assert_eq!(p.retention_at(10), Some(0.0));
        assert_eq!(p.retention_at(11), None);
        assert_eq!(p.max_offset(), 10);
    }

    #[test]
    fn negative_values_are_clamped() {
        let curve = Curve::Linear { a: -10.0, b: 25.0 };
        let p = generate_projection(&curve, 5);
        assert_eq!(p.values(), &[15.0, 5.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn non_finite_values_move_to_the_end_as_zero() {
        // log2(x - 2.5) is undefined for x < 2.5.
        let curve = Curve::Log {
            a: -10.0,
            b: -2.5,
            c: 0.0,
        };
        let p = generate_projection(&curve, 4);
        assert_eq!(p.len(), 4);
        // Offsets 3 and 4 shift to the front; offset 3 is negative and clamped.
        assert_eq!(p.values()[0], 0.0);
        assert!((p.values()[1] - 10.0 * 1.5f64.log2()).abs() < 1e-12);
        assert_eq!(&p.values()[2..], &[0.0, 0.0]);
    }

    #[test]
    fn empty_horizon_is_empty_projection() {
        let p = generate_projection(&Curve::Power { a: 40.0, b: 0.5 }, 0);
        assert!(p.is_empty());
        assert_eq!(p.max_offset(), 0);
        assert_eq!(p.with_day_zero().collect::<Vec<_>>(), vec![(0, 100.0)]);
    }

    proptest! {
        #[test]
        fn projections_are_finite_and_non_negative(
            family in 0usize..6,
            p0 in -50.0f64..50.0,
            p1 in -5.0f64..5.0,
            p2 in -50.0f64..50.0,
            horizon in 0u32..60,
        ) {
            let kind = FamilyKind::ALL[family];
            let all = [p0, p1, p2];
            let curve = Curve::from_params(kind, &all[..kind.param_len()]).unwrap();
            let p = generate_projection(&curve, horizon);
            prop_assert_eq!(p.len(), horizon as usize);
            prop_assert_eq!(p.retention_at(0), Some(100.0));
            prop_assert!(p.values().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }
}
