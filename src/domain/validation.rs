//! Input contracts enforced before any fitting attempt.
//!
//! Both checks are pure predicates: they either return `Ok(())` or the first
//! violated contract as [`ForecastError::Validation`].

use crate::error::{ForecastError, ForecastResult};

/// Minimum number of observations a profile can be built from.
pub const MIN_POINTS: usize = 2;

/// Largest day a profile can observe or project to.
pub const MAX_PROFILE_DAYS: u32 = 10_000;

/// Check raw `(x, y)` retention observations.
pub fn validate_retention_data(x: &[f64], y: &[f64]) -> ForecastResult<()> {
    if x.len() != y.len() {
        return Err(ForecastError::validation(format!(
            "days and retention values have differing lengths ({} vs {})",
            x.len(),
            y.len()
        )));
    }

    if let Some((i, v)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ForecastError::validation(format!(
            "day #{} is not a number ({v})",
            i + 1
        )));
    }
    if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ForecastError::validation(format!(
            "retention value #{} is not a number ({v})",
            i + 1
        )));
    }
    if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| !(**v > 0.0 && **v <= 100.0)) {
        return Err(ForecastError::validation(format!(
            "retention value #{} must be more than 0 and at most 100 (got {v})",
            i + 1
        )));
    }
    if let Some((i, v)) = x.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(ForecastError::validation(format!(
            "day #{} must be more than 0 (got {v})",
            i + 1
        )));
    }

    if let Some((i, v)) = x.iter().enumerate().find(|(_, v)| **v > f64::from(MAX_PROFILE_DAYS)) {
        return Err(ForecastError::validation(format!(
            "day #{} is past the {MAX_PROFILE_DAYS}-day limit (got {v})",
            i + 1
        )));
    }

    if x.len() < MIN_POINTS {
        return Err(ForecastError::validation(format!(
            "insufficient retention data: {} point(s), need at least {MIN_POINTS}",
            x.len()
        )));
    }

    Ok(())
}

/// Check an optional projection ceiling against the observed days.
pub fn validate_profile_max(profile_max: Option<u32>, x: &[f64]) -> ForecastResult<()> {
    let Some(profile_max) = profile_max else {
        return Ok(());
    };
    if profile_max > MAX_PROFILE_DAYS {
        return Err(ForecastError::validation(format!(
            "profile_max ({profile_max}) is past the {MAX_PROFILE_DAYS}-day limit"
        )));
    }
    let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if f64::from(profile_max) < max_x {
        return Err(ForecastError::validation(format!(
            "profile_max ({profile_max}) must be greater than or equal to the largest day ({max_x})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1.0, 2.0], vec![40.0])]
    #[case(vec![1.0, f64::NAN], vec![40.0, 30.0])]
    #[case(vec![1.0, 2.0], vec![40.0, f64::INFINITY])]
    #[case(vec![0.0, 2.0], vec![40.0, 30.0])]
    #[case(vec![-1.0, 2.0], vec![40.0, 30.0])]
    #[case(vec![1.0, 2.0], vec![0.0, 30.0])]
    #[case(vec![1.0, 2.0], vec![40.0, 100.5])]
    #[case(vec![1.0], vec![40.0])]
    #[case(vec![], vec![])]
    #[case(vec![1.0, 10_000.5], vec![40.0, 30.0])]
    fn rejects_malformed_data(#[case] x: Vec<f64>, #[case] y: Vec<f64>) {
        let err = validate_retention_data(&x, &y).unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)), "{err}");
    }

    #[test]
    fn accepts_boundary_values() {
        validate_retention_data(&[0.5, 1.0, 1.0], &[100.0, 0.01, 50.0]).unwrap();
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(7), true)]
    #[case(Some(30), true)]
    #[case(Some(6), false)]
    #[case(Some(MAX_PROFILE_DAYS), true)]
    #[case(Some(MAX_PROFILE_DAYS + 1), false)]
    #[case(Some(u32::MAX), false)]
    fn profile_max_must_cover_observed_days(#[case] profile_max: Option<u32>, #[case] ok: bool) {
        let x = [1.0, 2.0, 3.0, 7.0];
        assert_eq!(validate_profile_max(profile_max, &x).is_ok(), ok);
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_valid_inputs(
            points in prop::collection::vec((-5.0f64..50.0, -10.0f64..120.0), 0..12)
        ) {
            let (x, y): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
            let valid = x.len() >= MIN_POINTS
                && x.iter().all(|v| *v > 0.0)
                && y.iter().all(|v| *v > 0.0 && *v <= 100.0);
            prop_assert_eq!(validate_retention_data(&x, &y).is_ok(), valid);
        }
    }
}
