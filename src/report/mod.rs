//! Reporting utilities: residuals and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::fit::RetentionProfile;

/// Observed vs fitted retention at one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Residual {
    pub day: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

/// Residuals of the profile's selected curve at every raw observation.
pub fn compute_residuals(profile: &RetentionProfile) -> Vec<Residual> {
    profile
        .x()
        .iter()
        .zip(profile.y())
        .map(|(&day, &observed)| {
            let fitted = profile.curve().eval(day);
            Residual {
                day,
                observed,
                fitted,
                residual: observed - fitted,
            }
        })
        .collect()
}
