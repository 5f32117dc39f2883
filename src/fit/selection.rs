//! Scoring and best-fit selection.
//!
//! Every fitted family is scored by its summed squared error against the
//! observations that sit on whole days `1..=horizon`:
//!
//! ```text
//! SSE = Σ_{d=1..horizon} Σ_{i: x_i = d} (f(d) - y_i)²
//! ```
//!
//! `best_fit` is the family with the lowest score; ties resolve to registry
//! order. Interpolation never competes and is only used when asked for.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::domain::{CollapsedPoints, CurveForm, FamilyKind, RetentionData};
use crate::error::{ForecastError, ForecastResult};
use crate::fit::fitter::fit_families;
use crate::fit::profile::RetentionProfile;
use crate::fit::projection::generate_projection;
use crate::models::{Curve, Interpolation};

/// Summed squared error of `curve` over the integer days `1..=horizon`.
///
/// Observations on fractional days, or past the horizon, are not scored.
pub fn score_curve(curve: &Curve, data: &RetentionData, horizon: u32) -> f64 {
    data.x()
        .iter()
        .zip(data.y())
        .filter(|(x, _)| x.fract() == 0.0 && **x >= 1.0 && **x <= f64::from(horizon))
        .map(|(&x, &y)| {
            let diff = curve.eval(x) - y;
            diff * diff
        })
        .sum()
}

/// Family with the minimum score. Ties go to the earliest registry entry.
pub fn select_best(errors: &BTreeMap<FamilyKind, f64>) -> ForecastResult<FamilyKind> {
    let mut best: Option<(FamilyKind, f64)> = None;
    for (&kind, &score) in errors {
        match best {
            Some((_, b)) if score >= b => {}
            _ => best = Some((kind, score)),
        }
    }
    best.map(|(kind, _)| kind).ok_or(ForecastError::NoViableFit)
}

/// Output of the fit stage: every family fitted and scored, nothing selected
/// yet.
#[derive(Debug, Clone)]
pub struct FitSet {
    data: RetentionData,
    collapsed: CollapsedPoints,
    params: BTreeMap<FamilyKind, Vec<f64>>,
    errors: BTreeMap<FamilyKind, f64>,
    best_fit: Option<FamilyKind>,
    interpolation: Option<Interpolation>,
    skipped: Vec<(FamilyKind, String)>,
}

/// Fit every family, build the interpolation and score the fits.
pub fn fit_and_score(data: RetentionData) -> FitSet {
    let horizon = data.horizon();
    let collapsed = data.collapsed();
    let interpolation = Interpolation::from_collapsed(&collapsed);

    let fits = fit_families(&data);

    let mut params = BTreeMap::new();
    let mut errors = BTreeMap::new();
    for fit in fits.fits {
        let Some(curve) = Curve::from_params(fit.kind, &fit.params) else {
            continue;
        };
        let score = score_curve(&curve, &data, horizon);
        if score.is_finite() {
            debug!(family = fit.kind.name(), score, "family scored");
            errors.insert(fit.kind, score);
        } else {
            warn!(family = fit.kind.name(), "non-finite score; excluded from best fit");
        }
        params.insert(fit.kind, fit.params);
    }

    let best_fit = select_best(&errors).ok();
    let skipped = fits
        .skipped
        .into_iter()
        .map(|(kind, failure)| (kind, failure.to_string()))
        .collect();

    FitSet {
        data,
        collapsed,
        params,
        errors,
        best_fit,
        interpolation,
        skipped,
    }
}

impl FitSet {
    pub fn data(&self) -> &RetentionData {
        &self.data
    }

    pub fn params(&self) -> &BTreeMap<FamilyKind, Vec<f64>> {
        &self.params
    }

    pub fn errors(&self) -> &BTreeMap<FamilyKind, f64> {
        &self.errors
    }

    pub fn best_fit(&self) -> Option<FamilyKind> {
        self.best_fit
    }

    /// Families that failed to fit, with the reason.
    pub fn skipped(&self) -> &[(FamilyKind, String)] {
        &self.skipped
    }

    /// Resolve `form` to a curve and build the final profile.
    ///
    /// Fails with `NoViableFit` when no family could be scored, whatever the
    /// requested form, and with `UnfittedForm` when a specific family was
    /// requested but has no parameters.
    pub fn select(self, form: CurveForm) -> ForecastResult<RetentionProfile> {
        let best_fit = self.best_fit.ok_or(ForecastError::NoViableFit)?;

        let curve = match form {
            CurveForm::BestFit => self.family_curve(best_fit)?,
            CurveForm::Family(kind) => self.family_curve(kind)?,
            CurveForm::Interpolate => self
                .interpolation
                .clone()
                .map(Curve::Interpolate)
                .ok_or_else(|| ForecastError::validation("interpolation needs at least 2 distinct days"))?,
        };

        let projection = generate_projection(&curve, self.data.horizon());
        info!(form = %form, curve = curve.name(), best_fit = best_fit.name(), "retention curve selected");

        Ok(RetentionProfile::from_parts(
            self.data,
            self.collapsed,
            self.params,
            self.errors,
            best_fit,
            form,
            curve,
            projection,
            self.skipped,
        ))
    }

    fn family_curve(&self, kind: FamilyKind) -> ForecastResult<Curve> {
        self.params
            .get(&kind)
            .and_then(|params| Curve::from_params(kind, params))
            .ok_or(ForecastError::UnfittedForm(kind))
    }
}
