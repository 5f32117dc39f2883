//! The finalized retention profile.
//!
//! Construction is staged:
//!
//! ```text
//! (x, y) ──RetentionData::new──▶ RetentionData ──fit_and_score──▶ FitSet ──select──▶ RetentionProfile
//! ```
//!
//! Once built, a profile is immutable; cohort projections only read it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CollapsedPoints, CurveForm, FamilyKind, ProfileConfig, RetentionData};
use crate::error::ForecastResult;
use crate::fit::projection::Projection;
use crate::fit::selection::fit_and_score;
use crate::models::Curve;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionProfile {
    data: RetentionData,
    collapsed: CollapsedPoints,
    params: BTreeMap<FamilyKind, Vec<f64>>,
    errors: BTreeMap<FamilyKind, f64>,
    best_fit: FamilyKind,
    selected_form: CurveForm,
    curve: Curve,
    projection: Projection,
    skipped: Vec<(FamilyKind, String)>,
}

impl RetentionProfile {
    /// Validate `(x, y)`, fit every family and select `config.form`.
    pub fn build(x: Vec<f64>, y: Vec<f64>, config: ProfileConfig) -> ForecastResult<Self> {
        let data = RetentionData::new(x, y, config.profile_max)?;
        fit_and_score(data).select(config.form)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        data: RetentionData,
        collapsed: CollapsedPoints,
        params: BTreeMap<FamilyKind, Vec<f64>>,
        errors: BTreeMap<FamilyKind, f64>,
        best_fit: FamilyKind,
        selected_form: CurveForm,
        curve: Curve,
        projection: Projection,
        skipped: Vec<(FamilyKind, String)>,
    ) -> Self {
        Self {
            data,
            collapsed,
            params,
            errors,
            best_fit,
            selected_form,
            curve,
            projection,
            skipped,
        }
    }

    pub fn x(&self) -> &[f64] {
        self.data.x()
    }

    pub fn y(&self) -> &[f64] {
        self.data.y()
    }

    pub fn data(&self) -> &RetentionData {
        &self.data
    }

    pub fn collapsed(&self) -> &CollapsedPoints {
        &self.collapsed
    }

    /// Fitted coefficients; families that failed to fit are absent.
    pub fn params(&self) -> &BTreeMap<FamilyKind, Vec<f64>> {
        &self.params
    }

    /// Summed squared error per scored family.
    pub fn errors(&self) -> &BTreeMap<FamilyKind, f64> {
        &self.errors
    }

    pub fn best_fit(&self) -> FamilyKind {
        self.best_fit
    }

    /// The form as requested (may be `BestFit`).
    pub fn selected_form(&self) -> CurveForm {
        self.selected_form
    }

    /// The curve actually used for the projection.
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn skipped(&self) -> &[(FamilyKind, String)] {
        &self.skipped
    }

    pub fn retention_at(&self, day: u32) -> Option<f64> {
        self.projection.retention_at(day)
    }

    pub fn max_offset(&self) -> u32 {
        self.projection.max_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    fn config(form: CurveForm, profile_max: Option<u32>) -> ProfileConfig {
        ProfileConfig { form, profile_max }
    }

    #[test]
    fn build_validates_before_fitting() {
        let err = RetentionProfile::build(vec![1.0, 2.0], vec![40.0], ProfileConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));

        let err = RetentionProfile::build(vec![1.0, 8.0], vec![40.0, 10.0], config(CurveForm::BestFit, Some(7)))
            .unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));
    }

    #[test]
    fn best_fit_profile_projects_to_profile_max() {
        let profile = RetentionProfile::build(
            vec![1.0, 2.0, 3.0, 7.0],
            vec![40.0, 30.0, 25.0, 10.0],
            config(CurveForm::BestFit, Some(10)),
        )
        .unwrap();

        assert_eq!(profile.selected_form(), CurveForm::BestFit);
        assert_eq!(profile.curve().family(), Some(profile.best_fit()));
        assert_eq!(profile.projection().len(), 10);
        assert_eq!(profile.max_offset(), 10);
        assert_eq!(profile.retention_at(0), Some(100.0));

        let best = profile.errors()[&profile.best_fit()];
        assert!(profile.errors().values().all(|&e| e >= best));
    }

    #[test]
    fn explicit_family_is_used_even_when_not_best() {
        let profile = RetentionProfile::build(
            vec![1.0, 2.0, 3.0, 7.0],
            vec![40.0, 30.0, 25.0, 10.0],
            config(CurveForm::Family(FamilyKind::Linear), None),
        )
        .unwrap();
        assert_eq!(profile.curve().family(), Some(FamilyKind::Linear));
        assert_eq!(profile.projection().len(), 7);
    }

    #[test]
    fn interpolate_profile_follows_collapsed_points() {
        let profile = RetentionProfile::build(
            vec![1.0, 1.0, 3.0, 5.0],
            vec![40.0, 44.0, 30.0, 20.0],
            config(CurveForm::Interpolate, Some(7)),
        )
        .unwrap();
        assert_eq!(profile.collapsed().x, vec![1.0, 3.0, 5.0]);
        assert_eq!(profile.retention_at(1), Some(42.0));
        assert_eq!(profile.retention_at(2), Some(36.0));
        // Spline extends the last segment (-5 per day).
        assert_eq!(profile.retention_at(7), Some(10.0));
    }
}
