//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and projection
//! - handed to chart/table collaborators as plain data
//! - rendered as JSON by the `dau` binary

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::validation::{validate_profile_max, validate_retention_data};
use crate::error::{ForecastError, ForecastResult};

/// Parametric retention decay family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyKind {
    Log,
    Exp,
    Linear,
    Quad,
    Weibull,
    Power,
}

impl FamilyKind {
    /// Registry order. Best-fit ties resolve to the earliest entry.
    pub const ALL: [FamilyKind; 6] = [
        FamilyKind::Log,
        FamilyKind::Exp,
        FamilyKind::Linear,
        FamilyKind::Quad,
        FamilyKind::Weibull,
        FamilyKind::Power,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FamilyKind::Log => "log",
            FamilyKind::Exp => "exp",
            FamilyKind::Linear => "linear",
            FamilyKind::Quad => "quad",
            FamilyKind::Weibull => "weibull",
            FamilyKind::Power => "power",
        }
    }

    /// Human-readable formula for terminal output.
    pub fn formula(self) -> &'static str {
        match self {
            FamilyKind::Log => "-a*log2(b+x)+c",
            FamilyKind::Exp => "a*exp(-b*x)+c",
            FamilyKind::Linear => "a*x+b",
            FamilyKind::Quad => "a*x^2+b*x+c",
            FamilyKind::Weibull => "(k/l)*(x/l)^(k-1)*exp(-(x/l)^k)",
            FamilyKind::Power => "a*x^(-b)",
        }
    }

    /// Number of fitted coefficients.
    pub fn param_len(self) -> usize {
        match self {
            FamilyKind::Log | FamilyKind::Exp | FamilyKind::Quad => 3,
            FamilyKind::Linear | FamilyKind::Weibull | FamilyKind::Power => 2,
        }
    }
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which curve a profile projects with.
///
/// `BestFit` resolves to the family with the lowest summed squared error;
/// `Interpolate` is only ever chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveForm {
    #[default]
    BestFit,
    Family(FamilyKind),
    Interpolate,
}

impl CurveForm {
    pub fn name(self) -> &'static str {
        match self {
            CurveForm::BestFit => "best_fit",
            CurveForm::Family(kind) => kind.name(),
            CurveForm::Interpolate => "interpolate",
        }
    }
}

impl fmt::Display for CurveForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveForm {
    type Err = ForecastError;

    /// Parse a form name. An empty string means `best_fit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "best_fit" {
            return Ok(CurveForm::BestFit);
        }
        if s == "interpolate" {
            return Ok(CurveForm::Interpolate);
        }
        FamilyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .map(CurveForm::Family)
            .ok_or_else(|| ForecastError::InvalidForm(s.to_string()))
    }
}

/// CLI-facing form selector (flat, so clap can enumerate it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FormSpec {
    #[value(name = "best_fit")]
    BestFit,
    Log,
    Exp,
    Linear,
    Quad,
    Weibull,
    Power,
    Interpolate,
}

impl FormSpec {
    pub fn to_form(self) -> CurveForm {
        match self {
            FormSpec::BestFit => CurveForm::BestFit,
            FormSpec::Log => CurveForm::Family(FamilyKind::Log),
            FormSpec::Exp => CurveForm::Family(FamilyKind::Exp),
            FormSpec::Linear => CurveForm::Family(FamilyKind::Linear),
            FormSpec::Quad => CurveForm::Family(FamilyKind::Quad),
            FormSpec::Weibull => CurveForm::Family(FamilyKind::Weibull),
            FormSpec::Power => CurveForm::Family(FamilyKind::Power),
            FormSpec::Interpolate => CurveForm::Interpolate,
        }
    }
}

/// Validated retention observations: the raw input stage of a profile.
///
/// `x` holds day offsets (duplicates allowed), `y` the retention percentage
/// observed at each of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionData {
    x: Vec<f64>,
    y: Vec<f64>,
    profile_max: Option<u32>,
}

impl RetentionData {
    /// Validate and wrap raw observations.
    pub fn new(x: Vec<f64>, y: Vec<f64>, profile_max: Option<u32>) -> ForecastResult<Self> {
        validate_retention_data(&x, &y)?;
        validate_profile_max(profile_max, &x)?;
        Ok(Self { x, y, profile_max })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest observed day.
    pub fn max_day(&self) -> f64 {
        self.x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Projection horizon: `profile_max` if given, else the largest observed
    /// day (rounded up to a whole day).
    pub fn horizon(&self) -> u32 {
        self.profile_max
            .unwrap_or_else(|| self.max_day().ceil() as u32)
    }

    pub fn profile_max(&self) -> Option<u32> {
        self.profile_max
    }

    /// Average retention per distinct day, rounded to 2 decimals, sorted by day.
    pub fn collapsed(&self) -> CollapsedPoints {
        let mut pairs: Vec<(f64, f64)> = self.x.iter().copied().zip(self.y.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut i = 0;
        while i < pairs.len() {
            let day = pairs[i].0;
            let mut sum = 0.0;
            let mut count = 0usize;
            while i < pairs.len() && pairs[i].0 == day {
                sum += pairs[i].1;
                count += 1;
                i += 1;
            }
            x.push(day);
            y.push(((sum / count as f64) * 100.0).round() / 100.0);
        }

        CollapsedPoints { x, y }
    }
}

/// De-duplicated observations (one averaged value per distinct day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsedPoints {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// A single acquisition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Calendar day (>= 1) the cohort was acquired on.
    pub start_day: u32,
    /// Newly acquired users.
    pub size: u64,
}

/// Profile construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub form: CurveForm,
    pub profile_max: Option<u32>,
}

/// Forward-projection options shared by the DAU builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionConfig {
    /// Number of calendar days (table columns) to project.
    pub periods: usize,
    /// Calendar day of the first column. `0` is treated as `1`.
    pub start_date: u32,
}

impl ProjectionConfig {
    pub fn new(periods: usize, start_date: u32) -> Self {
        Self {
            periods,
            start_date: start_date.max(1),
        }
    }
}

/// Target-seeking options: reach `dau_target` by column `timeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub dau_target: u64,
    pub timeline: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", CurveForm::BestFit)]
    #[case("best_fit", CurveForm::BestFit)]
    #[case("interpolate", CurveForm::Interpolate)]
    #[case("weibull", CurveForm::Family(FamilyKind::Weibull))]
    #[case(" power ", CurveForm::Family(FamilyKind::Power))]
    fn parses_known_forms(#[case] input: &str, #[case] expected: CurveForm) {
        assert_eq!(input.parse::<CurveForm>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_form() {
        let err = "poly".parse::<CurveForm>().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidForm(name) if name == "poly"));
    }

    #[test]
    fn form_spec_round_trips_through_names() {
        for spec in FormSpec::value_variants() {
            let form = spec.to_form();
            assert_eq!(form.name().parse::<CurveForm>().unwrap(), form);
        }
    }

    #[test]
    fn collapsed_points_average_duplicate_days() {
        let data = RetentionData::new(
            vec![3.0, 1.0, 1.0, 2.0],
            vec![20.0, 40.0, 45.0, 30.0],
            None,
        )
        .unwrap();
        let collapsed = data.collapsed();
        assert_eq!(collapsed.x, vec![1.0, 2.0, 3.0]);
        assert_eq!(collapsed.y, vec![42.5, 30.0, 20.0]);
    }

    #[test]
    fn horizon_defaults_to_max_day() {
        let data = RetentionData::new(vec![1.0, 7.0], vec![40.0, 10.0], None).unwrap();
        assert_eq!(data.horizon(), 7);
        let data = RetentionData::new(vec![1.0, 7.0], vec![40.0, 10.0], Some(30)).unwrap();
        assert_eq!(data.horizon(), 30);
    }

    #[test]
    fn projection_config_normalizes_start_date() {
        assert_eq!(ProjectionConfig::new(5, 0).start_date, 1);
        assert_eq!(ProjectionConfig::new(5, 4).start_date, 4);
    }
}
