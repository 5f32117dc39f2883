//! Command-line parsing for the `dau` forecaster.
//!
//! Argument parsing and command dispatch stay separate from the fitting and
//! projection code: the structs here are folded into plain config values in
//! [`crate::app`].

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cohort::AgeMode;
use crate::domain::{FamilyKind, FormSpec};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dau", version, about = "Retention curve fitting and cohort DAU forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every retention family and print the selected profile.
    Fit(FitArgs),
    /// Project cohorts forward into a DAU table, optionally seeking a DAU target.
    Project(ProjectArgs),
    /// Break projected DAU down by user age.
    Aged(AgedArgs),
    /// Merge DAU totals (CSV files from `dau project --format csv`).
    Combine(CombineArgs),
    /// Print synthetic `day,retention` observations as CSV.
    Sample(SampleArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// `day,dau` totals (only for `project`).
    Csv,
}

/// Where the observations come from and how the profile is built.
#[derive(Debug, Clone, Args)]
pub struct ProfileArgs {
    /// CSV file with `day` and `retention` columns.
    #[arg(short = 'i', long, value_name = "CSV", conflicts_with_all = ["days", "retention"])]
    pub input: Option<PathBuf>,

    /// Observed days, comma separated (use with --retention).
    #[arg(long, value_delimiter = ',', requires = "retention")]
    pub days: Vec<f64>,

    /// Observed retention percentages, comma separated (use with --days).
    #[arg(long, value_delimiter = ',', requires = "days")]
    pub retention: Vec<f64>,

    /// Curve form used for the projection.
    #[arg(long, value_enum, env = "DAU_FORM", default_value_t = FormSpec::BestFit)]
    pub form: FormSpec,

    /// Last day of the projection (defaults to the largest observed day, at most 10000).
    #[arg(long, env = "DAU_PROFILE_MAX")]
    pub profile_max: Option<u32>,
}

/// Cohort sizes and the projection window.
#[derive(Debug, Clone, Args)]
pub struct CohortArgs {
    /// Cohort sizes, one per day, comma separated.
    #[arg(long, value_delimiter = ',', conflicts_with = "cohorts_csv")]
    pub cohorts: Vec<u64>,

    /// CSV file with a `size` column, one row per day.
    #[arg(long, value_name = "CSV")]
    pub cohorts_csv: Option<PathBuf>,

    /// Number of calendar days to project (at most 10000).
    #[arg(short = 'p', long, env = "DAU_PERIODS", default_value_t = 30)]
    pub periods: usize,

    /// Calendar day of the first cohort.
    #[arg(long, env = "DAU_START_DATE", default_value_t = 1)]
    pub start_date: u32,

    /// Calendar date of day 1, used for column headers.
    #[arg(long, env = "DAU_ANCHOR_DATE", value_name = "YYYY-MM-DD")]
    pub anchor_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Args)]
pub struct FitArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[command(flatten)]
    pub cohorts: CohortArgs,

    /// DAU to reach by `--target-timeline`.
    #[arg(long, env = "DAU_TARGET")]
    pub dau_target: Option<u64>,

    /// Column (counted from the first cohort, 1-based) by which the target is due.
    #[arg(long, env = "DAU_TARGET_TIMELINE")]
    pub target_timeline: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct AgedArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[command(flatten)]
    pub cohorts: CohortArgs,

    /// Age thresholds in days (acquisition day is age 1), comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub ages: Vec<u32>,

    #[arg(long, value_enum, default_value_t = AgeMode::AtLeast)]
    pub mode: AgeMode,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct CombineArgs {
    /// DAU total CSV files (`day,dau`).
    #[arg(required = true, num_args = 2.., value_name = "CSV")]
    pub files: Vec<PathBuf>,

    /// One label per file, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Calendar date of day 1, used for column headers.
    #[arg(long, env = "DAU_ANCHOR_DATE", value_name = "YYYY-MM-DD")]
    pub anchor_date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct SampleArgs {
    /// Family the observations are drawn around.
    #[arg(long, value_enum, default_value_t = SampleFamily::Exp)]
    pub family: SampleFamily,

    /// Family parameters, comma separated (defaults to a typical decay).
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub params: Vec<f64>,

    /// Observations span days 1..=max-day.
    #[arg(long, default_value_t = 30)]
    pub max_day: u32,

    /// Observations per day.
    #[arg(long, default_value_t = 3)]
    pub per_day: usize,

    /// Log-scale noise level.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Parametric families selectable for sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleFamily {
    Log,
    Exp,
    Linear,
    Quad,
    Weibull,
    Power,
}

impl SampleFamily {
    pub fn kind(self) -> FamilyKind {
        match self {
            SampleFamily::Log => FamilyKind::Log,
            SampleFamily::Exp => FamilyKind::Exp,
            SampleFamily::Linear => FamilyKind::Linear,
            SampleFamily::Quad => FamilyKind::Quad,
            SampleFamily::Weibull => FamilyKind::Weibull,
            SampleFamily::Power => FamilyKind::Power,
        }
    }

    /// Parameters used when none are given.
    pub fn default_params(self) -> Vec<f64> {
        match self {
            SampleFamily::Log => vec![10.0, 1.0, 50.0],
            SampleFamily::Exp => vec![45.0, 0.25, 5.0],
            SampleFamily::Linear => vec![-1.0, 40.0],
            SampleFamily::Quad => vec![0.03, -2.5, 50.0],
            SampleFamily::Weibull => vec![0.8, 5.0],
            SampleFamily::Power => vec![45.0, 0.5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_project_with_target() {
        let cli = Cli::try_parse_from([
            "dau",
            "project",
            "--days",
            "1,2,3,7",
            "--retention",
            "40,30,25,10",
            "--cohorts",
            "100,50",
            "--periods",
            "10",
            "--dau-target",
            "500",
            "--target-timeline",
            "8",
            "--anchor-date",
            "2025-01-01",
        ])
        .unwrap();
        let Command::Project(args) = cli.command else {
            panic!("expected project");
        };
        assert_eq!(args.profile.days, vec![1.0, 2.0, 3.0, 7.0]);
        assert_eq!(args.cohorts.cohorts, vec![100, 50]);
        assert_eq!(args.cohorts.periods, 10);
        assert_eq!(args.dau_target, Some(500));
        assert_eq!(args.target_timeline, Some(8));
        assert_eq!(args.cohorts.anchor_date, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn parses_forms_by_name() {
        let cli = Cli::try_parse_from(["dau", "fit", "-i", "obs.csv", "--form", "best_fit", "--format", "json"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.profile.form, FormSpec::BestFit);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn combine_needs_two_files() {
        assert!(Cli::try_parse_from(["dau", "combine", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["dau", "combine", "a.csv", "b.csv", "--labels", "A,B"]).is_ok());
    }

    #[test]
    fn sample_families_have_matching_default_params() {
        for family in SampleFamily::value_variants() {
            assert_eq!(family.default_params().len(), family.kind().param_len());
        }
    }
}
