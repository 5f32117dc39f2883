//! Shared input handling for the `dau` subcommands.
//!
//! Every projecting command runs the same front half:
//! observations -> profile -> cohorts -> projection options.
//! The handlers in [`crate::app`] then only choose what to compute and print.

use tracing::{info, warn};

use crate::cli::{CohortArgs, ProfileArgs, SampleArgs};
use crate::data::SampleConfig;
use crate::domain::{ProfileConfig, ProjectionConfig, TargetConfig};
use crate::error::{ForecastError, ForecastResult};
use crate::fit::RetentionProfile;

/// Observations read from `--input` or given inline.
pub fn load_observations(args: &ProfileArgs) -> ForecastResult<(Vec<f64>, Vec<f64>)> {
    if let Some(path) = &args.input {
        let ingested = crate::io::load_observations(path)?;
        for err in &ingested.row_errors {
            warn!(line = err.line, "skipped observation row: {}", err.message);
        }
        info!(
            path = %path.display(),
            rows = ingested.rows_read,
            kept = ingested.x.len(),
            "loaded observations"
        );
        return Ok((ingested.x, ingested.y));
    }

    if args.days.is_empty() {
        return Err(ForecastError::invalid_argument(
            "retention observations are required: pass --input <CSV> or --days with --retention",
        ));
    }
    Ok((args.days.clone(), args.retention.clone()))
}

/// Fit and select the retention profile described by `args`.
pub fn build_profile(args: &ProfileArgs) -> ForecastResult<RetentionProfile> {
    let (x, y) = load_observations(args)?;
    RetentionProfile::build(
        x,
        y,
        ProfileConfig {
            form: args.form.to_form(),
            profile_max: args.profile_max,
        },
    )
}

/// Cohort sizes from `--cohorts` or `--cohorts-csv`.
pub fn resolve_cohorts(args: &CohortArgs) -> ForecastResult<Vec<u64>> {
    match &args.cohorts_csv {
        Some(path) => crate::io::load_cohort_sizes(path),
        None if args.cohorts.is_empty() => Err(ForecastError::invalid_argument(
            "cohort sizes are required: pass --cohorts or --cohorts-csv",
        )),
        None => Ok(args.cohorts.clone()),
    }
}

pub fn projection_config(args: &CohortArgs) -> ProjectionConfig {
    ProjectionConfig::new(args.periods, args.start_date)
}

/// Target options; a target and its timeline must be given together.
pub fn target_config(dau_target: Option<u64>, timeline: Option<usize>) -> ForecastResult<Option<TargetConfig>> {
    match (dau_target, timeline) {
        (Some(dau_target), Some(timeline)) => Ok(Some(TargetConfig { dau_target, timeline })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ForecastError::invalid_argument(
            "--dau-target needs --target-timeline",
        )),
        (None, Some(_)) => Err(ForecastError::invalid_argument(
            "--target-timeline needs --dau-target",
        )),
    }
}

pub fn sample_config(args: &SampleArgs) -> SampleConfig {
    let params = if args.params.is_empty() {
        args.family.default_params()
    } else {
        args.params.clone()
    };
    SampleConfig {
        family: args.family.kind(),
        params,
        max_day: args.max_day,
        per_day: args.per_day,
        noise: args.noise,
        seed: args.seed,
    }
}
