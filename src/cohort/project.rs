//! Cohort projections and the forward-DAU table.
//!
//! A cohort acquired on column `c` contributes
//! `floor(size · retention(d) / 100)` users to column `c + d`. The forward
//! table stacks one such row per cohort; column sums are the aggregate DAU.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cohort::combine::DauTotal;
use crate::cohort::target::seek_target;
use crate::domain::{Cohort, ProjectionConfig, TargetConfig};
use crate::error::{ForecastError, ForecastResult};
use crate::fit::RetentionProfile;

/// Smallest projection horizon accepted by the table builders.
pub const MIN_PERIODS: usize = 2;

/// Largest projection horizon accepted by the table builders.
pub const MAX_PERIODS: usize = 10_000;

/// Label of the aggregate row produced by [`ForwardDauTable::total`].
pub const DAU_LABEL: &str = "DAU";

/// Active users of a cohort of `size`, for each day `0..periods` after
/// acquisition. Fractional users are truncated; days past the profile's
/// projection are 0.
pub fn project_cohort(size: u64, profile: &RetentionProfile, periods: usize) -> Vec<u64> {
    (0..periods)
        .map(|d| {
            u32::try_from(d)
                .ok()
                .and_then(|d| profile.retention_at(d))
                .map_or(0, |r| active_users(size, r))
        })
        .collect()
}

fn active_users(size: u64, retention: f64) -> u64 {
    let users = (size as f64 * retention / 100.0).floor();
    if users.is_finite() && users > 0.0 { users as u64 } else { 0 }
}

/// Per-cohort DAU over a fixed window of `periods` calendar days.
///
/// Row `i` belongs to the cohort acquired on column `i`; rows past the known
/// cohorts are cohorts synthesized by target seeking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardDauTable {
    start_date: u32,
    periods: usize,
    known_cohorts: usize,
    rows: Vec<Vec<u64>>,
}

impl ForwardDauTable {
    pub(crate) fn with_capacity(config: ProjectionConfig, cohorts: usize) -> Self {
        Self {
            start_date: config.start_date,
            periods: config.periods,
            known_cohorts: 0,
            rows: Vec::with_capacity(cohorts),
        }
    }

    /// Append a cohort starting on the next free column.
    pub(crate) fn fold_cohort(&mut self, size: u64, profile: &RetentionProfile) {
        let column = self.rows.len();
        let mut row = vec![0; self.periods];
        if column < self.periods {
            let trajectory = project_cohort(size, profile, self.periods - column);
            row[column..].copy_from_slice(&trajectory);
        }
        self.rows.push(row);
    }

    pub fn start_date(&self) -> u32 {
        self.start_date
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Cohorts supplied by the caller (the rest were synthesized).
    pub fn known_cohorts(&self) -> usize {
        self.known_cohorts
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    /// Calendar day of every column.
    pub fn column_labels(&self) -> Vec<u32> {
        day_labels(self.start_date, self.periods)
    }

    /// Start day of every row's cohort.
    pub fn row_labels(&self) -> Vec<u32> {
        day_labels(self.start_date, self.rows.len())
    }

    /// Every row as a cohort: start day and day-0 size.
    pub fn cohorts(&self) -> Vec<Cohort> {
        self.row_labels()
            .into_iter()
            .zip(self.rows.iter().enumerate())
            .map(|(start_day, (i, row))| Cohort {
                start_day,
                size: row.get(i).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Aggregate DAU on `column`.
    pub fn column_total(&self, column: usize) -> u64 {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .fold(0, |total: u64, &users| total.saturating_add(users))
    }

    /// Aggregate DAU per column.
    pub fn totals(&self) -> Vec<u64> {
        (0..self.periods).map(|c| self.column_total(c)).collect()
    }

    /// Daily new users: each cohort's day-0 size on its own column.
    pub fn new_users(&self) -> Vec<u64> {
        (0..self.periods)
            .map(|c| self.rows.get(c).and_then(|row| row.get(c)).copied().unwrap_or(0))
            .collect()
    }

    /// Aggregate DAU as a labelled row, ready for [`crate::cohort::combine`].
    pub fn total(&self) -> DauTotal {
        DauTotal::from_parts(DAU_LABEL.to_string(), self.column_labels(), self.totals())
    }
}

pub(crate) fn day_labels(start_date: u32, len: usize) -> Vec<u32> {
    (0..len)
        .map(|i| start_date.saturating_add(u32::try_from(i).unwrap_or(u32::MAX)))
        .collect()
}

pub(crate) fn validate_projection(cohorts: &[u64], config: ProjectionConfig) -> ForecastResult<()> {
    if config.periods < MIN_PERIODS {
        return Err(ForecastError::invalid_argument(format!(
            "periods must be at least {MIN_PERIODS} (got {})",
            config.periods
        )));
    }
    if config.periods > MAX_PERIODS {
        return Err(ForecastError::invalid_argument(format!(
            "periods must be at most {MAX_PERIODS} (got {})",
            config.periods
        )));
    }
    if cohorts.is_empty() {
        return Err(ForecastError::invalid_argument("at least one cohort is required"));
    }
    if let Some(pos) = cohorts.iter().position(|&size| size < 1) {
        return Err(ForecastError::invalid_argument(format!(
            "cohort sizes must be at least 1 (cohort {} is {})",
            pos + 1,
            cohorts[pos]
        )));
    }
    Ok(())
}

fn validate_target(cohorts: usize, config: ProjectionConfig, target: TargetConfig) -> ForecastResult<()> {
    if target.timeline > config.periods {
        return Err(ForecastError::TimelineExceedsPeriods {
            timeline: target.timeline,
            periods: config.periods,
        });
    }
    if target.timeline <= cohorts {
        return Err(ForecastError::invalid_argument(format!(
            "DAU target timeline ({}) must be later than the last known cohort ({cohorts})",
            target.timeline
        )));
    }
    Ok(())
}

/// Build the forward-DAU table for `cohorts` (one per day from
/// `config.start_date`), then optionally synthesize acquisition to reach
/// `target`.
pub fn project_cohorted_dau(
    profile: &RetentionProfile,
    cohorts: &[u64],
    config: ProjectionConfig,
    target: Option<TargetConfig>,
) -> ForecastResult<ForwardDauTable> {
    validate_projection(cohorts, config)?;
    if let Some(target) = target {
        validate_target(cohorts.len(), config, target)?;
    }

    let capacity = cohorts.len() + target.map_or(0, |t| t.timeline - cohorts.len());
    let mut table = ForwardDauTable::with_capacity(config, capacity);
    for &size in cohorts {
        table.fold_cohort(size, profile);
    }
    table.known_cohorts = cohorts.len();
    debug!(cohorts = cohorts.len(), periods = config.periods, "forward DAU table built");

    if let Some(target) = target {
        seek_target(&mut table, profile, target);
    }
    Ok(table)
}
