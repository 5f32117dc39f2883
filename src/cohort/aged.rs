//! DAU broken down by user age.
//!
//! A user acquired on column `c` has age `d + 1` on column `c + d` (the
//! acquisition day counts as age 1). Each row of an [`AgedDauTable`] sums, for
//! one age threshold, the users that are
//!
//! - at least that old ([`AgeMode::AtLeast`]), or
//! - exactly that old ([`AgeMode::Exact`]).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cohort::project::{day_labels, project_cohort, validate_projection};
use crate::domain::ProjectionConfig;
use crate::error::{ForecastError, ForecastResult};
use crate::fit::RetentionProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AgeMode {
    #[default]
    AtLeast,
    Exact,
}

impl AgeMode {
    /// Whether a user `d` days past acquisition counts towards `age`.
    fn counts(self, age: usize, d: usize) -> bool {
        match self {
            AgeMode::AtLeast => d + 1 >= age,
            AgeMode::Exact => d + 1 == age,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgedDauTable {
    mode: AgeMode,
    start_date: u32,
    periods: usize,
    ages: Vec<u32>,
    rows: Vec<Vec<u64>>,
}

impl AgedDauTable {
    pub fn mode(&self) -> AgeMode {
        self.mode
    }

    /// Row labels.
    pub fn ages(&self) -> &[u32] {
        &self.ages
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn column_labels(&self) -> Vec<u32> {
        day_labels(self.start_date, self.periods())
    }

    /// Row for `age`, if it was kept.
    pub fn row(&self, age: u32) -> Option<&[u64]> {
        self.ages.iter().position(|&a| a == age).map(|i| self.rows[i].as_slice())
    }
}

/// Drop duplicates (first occurrence wins) and ages past `periods`.
fn normalize_ages(ages: &[u32], periods: usize) -> ForecastResult<Vec<u32>> {
    if ages.is_empty() {
        return Err(ForecastError::invalid_argument("at least one age is required"));
    }
    if ages.contains(&0) {
        return Err(ForecastError::invalid_argument("ages must be positive"));
    }

    let mut kept: Vec<u32> = Vec::with_capacity(ages.len());
    for &age in ages {
        if age as usize > periods {
            debug!(age, periods, "age beyond the projection window; dropped");
            continue;
        }
        if !kept.contains(&age) {
            kept.push(age);
        }
    }
    Ok(kept)
}

/// Build the aged-DAU table for `cohorts` (one per day from
/// `config.start_date`).
pub fn project_aged_dau(
    profile: &RetentionProfile,
    cohorts: &[u64],
    config: ProjectionConfig,
    ages: &[u32],
    mode: AgeMode,
) -> ForecastResult<AgedDauTable> {
    validate_projection(cohorts, config)?;
    let ages = normalize_ages(ages, config.periods)?;
    let periods = config.periods;

    let trajectories: Vec<Vec<u64>> = cohorts
        .iter()
        .enumerate()
        .filter(|(column, _)| *column < periods)
        .map(|(column, &size)| project_cohort(size, profile, periods - column))
        .collect();

    let rows = ages
        .iter()
        .map(|&age| {
            let age = age as usize;
            let mut row = vec![0u64; periods];
            for (column, trajectory) in trajectories.iter().enumerate() {
                for (d, &users) in trajectory.iter().enumerate() {
                    if mode.counts(age, d) {
                        row[column + d] = row[column + d].saturating_add(users);
                    }
                }
            }
            row
        })
        .collect();

    Ok(AgedDauTable {
        mode,
        start_date: config.start_date,
        periods,
        ages,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::project::project_cohorted_dau;
    use crate::cohort::test_support::{linear_profile, shared_profile};
    use proptest::prelude::*;

    #[test]
    fn at_least_age_skips_younger_users() {
        let profile = linear_profile(9);
        let table =
            project_aged_dau(&profile, &[100, 50], ProjectionConfig::new(5, 1), &[1, 2, 3], AgeMode::AtLeast).unwrap();

        // Forward rows: [100, 40, 35, 30, 25] and [0, 50, 20, 17, 15].
        assert_eq!(table.row(1).unwrap(), &[100, 90, 55, 47, 40]);
        assert_eq!(table.row(2).unwrap(), &[0, 40, 55, 47, 40]);
        assert_eq!(table.row(3).unwrap(), &[0, 0, 35, 47, 40]);
        assert_eq!(table.column_labels(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn exact_age_keeps_a_single_day_per_cohort() {
        let profile = linear_profile(9);
        let table =
            project_aged_dau(&profile, &[100, 50], ProjectionConfig::new(5, 1), &[2, 3], AgeMode::Exact).unwrap();
        assert_eq!(table.row(2).unwrap(), &[0, 40, 20, 0, 0]);
        assert_eq!(table.row(3).unwrap(), &[0, 0, 35, 17, 0]);
    }

    #[test]
    fn ages_are_deduplicated_and_clipped() {
        let profile = linear_profile(9);
        let table =
            project_aged_dau(&profile, &[10], ProjectionConfig::new(4, 1), &[3, 9, 1, 3], AgeMode::AtLeast).unwrap();
        assert_eq!(table.ages(), &[3, 1]);
        assert!(table.row(9).is_none());
    }

    #[test]
    fn rejects_empty_or_zero_ages() {
        let profile = linear_profile(9);
        for ages in [&[][..], &[2, 0][..]] {
            let err = project_aged_dau(&profile, &[10], ProjectionConfig::new(4, 1), ages, AgeMode::Exact).unwrap_err();
            assert!(matches!(err, ForecastError::InvalidArgument(_)));
        }
    }

    #[test]
    fn aged_rows_saturate_instead_of_overflowing() {
        let profile = linear_profile(9);
        let table = project_aged_dau(
            &profile,
            &[u64::MAX, u64::MAX],
            ProjectionConfig::new(3, 1),
            &[1],
            AgeMode::AtLeast,
        )
        .unwrap();
        assert_eq!(table.row(1).unwrap()[1], u64::MAX);
    }

    proptest! {
        #[test]
        fn exact_ages_partition_the_forward_totals(
            cohorts in proptest::collection::vec(1u64..5_000, 1..6),
            periods in 2usize..12,
        ) {
            let profile = shared_profile();
            let config = ProjectionConfig::new(periods, 1);
            let all_ages: Vec<u32> = (1..=periods as u32).collect();

            let exact = project_aged_dau(profile, &cohorts, config, &all_ages, AgeMode::Exact).unwrap();
            let forward = project_cohorted_dau(profile, &cohorts, config, None).unwrap();

            let mut sums = vec![0u64; periods];
            for row in exact.rows() {
                for (s, v) in sums.iter_mut().zip(row) {
                    *s += v;
                }
            }
            prop_assert_eq!(sums, forward.totals());

            let at_least = project_aged_dau(profile, &cohorts, config, &[1], AgeMode::AtLeast).unwrap();
            prop_assert_eq!(at_least.rows()[0].clone(), forward.totals());
        }
    }
}
