//! Target seeking: size the future acquisition needed to reach a DAU goal.
//!
//! With `k` known cohorts, the aggregate on the last known cohort's column is
//! the ramp's anchor. A straight line runs from `(1, anchor)` to
//! `(L, target)` where `L = timeline + 1 - k`; its points `2..=L` are the
//! daily goals for columns `k..timeline`.
//!
//! The columns are filled one at a time: each new cohort covers the shortfall
//! on its own column and changes every later column's total, so later
//! shortfalls depend on the earlier ones.

use tracing::debug;

use crate::cohort::project::ForwardDauTable;
use crate::domain::TargetConfig;
use crate::fit::RetentionProfile;

/// Daily DAU goals from `(1, start)` to `(steps, target)`, excluding the first
/// point. Values are truncated toward zero.
pub fn target_ramp(start: u64, target: u64, steps: usize) -> Vec<u64> {
    if steps < 2 {
        return Vec::new();
    }
    let start = start as f64;
    let slope = (target as f64 - start) / (steps as f64 - 1.0);
    (2..=steps)
        .map(|i| {
            let goal = (start + slope * (i as f64 - 1.0)).trunc();
            if goal > 0.0 { goal as u64 } else { 0 }
        })
        .collect()
}

/// Synthesize one cohort per column from the first free column up to
/// `target.timeline`. Returns the synthesized sizes.
///
/// Expects a table holding only its known cohorts, with
/// `known < target.timeline <= periods`.
pub(crate) fn seek_target(table: &mut ForwardDauTable, profile: &RetentionProfile, target: TargetConfig) -> Vec<u64> {
    let known = table.known_cohorts();
    let anchor = table.column_total(known.saturating_sub(1));
    let steps = target.timeline + 1 - known;
    let ramp = target_ramp(anchor, target.dau_target, steps);

    let mut synthesized = Vec::with_capacity(ramp.len());
    for (j, goal) in ramp.into_iter().enumerate() {
        let column = known + j;
        let current = table.column_total(column);
        let size = goal.saturating_sub(current);
        debug!(column, goal, current, size, "synthesized cohort");
        table.fold_cohort(size, profile);
        synthesized.push(size);
    }
    synthesized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::project::project_cohorted_dau;
    use crate::cohort::test_support::linear_profile;
    use crate::domain::ProjectionConfig;

    #[test]
    fn ramp_excludes_the_anchor_and_ends_on_target() {
        assert_eq!(target_ramp(100, 500, 5), vec![200, 300, 400, 500]);
        assert_eq!(target_ramp(100, 200, 4), vec![133, 166, 200]);
        assert_eq!(target_ramp(300, 100, 3), vec![200, 100]);
        assert!(target_ramp(100, 500, 1).is_empty());
    }

    #[test]
    fn synthesized_cohorts_cover_each_days_shortfall() {
        let profile = linear_profile(9);
        let target = TargetConfig {
            dau_target: 500,
            timeline: 10,
        };
        let table = project_cohorted_dau(&profile, &[100], ProjectionConfig::new(10, 1), Some(target)).unwrap();

        assert_eq!(table.known_cohorts(), 1);
        assert_eq!(table.rows().len(), 10);

        let ramp = target_ramp(100, 500, 10);
        let totals = table.totals();
        for (j, goal) in ramp.iter().enumerate() {
            assert!(totals[1 + j] >= *goal, "column {} below goal", 1 + j);
        }
        assert!(totals[9] >= 500);
        assert!(totals.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn no_acquisition_when_retained_users_already_exceed_goal() {
        let profile = linear_profile(9);
        let target = TargetConfig {
            dau_target: 0,
            timeline: 3,
        };
        let table = project_cohorted_dau(&profile, &[1000], ProjectionConfig::new(4, 1), Some(target)).unwrap();
        // Ramp from 1000 down to 0: goals 500 and 0, retained users 400 and 350.
        assert_eq!(table.new_users(), vec![1000, 100, 0, 0]);
    }
}
