//! Merging DAU totals from separate projections.
//!
//! Each input is one labelled row of day-indexed sums. The merged table has
//! one row per input, the union of all days as columns (ascending) and 0 for
//! days an input does not cover.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::cohort::project::DAU_LABEL;
use crate::error::{ForecastError, ForecastResult};

/// One row of aggregate DAU, keyed by calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DauTotal {
    label: String,
    days: Vec<u32>,
    values: Vec<u64>,
}

impl DauTotal {
    /// Wrap `(day, value)` columns. Days must be unique.
    pub fn new(label: impl Into<String>, days: Vec<u32>, values: Vec<u64>) -> ForecastResult<Self> {
        if days.len() != values.len() {
            return Err(ForecastError::invalid_argument(format!(
                "DAU total has {} days but {} values",
                days.len(),
                values.len()
            )));
        }
        let mut seen = HashSet::with_capacity(days.len());
        if let Some(day) = days.iter().find(|d| !seen.insert(**d)) {
            return Err(ForecastError::invalid_argument(format!("day {day} appears more than once")));
        }
        Ok(Self::from_parts(label.into(), days, values))
    }

    pub(crate) fn from_parts(label: String, days: Vec<u32>, values: Vec<u64>) -> Self {
        Self { label, days, values }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn days(&self) -> &[u32] {
        &self.days
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedDau {
    labels: Vec<String>,
    days: Vec<u32>,
    rows: Vec<Vec<u64>>,
}

impl CombinedDau {
    /// Row labels, one per input.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Column labels, ascending.
    pub fn days(&self) -> &[u32] {
        &self.days
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    pub fn row(&self, label: &str) -> Option<&[u64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.rows[i].as_slice())
    }
}

/// Outer-join two or more DAU totals on their days.
///
/// With `labels`, row `i` is relabelled `labels[i]`; otherwise each input
/// keeps its own label (by default `DAU`).
pub fn combine(totals: &[DauTotal], labels: Option<&[String]>) -> ForecastResult<CombinedDau> {
    if totals.len() < 2 {
        return Err(ForecastError::invalid_argument(format!(
            "combine needs at least 2 DAU tables (got {})",
            totals.len()
        )));
    }
    if let Some(labels) = labels.filter(|l| l.len() != totals.len()) {
        return Err(ForecastError::invalid_argument(format!(
            "{} labels given for {} DAU tables",
            labels.len(),
            totals.len()
        )));
    }

    let days: Vec<u32> = totals
        .iter()
        .flat_map(|t| t.days.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows: Vec<Vec<u64>> = totals
        .iter()
        .map(|t| {
            let by_day: BTreeMap<u32, u64> = t.days.iter().copied().zip(t.values.iter().copied()).collect();
            days.iter().map(|d| by_day.get(d).copied().unwrap_or(0)).collect()
        })
        .collect();

    let labels = match labels {
        Some(labels) => labels.to_vec(),
        None => totals
            .iter()
            .map(|t| if t.label.is_empty() { DAU_LABEL.to_string() } else { t.label.clone() })
            .collect(),
    };

    Ok(CombinedDau { labels, days, rows })
}
