//! CSV ingest.
//!
//! Three inputs are read from CSV files:
//!
//! - retention observations: `day,retention` (one row per measurement)
//! - cohort sizes: `size` (one row per acquisition day, in order)
//! - DAU totals: `day,dau` (as printed by `dau project --format csv`)
//!
//! Headers are matched case-insensitively, with a few aliases. Observation
//! rows that fail to parse are skipped and reported; cohort and DAU files are
//! strict because a missing row would shift every later day.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::cohort::DauTotal;
use crate::error::{ForecastError, ForecastResult};

const DAY_COLUMNS: &[&str] = &["day", "days", "x"];
const RETENTION_COLUMNS: &[&str] = &["retention", "y"];
const SIZE_COLUMNS: &[&str] = &["size", "users", "dnu"];
const DAU_COLUMNS: &[&str] = &["dau", "value"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Observations read from CSV, plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct IngestedObservations {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load `(day, retention)` observations. Range checks are left to
/// [`crate::domain::RetentionData::new`].
pub fn load_observations(path: &Path) -> ForecastResult<IngestedObservations> {
    let (header_map, records) = open_csv(path)?;
    let day_col = require_column(&header_map, DAY_COLUMNS)?;
    let retention_col = require_column(&header_map, RETENTION_COLUMNS)?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in records.into_iter().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let day = parse_f64(&record, day_col, "day")?;
                let retention = parse_f64(&record, retention_col, "retention")?;
                Ok((day, retention))
            });

        match parsed {
            Ok((day, retention)) => {
                x.push(day);
                y.push(retention);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if x.is_empty() {
        return Err(ForecastError::validation(format!(
            "no valid observation rows in '{}'",
            path.display()
        )));
    }

    Ok(IngestedObservations {
        x,
        y,
        row_errors,
        rows_read,
    })
}

/// Load cohort sizes, one per row, in acquisition order.
pub fn load_cohort_sizes(path: &Path) -> ForecastResult<Vec<u64>> {
    let (header_map, records) = open_csv(path)?;
    let size_col = require_column(&header_map, SIZE_COLUMNS)?;

    let mut sizes = Vec::new();
    for (idx, result) in records.into_iter().enumerate() {
        let record = result?;
        let size = parse_u64(&record, size_col, "size")
            .map_err(|e| ForecastError::invalid_argument(format!("line {}: {e}", idx + 2)))?;
        sizes.push(size);
    }
    Ok(sizes)
}

/// Load one DAU total row labelled `label`.
pub fn load_dau_total(path: &Path, label: &str) -> ForecastResult<DauTotal> {
    let (header_map, records) = open_csv(path)?;
    let day_col = require_column(&header_map, DAY_COLUMNS)?;
    let dau_col = require_column(&header_map, DAU_COLUMNS)?;

    let mut days = Vec::new();
    let mut values = Vec::new();
    for (idx, result) in records.into_iter().enumerate() {
        let record = result?;
        let line = idx + 2;
        let day = parse_u64(&record, day_col, "day")
            .and_then(|d| u32::try_from(d).map_err(|_| format!("day {d} is out of range")))
            .map_err(|e| ForecastError::invalid_argument(format!("line {line}: {e}")))?;
        let dau = parse_u64(&record, dau_col, "dau")
            .map_err(|e| ForecastError::invalid_argument(format!("line {line}: {e}")))?;
        days.push(day);
        values.push(dau);
    }
    DauTotal::new(label, days, values)
}

type Records = Vec<Result<StringRecord, csv::Error>>;

fn open_csv(path: &Path) -> ForecastResult<(HashMap<String, usize>, Records)> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let records = reader.records().collect();
    Ok((build_header_map(&headers), records))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, names: &[&str]) -> ForecastResult<usize> {
    names
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| ForecastError::validation(format!("missing required column: `{}`", names[0])))
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    match record.get(idx) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(format!("missing `{name}` value")),
    }
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = field(record, idx, name)?;
    raw.parse::<f64>()
        .map_err(|_| format!("invalid `{name}` value '{raw}'"))
}

fn parse_u64(record: &StringRecord, idx: usize, name: &str) -> Result<u64, String> {
    let raw = field(record, idx, name)?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid `{name}` value '{raw}' (expected a whole number)"))
}
