//! Formatted terminal output for profiles and DAU tables.
//!
//! Formatting lives in one place so the fitting and projection code stays free
//! of presentation concerns. Tables label their columns with day numbers, or
//! with calendar dates when an anchor date (the date of day 1) is given.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::cohort::{AgeMode, AgedDauTable, CombinedDau, DauTotal, ForwardDauTable};
use crate::error::ForecastResult;
use crate::fit::RetentionProfile;
use crate::report::compute_residuals;

/// Projection rows shown before the listing is elided.
const PROJECTION_PREVIEW: usize = 30;

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ForecastResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format the profile summary (data stats, family diagnostics, selection,
/// collapsed points and projection).
pub fn format_profile_summary(profile: &RetentionProfile) -> String {
    let mut out = String::new();

    out.push_str("=== dau - Retention Profile ===\n");
    let (y_min, y_max) = min_max(profile.y());
    let (x_min, x_max) = min_max(profile.x());
    out.push_str(&format!(
        "Points: n={} | day=[{x_min}, {x_max}] | retention=[{y_min:.2}, {y_max:.2}]%\n",
        profile.x().len(),
    ));

    out.push_str("\nFamily diagnostics:\n");
    let selected = profile.curve().family();
    for (kind, params) in profile.params() {
        let chosen = if Some(*kind) == selected { "*" } else { " " };
        let sse = profile
            .errors()
            .get(kind)
            .map_or_else(|| "n/a".to_string(), |e| format!("{e:.3}"));
        out.push_str(&format!(
            "{chosen} {:<8} SSE={sse:<12} params={} {}\n",
            kind.name(),
            fmt_vec(params),
            kind.formula()
        ));
    }
    for (kind, reason) in profile.skipped() {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.name()));
    }

    out.push_str("\nSelection:\n");
    out.push_str(&format!("- requested: {}\n", profile.selected_form()));
    out.push_str(&format!("- best fit : {}\n", profile.best_fit()));
    out.push_str(&format!("- curve    : {}\n", profile.curve().name()));

    out.push_str("\nCollapsed points:\n");
    for (x, y) in profile.collapsed().x.iter().zip(&profile.collapsed().y) {
        out.push_str(&format!("  day {x:<6} {y:>7.2}%\n"));
    }

    let residuals = compute_residuals(profile);
    let rmse = if residuals.is_empty() {
        0.0
    } else {
        (residuals.iter().map(|r| r.residual * r.residual).sum::<f64>() / residuals.len() as f64).sqrt()
    };
    out.push_str(&format!("\nResidual RMSE: {rmse:.3}\n"));

    out.push_str("\nProjection:\n");
    out.push_str(&format!("{:>6} {:>10}\n", "day", "retention"));
    let rows: Vec<(u32, f64)> = profile.projection().with_day_zero().collect();
    for &(day, value) in rows.iter().take(PROJECTION_PREVIEW + 1) {
        out.push_str(&format!("{day:>6} {value:>9.2}%\n"));
    }
    if rows.len() > PROJECTION_PREVIEW + 1 {
        out.push_str(&format!("  ... ({} more days)\n", rows.len() - PROJECTION_PREVIEW - 1));
    }

    out
}

/// Format the forward-DAU table with its DNU and DAU summary rows.
pub fn format_forward_table(table: &ForwardDauTable, anchor: Option<NaiveDate>) -> String {
    let columns = column_headers(&table.column_labels(), anchor);
    let mut labels: Vec<String> = table
        .row_labels()
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let marker = if i >= table.known_cohorts() { "+" } else { "" };
            format!("{marker}{}", row_header(*day, anchor))
        })
        .collect();
    let mut rows: Vec<Vec<u64>> = table.rows().to_vec();

    labels.push("DNU".to_string());
    rows.push(table.new_users());
    labels.push("DAU".to_string());
    rows.push(table.totals());

    let mut out = String::from("=== Forward DAU (rows: cohort start; + = synthesized) ===\n");
    out.push_str(&render_grid("cohort", &labels, &columns, &rows));
    out
}

/// Format an aged-DAU table.
pub fn format_aged_table(table: &AgedDauTable, anchor: Option<NaiveDate>) -> String {
    let columns = column_headers(&table.column_labels(), anchor);
    let labels: Vec<String> = table.ages().iter().map(|a| a.to_string()).collect();
    let title = match table.mode() {
        AgeMode::AtLeast => "=== DAU by age (at least N days old) ===\n",
        AgeMode::Exact => "=== DAU by age (exactly N days old) ===\n",
    };
    let mut out = String::from(title);
    out.push_str(&render_grid("age", &labels, &columns, table.rows()));
    out
}

/// Format a combined DAU table.
pub fn format_combined(combined: &CombinedDau, anchor: Option<NaiveDate>) -> String {
    let columns = column_headers(combined.days(), anchor);
    let mut out = String::from("=== Combined DAU ===\n");
    out.push_str(&render_grid("label", combined.labels(), &columns, combined.rows()));
    out
}

/// `day,dau` CSV for a DAU total (the input format of `dau combine`).
pub fn format_dau_total_csv(total: &DauTotal) -> ForecastResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["day", "dau"])?;
    for (day, dau) in total.days().iter().zip(total.values()) {
        writer.write_record([day.to_string(), dau.to_string()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn render_grid<L: AsRef<str>>(corner: &str, labels: &[L], columns: &[String], rows: &[Vec<u64>]) -> String {
    let label_width = labels
        .iter()
        .map(|l| l.as_ref().chars().count())
        .chain(std::iter::once(corner.len()))
        .max()
        .unwrap_or(0);
    let cell_width = columns
        .iter()
        .map(String::len)
        .chain(rows.iter().flatten().map(|v| v.to_string().len()))
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    let mut line = format!("{corner:<label_width$}");
    for c in columns {
        line.push_str(&format!(" {c:>cell_width$}"));
    }
    out.push_str(line.trim_end());
    out.push('\n');

    out.push_str(&"-".repeat(label_width + columns.len() * (cell_width + 1)));
    out.push('\n');

    for (label, row) in labels.iter().zip(rows) {
        let mut line = format!("{:<label_width$}", label.as_ref());
        for v in row {
            line.push_str(&format!(" {v:>cell_width$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn column_headers(days: &[u32], anchor: Option<NaiveDate>) -> Vec<String> {
    days.iter().map(|&d| row_header(d, anchor)).collect()
}

fn row_header(day: u32, anchor: Option<NaiveDate>) -> String {
    anchor
        .and_then(|a| date_for(a, day.saturating_sub(1)))
        .map_or_else(|| day.to_string(), |d| d.format("%m-%d").to_string())
}

/// Calendar date `offset` days after `anchor`.
fn date_for(anchor: NaiveDate, offset: u32) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(u64::from(offset)))
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
