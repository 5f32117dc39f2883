//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - builds the retention profile and DAU projections
//! - prints reports in the requested format

use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{AgedArgs, CombineArgs, Command, FitArgs, OutputFormat, ProjectArgs, SampleArgs};
use crate::cohort::{combine, project_aged_dau, project_cohorted_dau};
use crate::error::{AppError, ForecastError};

pub mod pipeline;

/// Entry point for the `dau` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Project(args) => handle_project(args),
        Command::Aged(args) => handle_aged(args),
        Command::Combine(args) => handle_combine(args),
        Command::Sample(args) => handle_sample(args),
    }
}

/// Logs go to stderr so stdout stays clean for tables, JSON and CSV.
/// `RUST_LOG` overrides the default `warn` filter.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let profile = pipeline::build_profile(&args.profile)?;

    match args.format {
        OutputFormat::Text => println!("{}", crate::report::format_profile_summary(&profile)),
        OutputFormat::Json => println!("{}", crate::report::to_json(&profile)?),
        OutputFormat::Csv => return Err(csv_unsupported("fit")),
    }
    Ok(())
}

fn handle_project(args: ProjectArgs) -> Result<(), AppError> {
    let target = pipeline::target_config(args.dau_target, args.target_timeline)?;
    let cohorts = pipeline::resolve_cohorts(&args.cohorts)?;
    let profile = pipeline::build_profile(&args.profile)?;
    let config = pipeline::projection_config(&args.cohorts);

    let table = project_cohorted_dau(&profile, &cohorts, config, target)?;
    info!(
        cohorts = table.rows().len(),
        synthesized = table.rows().len() - table.known_cohorts(),
        periods = table.periods(),
        "projected forward DAU"
    );

    match args.format {
        OutputFormat::Text => println!(
            "{}",
            crate::report::format_forward_table(&table, args.cohorts.anchor_date)
        ),
        OutputFormat::Json => println!("{}", crate::report::to_json(&table)?),
        OutputFormat::Csv => print!("{}", crate::report::format_dau_total_csv(&table.total())?),
    }
    Ok(())
}

fn handle_aged(args: AgedArgs) -> Result<(), AppError> {
    let cohorts = pipeline::resolve_cohorts(&args.cohorts)?;
    let profile = pipeline::build_profile(&args.profile)?;
    let config = pipeline::projection_config(&args.cohorts);

    let table = project_aged_dau(&profile, &cohorts, config, &args.ages, args.mode)?;

    match args.format {
        OutputFormat::Text => println!(
            "{}",
            crate::report::format_aged_table(&table, args.cohorts.anchor_date)
        ),
        OutputFormat::Json => println!("{}", crate::report::to_json(&table)?),
        OutputFormat::Csv => return Err(csv_unsupported("aged")),
    }
    Ok(())
}

fn handle_combine(args: CombineArgs) -> Result<(), AppError> {
    let totals = args
        .files
        .iter()
        .map(|path| crate::io::load_dau_total(path, &file_label(path)))
        .collect::<Result<Vec<_>, _>>()?;
    let labels = (!args.labels.is_empty()).then_some(args.labels.as_slice());

    let combined = combine(&totals, labels)?;

    match args.format {
        OutputFormat::Text => println!("{}", crate::report::format_combined(&combined, args.anchor_date)),
        OutputFormat::Json => println!("{}", crate::report::to_json(&combined)?),
        OutputFormat::Csv => return Err(csv_unsupported("combine")),
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = pipeline::sample_config(&args);
    let sample = crate::data::generate_sample(&config)?;
    info!(
        family = %config.family,
        points = sample.stats.n_points,
        y_min = sample.stats.y_min,
        y_max = sample.stats.y_max,
        "generated sample observations"
    );

    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer
        .write_record(["day", "retention"])
        .map_err(ForecastError::from)?;
    for (day, retention) in sample.x.iter().zip(&sample.y) {
        writer
            .write_record([day.to_string(), format!("{retention:.4}")])
            .map_err(ForecastError::from)?;
    }
    writer.flush().map_err(ForecastError::from)?;
    Ok(())
}

/// Default row label for a DAU file: its file stem.
fn file_label(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::cohort::DAU_LABEL.to_string())
}

fn csv_unsupported(command: &str) -> AppError {
    ForecastError::invalid_argument(format!(
        "`--format csv` is only available for `dau project` (got `dau {command}`)"
    ))
    .into()
}
