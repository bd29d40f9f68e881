//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fetch/align/render pipeline (or re-renders from CSV)
//! - prints the run summary

use std::time::Duration;

use clap::Parser;

use crate::cli::{ChartArgs, Command, OutputArgs, RenderArgs};
use crate::domain::{ChartOptions, HttpSettings, PipelineConfig};
use crate::error::AppError;

pub mod pipeline;

/// Upper bounds that keep the fetch window inside `chrono`'s date range.
const MAX_YEARS: u32 = 100;
const MAX_WINDOW_DAYS: u32 = 36_600;

/// Entry point for the `jobs` binary.
pub fn run() -> Result<(), AppError> {
    // `jobs` and `jobs --width 800` behave like `jobs chart ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Chart(args) => handle_chart(args),
        Command::Render(args) => handle_render(args),
    }
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args)?;
    let today = chrono::Local::now().date_naive();
    let run = pipeline::run_chart(&config, today)?;

    println!("{}", crate::report::format_run_summary(&run.frame, &run.artifact));
    if let Some(csv) = &run.csv {
        println!("CSV: {}", csv.display());
    }
    Ok(())
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let config = PipelineConfig {
        chart: chart_options_from_args(&args.output)?,
        csv_path: None,
        ..PipelineConfig::default()
    };
    let run = pipeline::render_from_csv(&args.csv, &config)?;
    println!("{}", crate::report::format_run_summary(&run.frame, &run.artifact));
    Ok(())
}

pub fn pipeline_config_from_args(args: &ChartArgs) -> Result<PipelineConfig, AppError> {
    if args.years == 0 || args.window_days == 0 {
        return Err(AppError::Config("--years and --window-days must be > 0".into()));
    }
    if args.years > MAX_YEARS || args.window_days > MAX_WINDOW_DAYS {
        return Err(AppError::Config(format!(
            "--years must be <= {MAX_YEARS} and --window-days <= {MAX_WINDOW_DAYS}"
        )));
    }
    if args.retries > 1 {
        return Err(AppError::Config("--retries must be 0 or 1".into()));
    }
    if args.timeout_secs == 0 {
        return Err(AppError::Config("--timeout-secs must be > 0".into()));
    }
    if args.series_id.trim().is_empty() || args.ticker.trim().is_empty() {
        return Err(AppError::Config("--series-id and --ticker must not be empty".into()));
    }

    Ok(PipelineConfig {
        series_id: args.series_id.trim().to_string(),
        ticker: args.ticker.trim().to_string(),
        years: args.years,
        window_days: args.window_days,
        http: HttpSettings {
            timeout: Duration::from_secs(args.timeout_secs),
            max_retries: args.retries,
            backoff: Duration::from_millis(args.backoff_ms),
        },
        chart: chart_options_from_args(&args.output)?,
        csv_path: (!args.no_csv).then(|| args.csv.clone()),
    })
}

fn chart_options_from_args(args: &OutputArgs) -> Result<ChartOptions, AppError> {
    let name = args.file_name.as_str();
    if std::path::Path::new(name).file_name() != Some(std::ffi::OsStr::new(name)) {
        return Err(AppError::Config(format!(
            "--file-name must be a bare file name, got '{name}'"
        )));
    }
    Ok(ChartOptions {
        output_dir: args.output_dir.clone(),
        file_name: args.file_name.clone(),
        width: args.width,
        height: args.height,
        font: args.font.clone(),
    })
}

/// Rewrite argv so `jobs` defaults to `jobs chart`.
///
/// Rules:
/// - `jobs`                      -> `jobs chart`
/// - `jobs --no-csv ...`         -> `jobs chart --no-csv ...`
/// - `jobs --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("chart".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "chart".to_string());
    }
    argv
}
