//! Command-line parsing for the payroll chart tool.
//!
//! Parsing and dispatch stay separate from the fetch/align/render code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "jobs", version, about = "U.S. Nonfarm Payroll vs. S&P 500 chart")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch both series, align them by month, and render the chart.
    Chart(ChartArgs),
    /// Re-render the chart from a CSV dump written by `jobs chart`.
    Render(RenderArgs),
}

/// Options for fetching and rendering.
#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// BLS series identifier.
    #[arg(long, env = "JOBS_SERIES_ID", default_value = "CES0000000001")]
    pub series_id: String,

    /// Market ticker symbol.
    #[arg(long, env = "JOBS_TICKER", default_value = "^GSPC")]
    pub ticker: String,

    /// Years of labor data before the current year.
    #[arg(long, default_value_t = 10)]
    pub years: u32,

    /// Days of market data before today.
    #[arg(long, default_value_t = 3650)]
    pub window_days: u32,

    /// Write the aligned frame to this CSV file.
    #[arg(long, env = "JOBS_CSV", default_value = "bls_jobs_data.csv")]
    pub csv: PathBuf,

    /// Skip the CSV dump.
    #[arg(long)]
    pub no_csv: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Extra attempt for connection/timeout failures (0 or 1).
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Delay before a retry, in milliseconds (multiplied by the attempt number).
    #[arg(long, default_value_t = 500)]
    pub backoff_ms: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for re-rendering a saved frame.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// CSV file produced by `jobs chart`.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Chart output options shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Directory the chart is written to (created if missing).
    #[arg(long, env = "JOBS_OUTPUT_DIR", default_value = "static")]
    pub output_dir: PathBuf,

    /// Chart file name (PNG).
    #[arg(long, default_value = "bls_jobs_plot.png")]
    pub file_name: String,

    /// Image width in pixels.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 700)]
    pub height: u32,

    /// TTF font for chart text (system fonts are searched when omitted).
    #[arg(long, env = "JOBS_FONT")]
    pub font: Option<PathBuf>,
}
