//! Shared fetch -> align -> render pipeline.
//!
//! Front ends call [`run_chart`]; tests drive [`run_with_sources`] with
//! in-memory sources.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::align::align;
use crate::data::{BlsClient, LaborSource, MarketSource, YahooClient};
use crate::domain::{AlignedFrame, ChartArtifact, PipelineConfig};
use crate::error::AppError;

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub frame: AlignedFrame,
    pub artifact: ChartArtifact,
    pub csv: Option<PathBuf>,
}

/// Fetch both series for the trailing window ending at `today`, then align and render.
///
/// The credential is checked before any request is made.
pub fn run_chart(config: &PipelineConfig, today: NaiveDate) -> Result<RunOutput, AppError> {
    let labor = BlsClient::from_env(&config.series_id, config.http)?;
    let market = YahooClient::new(&config.ticker, config.http)?;
    run_with_sources(&labor, &market, config, today)
}

/// Run the pipeline against arbitrary sources.
pub fn run_with_sources(
    labor: &dyn LaborSource,
    market: &dyn MarketSource,
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<RunOutput, AppError> {
    let window = config.window(today);
    info!(%today, start_year = window.start_year, "pipeline started");

    // 1) Fetch, labor first so a rejected key stops the run before the market call.
    let labor_frame = labor.fetch_labor(&window)?;
    let market_frame = market.fetch_market(&window)?;

    // 2) Inner join on month.
    let frame = align(&labor_frame, &market_frame);

    // 3) Optional CSV dump, then the chart.
    if let Some(path) = &config.csv_path {
        crate::io::write_frame_csv(path, &frame)?;
    }
    let artifact = crate::plot::render(&frame, &config.chart)?;

    Ok(RunOutput {
        frame,
        artifact,
        csv: config.csv_path.clone(),
    })
}

/// Redraw a chart from a CSV dump; no network access.
pub fn render_from_csv(csv: &std::path::Path, config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let frame = crate::io::read_frame_csv(csv)?;
    info!(path = %csv.display(), rows = frame.len(), "frame loaded");
    let artifact = crate::plot::render(&frame, &config.chart)?;
    Ok(RunOutput {
        frame,
        artifact,
        csv: Some(csv.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::domain::{ChartOptions, FetchWindow, MarketBar, MonthKey, MonthlyObservation, SeriesFrame};

    struct StubLabor {
        calls: Cell<usize>,
        result: fn() -> Result<SeriesFrame<f64>, AppError>,
    }

    impl LaborSource for StubLabor {
        fn fetch_labor(&self, _window: &FetchWindow) -> Result<SeriesFrame<f64>, AppError> {
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    struct StubMarket {
        calls: Cell<usize>,
        last_month: (i32, u32),
    }

    impl MarketSource for StubMarket {
        fn fetch_market(&self, _window: &FetchWindow) -> Result<SeriesFrame<MarketBar>, AppError> {
            self.calls.set(self.calls.get() + 1);
            let end = MonthKey::new(self.last_month.0, self.last_month.1).unwrap().ordinal();
            let start = MonthKey::new(2015, 1).unwrap().ordinal();
            let obs = (start..=end)
                .map(|o| {
                    let close = 2_000.0 + (o - start) as f64 * 30.0;
                    MonthlyObservation::new(
                        MonthKey::from_ordinal(o).unwrap(),
                        MarketBar {
                            open: close - 15.0,
                            high: close + 40.0,
                            low: close - 40.0,
                            close,
                            volume: 3_500_000_000,
                        },
                    )
                })
                .collect();
            Ok(SeriesFrame::new("^GSPC", obs))
        }
    }

    fn decade_of_payrolls() -> Result<SeriesFrame<f64>, AppError> {
        let obs = (2015..=2024)
            .flat_map(|y| (1..=12).map(move |m| (y, m)))
            .enumerate()
            .map(|(i, (y, m))| {
                MonthlyObservation::new(MonthKey::new(y, m).unwrap(), 140_000.0 + i as f64 * 150.0)
            })
            .collect();
        Ok(SeriesFrame::new("CES0000000001", obs))
    }

    fn rejected_key() -> Result<SeriesFrame<f64>, AppError> {
        Err(AppError::UpstreamRequest {
            provider: "BLS",
            message: "invalid key".into(),
        })
    }

    fn config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            chart: ChartOptions {
                output_dir: dir.join("static"),
                width: 800,
                height: 480,
                ..ChartOptions::default()
            },
            csv_path: Some(dir.join("bls_jobs_data.csv")),
            ..PipelineConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn end_to_end_drops_unmatched_final_month() {
        let dir = tempfile::tempdir().unwrap();
        let labor = StubLabor {
            calls: Cell::new(0),
            result: decade_of_payrolls,
        };
        let market = StubMarket {
            calls: Cell::new(0),
            last_month: (2024, 11),
        };

        let out = run_with_sources(&labor, &market, &config(dir.path()), today()).unwrap();

        assert_eq!(out.frame.len(), 119);
        assert_eq!(out.frame.last().unwrap().month, MonthKey::new(2024, 11).unwrap());
        assert!(out.artifact.path.is_file());
        assert_eq!(out.artifact.path, dir.path().join("static/bls_jobs_plot.png"));

        let csv = out.csv.unwrap();
        let reloaded = crate::io::read_frame_csv(&csv).unwrap();
        assert_eq!(reloaded, out.frame);
        assert_eq!(labor.calls.get(), 1);
        assert_eq!(market.calls.get(), 1);
    }

    #[test]
    fn labor_failure_skips_market_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let labor = StubLabor {
            calls: Cell::new(0),
            result: rejected_key,
        };
        let market = StubMarket {
            calls: Cell::new(0),
            last_month: (2024, 12),
        };

        let err = run_with_sources(&labor, &market, &config(dir.path()), today()).unwrap_err();
        assert!(matches!(err, AppError::UpstreamRequest { .. }));
        assert_eq!(market.calls.get(), 0);
        assert!(!dir.path().join("static/bls_jobs_plot.png").exists());
    }

    #[test]
    fn rerender_from_csv_dump() {
        let dir = tempfile::tempdir().unwrap();
        let labor = StubLabor {
            calls: Cell::new(0),
            result: decade_of_payrolls,
        };
        let market = StubMarket {
            calls: Cell::new(0),
            last_month: (2024, 12),
        };
        let cfg = config(dir.path());
        let first = run_with_sources(&labor, &market, &cfg, today()).unwrap();
        std::fs::remove_file(&first.artifact.path).unwrap();

        let again = render_from_csv(first.csv.as_deref().unwrap(), &cfg).unwrap();
        assert_eq!(again.frame.len(), 120);
        assert!(again.artifact.path.is_file());
    }
}
