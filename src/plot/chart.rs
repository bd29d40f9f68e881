//! Dual-axis PNG chart: payroll on the left axis, market close on the right.
//!
//! Layout (ranges, grid positions) is computed from the frame up front so the
//! drawing code never indexes into rows it has not checked for.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use plotters::prelude::*;
use plotters::style::{FontStyle, FontTransform};
use tracing::info;

use crate::domain::{AlignedFrame, ChartArtifact, ChartOptions, MonthKey};
use crate::error::AppError;
use crate::plot::font::{self, FAMILY};
use crate::plot::legend::{MARKET_LABEL, PAYROLL_LABEL, format_thousands, recent_payroll_labels};

pub const TITLE: &str = "U.S. Nonfarm Payroll vs. S&P 500";

const PAYROLL_COLOR: RGBColor = RGBColor(0x00, 0x00, 0x8B);
const MARKET_COLOR: RGBColor = RGBColor(0x00, 0x64, 0x00);

const MIN_WIDTH: u32 = 320;
const MIN_HEIGHT: u32 = 240;

/// Axis ranges and gridline positions for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// Month ordinals (see [`MonthKey::ordinal`]).
    pub x: (f64, f64),
    pub payroll: (f64, f64),
    pub close: (f64, f64),
    pub x_labels: usize,
    pub x_grid: Vec<f64>,
    pub y_grid: Vec<f64>,
}

impl ChartLayout {
    pub fn from_frame(frame: &AlignedFrame) -> Self {
        let x = match (frame.first(), frame.last()) {
            (Some(first), Some(last)) if first.month != last.month => {
                (first.month.ordinal() as f64, last.month.ordinal() as f64)
            }
            (Some(only), _) => {
                let o = only.month.ordinal() as f64;
                (o - 1.0, o + 1.0)
            }
            _ => (0.0, 1.0),
        };

        let payroll = value_range(frame.rows().iter().map(|r| r.payroll));
        let close = value_range(frame.rows().iter().map(|r| r.market.close));

        let span = (x.1 - x.0).round() as usize;
        let x_labels = if frame.is_empty() { 0 } else { (span / 6).clamp(2, 20) };

        Self {
            x,
            payroll,
            close,
            x_labels,
            x_grid: if frame.is_empty() { Vec::new() } else { month_grid(x) },
            y_grid: even_grid(payroll, 6),
        }
    }
}

/// Padded `(min, max)` over the finite values; `(0, 1)` when there are none.
pub fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        (lo.abs() * 0.05).max(1.0)
    };
    (lo - pad, hi + pad)
}

/// Vertical gridlines on January boundaries, or on every month for short spans.
fn month_grid((x0, x1): (f64, f64)) -> Vec<f64> {
    let first = x0.ceil() as i32;
    let last = x1.floor() as i32;
    let januaries: Vec<f64> = (first..=last)
        .filter(|o| o.rem_euclid(12) == 0)
        .map(f64::from)
        .collect();
    if januaries.len() >= 2 {
        januaries
    } else {
        (first..=last).map(f64::from).collect()
    }
}

fn even_grid((lo, hi): (f64, f64), n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n + 1) as f64;
    (1..=n).map(|i| lo + step * i as f64).collect()
}

/// Split the segment `a -> b` into `n` dashes with equal gaps between them.
pub fn dashes(a: (f64, f64), b: (f64, f64), n: usize) -> Vec<[(f64, f64); 2]> {
    let pieces = (2 * n).saturating_sub(1).max(1);
    let at = |k: usize| {
        let t = k as f64 / pieces as f64;
        (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
    };
    (0..pieces).step_by(2).map(|k| [at(k), at(k + 1)]).collect()
}

static RENDER_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = RENDER_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// `static/.bls_jobs_plot.partial.png` for `static/bls_jobs_plot.png`.
fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{stem}.partial.png"))
}

/// Render the frame to `options.output_path()`.
///
/// The output directory is created if needed. Renders targeting the same path
/// are serialized, and the image is written beside the target and renamed into
/// place so readers never observe a partial file.
pub fn render(frame: &AlignedFrame, options: &ChartOptions) -> Result<ChartArtifact, AppError> {
    let path = options.output_path();
    if Path::new(&options.file_name).file_name() != Some(std::ffi::OsStr::new(&options.file_name)) {
        return Err(AppError::render(path, "chart file name must not contain a directory"));
    }
    let is_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !is_png {
        return Err(AppError::render(path, "chart file name must end in .png"));
    }
    if options.width < MIN_WIDTH || options.height < MIN_HEIGHT {
        return Err(AppError::render(
            path,
            format!("chart size must be at least {MIN_WIDTH}x{MIN_HEIGHT}"),
        ));
    }

    let lock = path_lock(&path);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    std::fs::create_dir_all(&options.output_dir).map_err(|e| {
        AppError::render(
            path.clone(),
            format!("failed to create '{}': {e}", options.output_dir.display()),
        )
    })?;

    let with_text = font::ensure_registered(options.font.as_deref());
    let partial = partial_path(&path);
    if let Err(e) = draw(frame, &partial, options, with_text) {
        std::fs::remove_file(&partial).ok();
        return Err(AppError::render(path, e));
    }
    std::fs::rename(&partial, &path).map_err(|e| AppError::render(path.clone(), e))?;

    info!(path = %path.display(), rows = frame.len(), "chart rendered");
    Ok(ChartArtifact {
        path,
        file_name: options.file_name.clone(),
    })
}

fn draw(
    frame: &AlignedFrame,
    path: &Path,
    options: &ChartOptions,
    with_text: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let layout = ChartLayout::from_frame(frame);
    let (x0, x1) = layout.x;
    let (y0, y1) = layout.payroll;
    let (z0, z1) = layout.close;

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (label_x, label_y) = if with_text { (90, 100) } else { (10, 10) };
    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .x_label_area_size(label_x)
        .y_label_area_size(label_y)
        .right_y_label_area_size(label_y);
    if with_text {
        builder.caption(TITLE, (FAMILY, 28).into_font().style(FontStyle::Bold));
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)?
        .set_secondary_coord(x0..x1, z0..z1);

    let fmt_month = |v: &f64| {
        MonthKey::from_ordinal(v.round() as i32)
            .map(MonthKey::short_label)
            .unwrap_or_default()
    };
    let fmt_payroll = |v: &f64| format_thousands(*v);
    let fmt_close = |v: &f64| format_thousands(*v);

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh().disable_y_mesh().axis_style(&BLACK);
        if with_text {
            mesh.x_labels(layout.x_labels)
                .y_labels(8)
                .x_label_formatter(&fmt_month)
                .y_label_formatter(&fmt_payroll)
                .x_label_style((FAMILY, 13).into_font().transform(FontTransform::Rotate90))
                .y_label_style((FAMILY, 13).into_font().color(&PAYROLL_COLOR))
                .x_desc("Date")
                .y_desc("Jobs (Thousands)")
                .axis_desc_style((FAMILY, 16).into_font().style(FontStyle::Bold));
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
    }

    {
        let mut secondary = chart.configure_secondary_axes();
        secondary.axis_style(&BLACK).x_labels(0);
        if with_text {
            secondary
                .y_labels(8)
                .y_label_formatter(&fmt_close)
                .label_style((FAMILY, 13).into_font().color(&MARKET_COLOR))
                .y_desc("S&P 500 Close")
                .axis_desc_style((FAMILY, 16).into_font().style(FontStyle::Bold));
        } else {
            secondary.y_labels(0);
        }
        secondary.draw()?;
    }

    // Dashed gridlines at half opacity, in primary coordinates.
    let grid = BLACK.mix(0.5).stroke_width(1);
    let mut segments = Vec::new();
    for &x in &layout.x_grid {
        segments.extend(dashes((x, y0), (x, y1), 40));
    }
    for &y in &layout.y_grid {
        segments.extend(dashes((x0, y), (x1, y), 80));
    }
    chart.draw_series(
        segments
            .into_iter()
            .map(|[a, b]| PathElement::new(vec![a, b], grid)),
    )?;

    chart
        .draw_series(LineSeries::new(
            frame
                .rows()
                .iter()
                .filter(|r| r.payroll.is_finite())
                .map(|r| (r.month.ordinal() as f64, r.payroll)),
            PAYROLL_COLOR.stroke_width(2),
        ))?
        .label(PAYROLL_LABEL)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PAYROLL_COLOR.stroke_width(2)));

    chart
        .draw_secondary_series(LineSeries::new(
            frame
                .rows()
                .iter()
                .filter(|r| r.market.close.is_finite())
                .map(|r| (r.month.ordinal() as f64, r.market.close)),
            MARKET_COLOR.stroke_width(2),
        ))?
        .label(MARKET_LABEL)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MARKET_COLOR.stroke_width(2)));

    if with_text {
        // Text-only entries: a label with no legend marker.
        for label in recent_payroll_labels(frame) {
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(label);
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((FAMILY, 14))
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
