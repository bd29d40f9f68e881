//! Terminal summary of a pipeline run.
//!
//! Formatting lives here so the pipeline and chart code stay free of printing.

use crate::domain::{AlignedFrame, ChartArtifact};
use crate::plot::legend::{format_thousands, payroll_label};

/// Month-over-month payroll change (`latest - previous`), thousands of jobs.
pub fn payroll_change(frame: &AlignedFrame) -> Option<f64> {
    let mut recent = frame.most_recent(2);
    let latest = recent.next()?;
    let previous = recent.next()?;
    Some(latest.payroll - previous.payroll)
}

/// Format the run summary printed after a chart is produced.
pub fn format_run_summary(frame: &AlignedFrame, artifact: &ChartArtifact) -> String {
    let mut out = String::new();

    out.push_str("=== jobs - Nonfarm Payroll vs. S&P 500 ===\n");
    match (frame.first(), frame.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Rows: {} | months: {} .. {}\n", frame.len(), first.month, last.month));
        }
        _ => out.push_str("Rows: 0 (no overlapping months)\n"),
    }

    for row in frame.most_recent(2) {
        out.push_str(&format!("- {}\n", payroll_label(row)));
    }
    if let Some(change) = payroll_change(frame) {
        let sign = if change > 0.0 { "+" } else { "" };
        out.push_str(&format!("Change (m/m): {sign}{}k jobs\n", format_thousands(change)));
    }
    if let Some(last) = frame.last() {
        out.push_str(&format!(
            "Latest close: {:.2} ({})\n",
            last.market.close,
            last.month.short_label()
        ));
    }
    out.push_str(&format!("Chart: {}\n", artifact.path.display()));

    out
}
