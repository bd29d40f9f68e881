//! Legend text for the payroll chart.

use crate::domain::{AlignedFrame, AlignedRow};

pub const PAYROLL_LABEL: &str = "Nonfarm Payroll";
pub const MARKET_LABEL: &str = "S&P 500";

/// Text-only legend entries for the two most recent payroll observations.
///
/// Newest first. Empty unless the frame has at least two rows.
pub fn recent_payroll_labels(frame: &AlignedFrame) -> Vec<String> {
    if frame.len() < 2 {
        return Vec::new();
    }
    frame.most_recent(2).map(payroll_label).collect()
}

/// `Dec 2024: Nonfarm Payroll 159,069`
pub fn payroll_label(row: &AlignedRow) -> String {
    format!(
        "{}: {PAYROLL_LABEL} {}",
        row.month.short_label(),
        format_thousands(row.payroll)
    )
}

/// Round to an integer and group digits by thousands (`1234567.6` -> `1,234,568`).
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value.is_sign_negative() && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}
