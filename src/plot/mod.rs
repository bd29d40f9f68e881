//! Chart rendering.
//!
//! - PNG chart drawing with Plotters (`chart`)
//! - legend text and number formatting (`legend`)
//! - runtime font registration (`font`)

pub mod chart;
pub mod font;
pub mod legend;

pub use chart::{ChartLayout, render};
pub use legend::{format_thousands, recent_payroll_labels};
