//! Upstream data providers.
//!
//! - BLS public API for the labor series (`bls`)
//! - Yahoo Finance chart API for the market series (`yahoo`)
//! - shared blocking HTTP helpers (`http`)

pub mod bls;
pub mod http;
pub mod yahoo;

pub use bls::BlsClient;
pub use yahoo::YahooClient;

use crate::domain::{FetchWindow, MarketBar, SeriesFrame};
use crate::error::AppError;

/// Source of the monthly labor series.
pub trait LaborSource {
    fn fetch_labor(&self, window: &FetchWindow) -> Result<SeriesFrame<f64>, AppError>;
}

/// Source of the monthly market series.
pub trait MarketSource {
    fn fetch_market(&self, window: &FetchWindow) -> Result<SeriesFrame<MarketBar>, AppError>;
}
