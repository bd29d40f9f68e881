//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - monthly keys and series (`MonthKey`, `SeriesFrame`, `MarketBar`)
//! - the joined result (`AlignedFrame`) and the rendered `ChartArtifact`
//! - run configuration (`PipelineConfig`, `ChartOptions`, `HttpSettings`)

pub mod types;

pub use types::*;
