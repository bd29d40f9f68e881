//! `jobs-chart` library crate.
//!
//! The binary (`jobs`) is a thin wrapper around this library so that:
//!
//! - the fetch/align/render pipeline is testable without spawning processes
//! - a different front end (e.g. a web handler) can call the same pipeline

pub mod align;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
