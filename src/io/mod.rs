//! Input/output helpers.
//!
//! - aligned frame CSV dump and reload (`export`)

pub mod export;

pub use export::*;
