//! Reporting utilities: run summary, decay interpretation, series table.
//!
//! Formatting lives here so the preparation and fitting code stay free of
//! presentation concerns.

pub mod format;

pub use format::*;
