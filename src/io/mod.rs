//! Input helpers.
//!
//! - delimited catalog ingest (`ingest`)

pub mod ingest;

pub use ingest::*;
