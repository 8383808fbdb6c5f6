//! `omori-fit` library crate.
//!
//! The binary (`omori`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the preparation and fitting steps are reusable on in-memory catalogs
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod prepare;
pub mod report;
