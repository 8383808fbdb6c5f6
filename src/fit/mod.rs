//! Curve fitting.
//!
//! Responsibilities:
//!
//! - fit the modified Omori law to a daily count series (bounded LM)
//! - score the fit with R²
//! - degrade to the initial guess when the solver fails

pub mod fitter;

pub use fitter::*;
