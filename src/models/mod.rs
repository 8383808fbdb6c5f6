//! Decay model implementation.
//!
//! The model is a small set of pure functions so the solver and the plotting
//! code can share them.

pub mod model;

pub use model::*;
