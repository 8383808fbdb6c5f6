//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog events and the derived mainshock (`SeismicEvent`, `Mainshock`)
//! - the daily count series fed to the fitter (`DailyCountSeries`)
//! - Omori parameters, bounds and fit outcomes (`OmoriParams`, `FitOutcome`)
//! - run configuration (`AnalysisConfig`, `SimulationConfig`)

pub mod types;

pub use types::*;
