//! Shared domain types.
//!
//! Everything here is plain data: catalog events, the derived mainshock and
//! daily count series, Omori parameters, and the configuration the pipeline
//! runs with.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Completeness threshold used when none is configured.
pub const DEFAULT_MIN_MAGNITUDE: f64 = 2.0;

/// Catalog path used when neither `--file` nor `OMORI_CATALOG` is given.
pub const DEFAULT_CATALOG_PATH: &str = "data/italy_earthquakes_from_2016-08-24_to_2016-11-30.csv";

/// Default solver evaluation budget.
pub const DEFAULT_MAX_EVALUATIONS: usize = 10_000;

/// One row of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SeismicEvent {
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Hypocentral depth in km.
    pub depth_km: Option<f64>,
    /// May be zero or negative for micro-events.
    pub magnitude: f64,
}

/// The largest event of the catalog together with its catalog position.
///
/// `index` is what identifies the mainshock record; two events with identical
/// timestamp and magnitude are still different records.
#[derive(Debug, Clone, PartialEq)]
pub struct Mainshock {
    pub index: usize,
    pub event: SeismicEvent,
}

impl Mainshock {
    pub fn time(&self) -> DateTime<Utc> {
        self.event.timestamp
    }

    pub fn magnitude(&self) -> f64 {
        self.event.magnitude
    }
}

/// Events that qualify as aftershocks of a given mainshock.
#[derive(Debug, Clone, Default)]
pub struct AftershockSubset {
    pub events: Vec<SeismicEvent>,
}

impl AftershockSubset {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One non-empty 24-hour bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyCount {
    /// Bucket start in days after the mainshock, shifted by +1 (first bucket = 1.0).
    pub elapsed_days: f64,
    pub count: u64,
}

/// Mainshock-anchored daily aftershock counts, zero-count days removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyCountSeries {
    pub points: Vec<DailyCount>,
}

impl DailyCountSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn t_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.elapsed_days).collect()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.count as f64).collect()
    }

    /// `(min t, max t)` of the series, if non-empty.
    pub fn t_range(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some((first.elapsed_days, last.elapsed_days))
    }

    pub fn total_events(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }
}

/// Modified Omori law parameters: `rate(t) = K / (t + c)^p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OmoriParams {
    /// Activity scale.
    pub k: f64,
    /// Time offset (days).
    pub c: f64,
    /// Decay exponent.
    pub p: f64,
}

impl OmoriParams {
    pub const fn new(k: f64, c: f64, p: f64) -> Self {
        Self { k, c, p }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.k, self.c, self.p]
    }

    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [k, c, p] => Some(Self::new(*k, *c, *p)),
            _ => None,
        }
    }
}

impl Default for OmoriParams {
    fn default() -> Self {
        Self::new(1000.0, 1.0, 1.0)
    }
}

/// Inclusive per-parameter box constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    pub k: (f64, f64),
    pub c: (f64, f64),
    pub p: (f64, f64),
}

impl ParamBounds {
    pub fn lower(&self) -> [f64; 3] {
        [self.k.0, self.c.0, self.p.0]
    }

    pub fn upper(&self) -> [f64; 3] {
        [self.k.1, self.c.1, self.p.1]
    }

    #[cfg(test)]
    pub fn contains(&self, params: &OmoriParams) -> bool {
        let within = |v: f64, (lo, hi): (f64, f64)| v >= lo && v <= hi;
        within(params.k, self.k) && within(params.c, self.c) && within(params.p, self.p)
    }
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            k: (0.1, 50_000.0),
            c: (0.0, 15.0),
            p: (0.5, 3.0),
        }
    }
}

/// Solver inputs for a single Omori fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub initial_guess: OmoriParams,
    pub bounds: ParamBounds,
    pub max_evaluations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_guess: OmoriParams::default(),
            bounds: ParamBounds::default(),
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

impl FitOptions {
    /// Reject configurations the solver could never honour.
    ///
    /// After this passes, the initial guess lies inside the bounds, so a
    /// fallback result is always inside the box too.
    pub fn validate(&self) -> Result<(), AppError> {
        let named = [
            ("K", self.initial_guess.k, self.bounds.k),
            ("c", self.initial_guess.c, self.bounds.c),
            ("p", self.initial_guess.p, self.bounds.p),
        ];
        for (name, guess, (lo, hi)) in named {
            if !(guess.is_finite() && lo.is_finite() && hi.is_finite()) {
                return Err(AppError::new(
                    2,
                    format!("Invalid {name} settings: guess and bounds must be finite."),
                ));
            }
            if lo > hi {
                return Err(AppError::new(
                    2,
                    format!("Invalid {name} bounds: lower {lo} > upper {hi}."),
                ));
            }
            if guess < lo || guess > hi {
                return Err(AppError::new(
                    2,
                    format!("Initial {name}={guess} lies outside its bounds [{lo}, {hi}]."),
                ));
            }
        }
        if self.max_evaluations == 0 {
            return Err(AppError::new(2, "Max evaluations must be > 0."));
        }
        Ok(())
    }
}

/// Result of a fit attempt.
///
/// A failed solve is not an error for the pipeline: it degrades to the initial
/// guess with R² = 0.0, and the variant records why.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Converged {
        params: OmoriParams,
        r_squared: f64,
        evaluations: usize,
    },
    Fallback {
        params: OmoriParams,
        reason: String,
    },
}

impl FitOutcome {
    pub fn params(&self) -> OmoriParams {
        match self {
            FitOutcome::Converged { params, .. } | FitOutcome::Fallback { params, .. } => *params,
        }
    }

    pub fn r_squared(&self) -> f64 {
        match self {
            FitOutcome::Converged { r_squared, .. } => *r_squared,
            FitOutcome::Fallback { .. } => 0.0,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, FitOutcome::Converged { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            FitOutcome::Converged { .. } => None,
            FitOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// A full `omori fit` run configuration, derived from CLI flags plus defaults.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub catalog_path: PathBuf,
    pub delimiter: u8,
    pub min_magnitude: f64,
    pub fit: FitOptions,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub log_y: bool,
    pub svg_path: Option<PathBuf>,
    pub show_table: bool,
}

/// Parameters for generating a synthetic catalog.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub output: PathBuf,
    pub seed: u64,
    pub mainshock_time: DateTime<Utc>,
    pub mainshock_magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    /// True Omori parameters; `t` in days since the mainshock.
    pub params: OmoriParams,
    pub duration_days: f64,
    pub min_magnitude: f64,
    pub b_value: f64,
    pub background_events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        FitOptions::default().validate().unwrap();
    }

    #[test]
    fn guess_outside_bounds_is_rejected() {
        let opts = FitOptions {
            initial_guess: OmoriParams::new(1000.0, 20.0, 1.0),
            ..FitOptions::default()
        };
        let err = opts.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("c=20"));
    }

    #[test]
    fn fallback_reports_zero_r_squared() {
        let outcome = FitOutcome::Fallback {
            params: OmoriParams::default(),
            reason: "x".to_string(),
        };
        assert_eq!(outcome.r_squared(), 0.0);
        assert!(!outcome.is_converged());
        assert_eq!(outcome.params(), OmoriParams::default());
    }
}
