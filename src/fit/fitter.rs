//! Omori law fitting.
//!
//! Given the daily count series `(t_i, N_i)` we minimize
//!
//! ```text
//! Σ (N_i − K / (t_i + c)^p)²
//! ```
//!
//! inside the configured box with the bounded Levenberg–Marquardt solver, then
//! score the result with R².
//!
//! A failed solve never aborts the run. It becomes `FitOutcome::Fallback`
//! carrying the initial guess, and the report/plot still render (with R² = 0).

use thiserror::Error;

use crate::domain::{DailyCountSeries, FitOptions, FitOutcome, OmoriParams};
use crate::math::{LmOptions, SolverError, curve_fit};
use crate::models::{PARAM_COUNT, fill_jacobian_row, omori_rate, predict};

/// Reasons a fit degrades to the fallback parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error("R² is undefined: observed counts have zero variance and the model does not match them")]
    UndefinedRSquared,

    #[error("observed and time arrays differ in length ({t} vs {n})")]
    LengthMismatch { t: usize, n: usize },

    #[error("nothing to score: empty series")]
    Empty,
}

/// Fit the modified Omori law to `series`.
///
/// Never fails: any solver or scoring error yields `FitOutcome::Fallback` with
/// `options.initial_guess`. Callers are expected to have run
/// `FitOptions::validate`, which keeps that guess inside the bounds.
pub fn fit(series: &DailyCountSeries, options: &FitOptions) -> FitOutcome {
    match try_fit(series, options) {
        Ok((params, r_squared, evaluations)) => {
            log::info!(
                "omori fit converged after {evaluations} evaluations: K={:.3} c={:.4} p={:.4} R²={r_squared:.4}",
                params.k,
                params.c,
                params.p
            );
            FitOutcome::Converged {
                params,
                r_squared,
                evaluations,
            }
        }
        Err(err) => {
            log::warn!("Omori fit failed ({err}); falling back to the initial guess with R² = 0");
            FitOutcome::Fallback {
                params: options.initial_guess,
                reason: err.to_string(),
            }
        }
    }
}

fn try_fit(series: &DailyCountSeries, options: &FitOptions) -> Result<(OmoriParams, f64, usize), FitError> {
    let t_obs = series.t_values();
    let n_obs = series.counts();

    let lm_opts = LmOptions {
        max_evaluations: options.max_evaluations,
        ..LmOptions::default()
    };
    let report = curve_fit(
        &t_obs,
        &n_obs,
        &options.initial_guess.to_array(),
        &options.bounds.lower(),
        &options.bounds.upper(),
        predict,
        fill_jacobian_row,
        &lm_opts,
    )?;
    log::debug!(
        "lm finished: {} iteration(s), {} evaluation(s), cost={:.6e}",
        report.iterations,
        report.evaluations,
        report.cost
    );

    let params = OmoriParams::from_slice(&report.params).ok_or_else(|| {
        FitError::Solver(SolverError::InvalidInput(format!(
            "expected {PARAM_COUNT} parameters, got {}",
            report.params.len()
        )))
    })?;
    let r_squared = goodness_of_fit(&t_obs, &n_obs, &params)?;
    Ok((params, r_squared, report.evaluations))
}

/// Coefficient of determination of the Omori curve against observed counts.
///
/// `R² = 1 − SS_res / SS_tot`. When every observation is identical
/// (`SS_tot = 0`) the ratio is undefined: a perfect match scores 1.0, anything
/// else is `FitError::UndefinedRSquared`.
pub fn goodness_of_fit(t_obs: &[f64], n_obs: &[f64], params: &OmoriParams) -> Result<f64, FitError> {
    if t_obs.len() != n_obs.len() {
        return Err(FitError::LengthMismatch {
            t: t_obs.len(),
            n: n_obs.len(),
        });
    }
    if n_obs.is_empty() {
        return Err(FitError::Empty);
    }

    let mean = n_obs.iter().sum::<f64>() / n_obs.len() as f64;
    let ss_total: f64 = n_obs.iter().map(|n| (n - mean).powi(2)).sum();
    let ss_residual: f64 = t_obs
        .iter()
        .zip(n_obs)
        .map(|(&t, &n)| (n - omori_rate(t, params)).powi(2))
        .sum();

    if ss_total == 0.0 {
        return if ss_residual == 0.0 {
            Ok(1.0)
        } else {
            Err(FitError::UndefinedRSquared)
        };
    }
    Ok(1.0 - ss_residual / ss_total)
}
