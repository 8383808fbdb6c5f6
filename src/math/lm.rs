//! Bounded nonlinear least squares (projected Levenberg–Marquardt).
//!
//! Given a model `f(t; x)`, its Jacobian row, observations `(t_i, y_i)`, an
//! initial guess and per-parameter box constraints, [`curve_fit`] returns the
//! `x` inside the box that minimizes `½ Σ (y_i − f(t_i; x))²`.
//!
//! Each iteration:
//! - freezes parameters sitting on a bound whose descent direction points out
//!   of the box (their Jacobian column is zeroed for the step)
//! - solves the damped Gauss–Newton system `[J; √λ·D] δ ≈ [r; 0]` by SVD,
//!   with Marquardt scaling `D = diag(‖J_j‖)`
//! - projects `x + δ` back into the box and accepts it if the cost drops,
//!   otherwise raises `λ` and retries
//!
//! Every evaluation of the residual vector counts against `max_evaluations`.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::math::solve_least_squares;

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
const SCALE_FLOOR: f64 = 1e-12;

/// Why a solve did not produce parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{observations} observation(s) cannot determine {params} parameters")]
    Underdetermined { observations: usize, params: usize },

    #[error("initial guess lies outside the bounds")]
    InfeasibleStart,

    #[error("model produced non-finite residuals at the initial guess")]
    NonFinite,

    #[error("damped step could not be solved (singular system)")]
    Singular,

    #[error("no further progress possible (damping limit reached)")]
    Stalled,

    #[error("did not converge within {0} function evaluations")]
    MaxEvaluations(usize),
}

/// Tolerances and budget.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_evaluations: usize,
    /// Relative cost reduction below which an accepted step ends the solve.
    pub ftol: f64,
    /// Relative step size below which the solve ends.
    pub xtol: f64,
    /// Projected-gradient magnitude below which the solve ends.
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
        }
    }
}

/// Successful solve.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// `½ Σ r_i²` at `params`.
    pub cost: f64,
    pub evaluations: usize,
    pub iterations: usize,
}

/// Fit `model` to `(t, y)` inside `[lower, upper]` starting from `x0`.
///
/// `jacobian(t, x, out)` must write `∂f/∂x_j` into `out[j]`.
pub fn curve_fit<F, J>(
    t: &[f64],
    y: &[f64],
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    model: F,
    jacobian: J,
    opts: &LmOptions,
) -> Result<LmReport, SolverError>
where
    F: Fn(f64, &[f64]) -> f64,
    J: Fn(f64, &[f64], &mut [f64]),
{
    validate_inputs(t, y, x0, lower, upper)?;
    let m = t.len();
    let n = x0.len();

    let mut x = x0.to_vec();
    let mut evaluations = 1;
    let (mut r, mut cost) = residuals(t, y, &x, &model);
    if !cost.is_finite() {
        return Err(SolverError::NonFinite);
    }

    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0;
    let mut row = vec![0.0; n];

    loop {
        if cost == 0.0 {
            return Ok(report(x, cost, evaluations, iterations));
        }
        iterations += 1;

        let mut jac = DMatrix::<f64>::zeros(m, n);
        for (i, &ti) in t.iter().enumerate() {
            jacobian(ti, &x, &mut row);
            for j in 0..n {
                jac[(i, j)] = row[j];
            }
        }

        // Descent direction of the cost (negative gradient).
        let g = jac.transpose() * &r;
        let mut projected_grad = 0.0_f64;
        for j in 0..n {
            let at_lower = x[j] <= lower[j] && g[j] < 0.0;
            let at_upper = x[j] >= upper[j] && g[j] > 0.0;
            if at_lower || at_upper {
                jac.column_mut(j).fill(0.0);
            } else {
                projected_grad = projected_grad.max(g[j].abs());
            }
        }
        if projected_grad <= opts.gtol {
            log::debug!("lm: projected gradient {projected_grad:e} below tolerance");
            return Ok(report(x, cost, evaluations, iterations));
        }

        let scale: Vec<f64> = (0..n)
            .map(|j| jac.column(j).norm().max(SCALE_FLOOR))
            .collect();

        loop {
            if evaluations >= opts.max_evaluations {
                return Err(SolverError::MaxEvaluations(opts.max_evaluations));
            }

            let delta = damped_step(&jac, &r, &scale, lambda).ok_or(SolverError::Singular)?;
            let candidate: Vec<f64> = (0..n)
                .map(|j| (x[j] + delta[j]).clamp(lower[j], upper[j]))
                .collect();
            let step_norm = distance(&candidate, &x);
            let small_step = step_norm <= opts.xtol * (norm(&x) + opts.xtol);

            let (r_new, cost_new) = residuals(t, y, &candidate, &model);
            evaluations += 1;

            if cost_new.is_finite() && cost_new < cost {
                let reduction = cost - cost_new;
                let relative = reduction / cost;
                x = candidate;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);
                log::debug!(
                    "lm: iter={iterations} evals={evaluations} cost={cost:.6e} lambda={lambda:.1e} x={x:?}"
                );

                if relative <= opts.ftol || small_step {
                    return Ok(report(x, cost, evaluations, iterations));
                }
                break;
            }

            // Rejected. A negligible step means we are already at the
            // constrained minimum to within tolerance.
            if small_step {
                return Ok(report(x, cost, evaluations, iterations));
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(SolverError::Stalled);
            }
        }
    }
}

fn validate_inputs(t: &[f64], y: &[f64], x0: &[f64], lower: &[f64], upper: &[f64]) -> Result<(), SolverError> {
    if t.len() != y.len() {
        return Err(SolverError::InvalidInput(format!(
            "t has {} values but y has {}",
            t.len(),
            y.len()
        )));
    }
    let n = x0.len();
    if n == 0 || lower.len() != n || upper.len() != n {
        return Err(SolverError::InvalidInput(
            "initial guess and bounds must have the same non-zero length".to_string(),
        ));
    }
    if t.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(SolverError::InvalidInput("observations must be finite".to_string()));
    }
    if t.len() < n {
        return Err(SolverError::Underdetermined {
            observations: t.len(),
            params: n,
        });
    }
    for j in 0..n {
        if !(lower[j] <= upper[j]) {
            return Err(SolverError::InvalidInput(format!("bounds for parameter {j} are inverted")));
        }
        if !(x0[j] >= lower[j] && x0[j] <= upper[j]) {
            return Err(SolverError::InfeasibleStart);
        }
    }
    Ok(())
}

/// Residual vector `y − f(t; x)` and cost `½‖r‖²`.
fn residuals<F>(t: &[f64], y: &[f64], x: &[f64], model: &F) -> (DVector<f64>, f64)
where
    F: Fn(f64, &[f64]) -> f64,
{
    let r = DVector::from_iterator(t.len(), t.iter().zip(y).map(|(&ti, &yi)| yi - model(ti, x)));
    let cost = 0.5 * r.norm_squared();
    (r, cost)
}

fn damped_step(jac: &DMatrix<f64>, r: &DVector<f64>, scale: &[f64], lambda: f64) -> Option<DVector<f64>> {
    let (m, n) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.rows_mut(0, m).copy_from(jac);
    for j in 0..n {
        a[(m + j, j)] = lambda.sqrt() * scale[j];
    }
    let mut b = DVector::<f64>::zeros(m + n);
    b.rows_mut(0, m).copy_from(r);
    solve_least_squares(&a, &b)
}

fn norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(u, v)| (u - v) * (u - v)).sum::<f64>().sqrt()
}

fn report(params: Vec<f64>, cost: f64, evaluations: usize, iterations: usize) -> LmReport {
    LmReport {
        params,
        cost,
        evaluations,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_model(t: f64, x: &[f64]) -> f64 {
        x[0] * (-x[1] * t).exp()
    }

    fn exp_jacobian(t: f64, x: &[f64], out: &mut [f64]) {
        let e = (-x[1] * t).exp();
        out[0] = e;
        out[1] = -x[0] * t * e;
    }

    fn exp_data(a: f64, b: f64) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y = t.iter().map(|&ti| exp_model(ti, &[a, b])).collect();
        (t, y)
    }

    #[test]
    fn recovers_exponential_decay() {
        let (t, y) = exp_data(5.0, 0.8);
        let fit = curve_fit(
            &t,
            &y,
            &[1.0, 0.1],
            &[0.0, 0.0],
            &[100.0, 10.0],
            exp_model,
            exp_jacobian,
            &LmOptions::default(),
        )
        .unwrap();
        assert!((fit.params[0] - 5.0).abs() < 1e-6, "{:?}", fit.params);
        assert!((fit.params[1] - 0.8).abs() < 1e-6, "{:?}", fit.params);
        assert!(fit.cost < 1e-12);
        assert!(fit.iterations >= 1 && fit.iterations <= fit.evaluations);
    }

    #[test]
    fn active_bound_holds_parameter() {
        // True rate is 0.8 but the box caps it at 0.5.
        let (t, y) = exp_data(5.0, 0.8);
        let fit = curve_fit(
            &t,
            &y,
            &[1.0, 0.1],
            &[0.0, 0.0],
            &[100.0, 0.5],
            exp_model,
            exp_jacobian,
            &LmOptions::default(),
        )
        .unwrap();
        assert!(fit.params[1] <= 0.5);
        assert!((fit.params[1] - 0.5).abs() < 1e-9, "{:?}", fit.params);
    }

    #[test]
    fn too_few_observations_is_underdetermined() {
        let err = curve_fit(
            &[1.0],
            &[2.0],
            &[1.0, 0.1],
            &[0.0, 0.0],
            &[10.0, 10.0],
            exp_model,
            exp_jacobian,
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SolverError::Underdetermined {
                observations: 1,
                params: 2
            }
        );
    }

    #[test]
    fn infeasible_start_is_rejected() {
        let (t, y) = exp_data(5.0, 0.8);
        let err = curve_fit(
            &t,
            &y,
            &[1.0, 20.0],
            &[0.0, 0.0],
            &[10.0, 10.0],
            exp_model,
            exp_jacobian,
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, SolverError::InfeasibleStart);
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let (t, y) = exp_data(5.0, 0.8);
        let opts = LmOptions {
            max_evaluations: 2,
            ..LmOptions::default()
        };
        let err = curve_fit(
            &t,
            &y,
            &[1.0, 0.1],
            &[0.0, 0.0],
            &[100.0, 10.0],
            exp_model,
            exp_jacobian,
            &opts,
        )
        .unwrap_err();
        assert_eq!(err, SolverError::MaxEvaluations(2));
    }
}
