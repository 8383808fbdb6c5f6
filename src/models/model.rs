//! Modified Omori law evaluation.
//!
//! The solver relies on two primitive operations:
//! - predict `rate(t) = K / (t + c)^p` for a parameter vector
//! - fill the Jacobian row `∂rate/∂(K, c, p)` at a single `t`
//!
//! Parameters are passed as `[K, c, p]` slices so the solver stays generic.

use crate::domain::OmoriParams;

/// Number of free parameters (`K`, `c`, `p`).
pub const PARAM_COUNT: usize = 3;

/// Evaluate the Omori rate at `t` (days).
pub fn omori_rate(t: f64, params: &OmoriParams) -> f64 {
    params.k / (t + params.c).powf(params.p)
}

/// Slice form of [`omori_rate`] used by the solver.
///
/// # Panics
/// Panics if `x` has fewer than [`PARAM_COUNT`] entries.
pub fn predict(t: f64, x: &[f64]) -> f64 {
    x[0] / (t + x[1]).powf(x[2])
}

/// Fill the Jacobian row of the model with respect to `[K, c, p]`.
///
/// - `∂/∂K = (t + c)^-p`
/// - `∂/∂c = -p K (t + c)^(-p-1)`
/// - `∂/∂p = -K (t + c)^-p ln(t + c)`
///
/// # Panics
/// Panics if `x` or `out` has fewer than [`PARAM_COUNT`] entries.
pub fn fill_jacobian_row(t: f64, x: &[f64], out: &mut [f64]) {
    let (k, c, p) = (x[0], x[1], x[2]);
    let base = t + c;
    let decay = base.powf(-p);

    out[0] = decay;
    out[1] = -p * k * decay / base;
    out[2] = -k * decay * base.ln();
}

/// Sample the fitted curve at `n` evenly spaced points over `[t_min, t_max]`.
pub fn sample_curve(params: &OmoriParams, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t_min + u * (t_max - t_min);
            (t, omori_rate(t, params))
        })
        .collect()
}
