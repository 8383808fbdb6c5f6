//! Terminal formatting for the run summary and the daily series table.

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, DailyCountSeries, FitOutcome, OmoriParams};
use crate::models::omori_rate;

/// Half-width of the band around `p = 1` reported as "classic Omori decay".
pub const P_UNITY_TOLERANCE: f64 = 0.05;

/// Qualitative reading of the decay exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayReading {
    /// `p > 1`: activity died out faster than the classic law.
    Faster,
    /// `p < 1`: activity lingered; elevated hazard persists longer.
    Slower,
    /// `p ≈ 1`.
    Classic,
}

impl DecayReading {
    pub fn from_p(p: f64) -> Self {
        if (p - 1.0).abs() <= P_UNITY_TOLERANCE {
            DecayReading::Classic
        } else if p > 1.0 {
            DecayReading::Faster
        } else {
            DecayReading::Slower
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            DecayReading::Faster => {
                "p > 1.0: aftershock activity decayed faster than the classic Omori law; the fault zone released stress quickly."
            }
            DecayReading::Slower => {
                "p < 1.0: aftershock activity decayed more slowly than the classic Omori law; elevated hazard persists for longer."
            }
            DecayReading::Classic => "p ≈ 1.0: decay is consistent with the classic Omori law.",
        }
    }
}

/// Format the full run summary (catalog, mainshock, fit, interpretation).
pub fn format_run_summary(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    let main = &run.prepared.mainshock;
    let params = run.outcome.params();

    out.push_str("=== omori - Aftershock Decay Fit ===\n");
    out.push_str(&format!("Catalog: {}\n", config.catalog_path.display()));
    match run.catalog.time_span() {
        Some((start, end)) => out.push_str(&format!(
            "Events: n={} | {} .. {}\n",
            run.catalog.len(),
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%Y-%m-%d %H:%M:%S")
        )),
        None => out.push_str(&format!("Events: n={}\n", run.catalog.len())),
    }
    if run.catalog.columns.positional {
        out.push_str("Columns: positional (Time, Latitude, Longitude, Depth_Km, Magnitude)\n");
    }

    out.push_str("\nMainshock:\n");
    out.push_str(&format!("- time     : {} (UTC)\n", main.time().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("- magnitude: M{:.1}\n", main.magnitude()));
    if let (Some(lat), Some(lon)) = (main.event.latitude, main.event.longitude) {
        let depth = main
            .event
            .depth_km
            .map(|d| format!(", depth {d:.1} km"))
            .unwrap_or_default();
        out.push_str(&format!("- location : {lat:.3}, {lon:.3}{depth}\n"));
    }

    out.push_str(&format!(
        "\nAftershocks (M >= {:.1}): n={} over {} non-empty day(s)\n",
        config.min_magnitude,
        run.prepared.aftershock_count,
        run.prepared.series.len()
    ));
    if let Some(first) = run.prepared.series.points.first() {
        out.push_str(&format!(
            "First bucket: t={:.1} d, N={}\n",
            first.elapsed_days, first.count
        ));
    }

    out.push_str("\nOmori fit: N(t) = K / (t + c)^p\n");
    match &run.outcome {
        FitOutcome::Converged { evaluations, .. } => {
            out.push_str(&format!("- status: converged ({evaluations} evaluations)\n"));
        }
        FitOutcome::Fallback { reason, .. } => {
            out.push_str(&format!("- status: FAILED ({reason})\n"));
            out.push_str("- showing the initial guess; R² forced to 0\n");
        }
    }
    out.push_str(&format!("- R²: {:.4}\n", run.outcome.r_squared()));
    out.push_str(&format!("- K (activity scale): {:.2}\n", params.k));
    out.push_str(&format!("- c (time offset)   : {:.2} days\n", params.c));
    out.push_str(&format!("- p (decay rate)    : {:.3}\n", params.p));

    out.push_str("\nInterpretation:\n");
    out.push_str(&format!("{}\n", DecayReading::from_p(params.p).describe()));

    out
}

/// Format the daily series with the fitted rate next to each observation.
pub fn format_series_table(series: &DailyCountSeries, params: &OmoriParams) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>8} {:>8} {:>10} {:>10}\n", "t_days", "N_obs", "N_fit", "residual"));
    out.push_str(&format!("{:-<8} {:-<8} {:-<10} {:-<10}\n", "", "", "", ""));
    for p in &series.points {
        let fitted = omori_rate(p.elapsed_days, params);
        out.push_str(&format!(
            "{:>8.1} {:>8} {:>10.2} {:>10.2}\n",
            p.elapsed_days,
            p.count,
            fitted,
            p.count as f64 - fitted
        ));
    }
    out
}

/// Legend text for charts, e.g. `N(t) = 100 / (t + 0.00)^1.000, R² = 0.9990`.
pub fn model_label(outcome: &FitOutcome) -> String {
    let params = outcome.params();
    format!(
        "N(t) = {:.0} / (t + {:.2})^{:.3}, R² = {:.4}",
        params.k,
        params.c,
        params.p,
        outcome.r_squared()
    )
}
