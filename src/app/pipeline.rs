//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalog load -> mainshock/aftershocks -> daily buckets -> Omori fit
//!
//! Front-ends then only decide how to present the result.

use crate::domain::{AnalysisConfig, FitOutcome};
use crate::error::AppError;
use crate::io::ingest::{Catalog, load_catalog};
use crate::prepare::{PreparedSeries, prepare_series};

/// All computed outputs of a single `omori fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub catalog: Catalog,
    pub prepared: PreparedSeries,
    pub outcome: FitOutcome,
}

/// Execute the full pipeline against the configured catalog file.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    // Reject impossible solver settings before touching the file system.
    config.fit.validate()?;

    let catalog = load_catalog(&config.catalog_path, config.delimiter)?;
    log::info!(
        "loaded {} event(s) from {}",
        catalog.len(),
        config.catalog_path.display()
    );

    run_validated(catalog, config)
}

/// Execute the pipeline on an already loaded catalog.
pub fn run_with_catalog(catalog: Catalog, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    config.fit.validate()?;
    run_validated(catalog, config)
}

fn run_validated(catalog: Catalog, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let prepared = prepare_series(&catalog.events, config.min_magnitude)?;
    let outcome = crate::fit::fit(&prepared.series, &config.fit);

    Ok(RunOutput {
        catalog,
        prepared,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::{DEFAULT_MIN_MAGNITUDE, FitOptions, SeismicEvent};
    use crate::io::ingest::{ColumnMap, read_catalog};

    fn config(path: &str) -> AnalysisConfig {
        AnalysisConfig {
            catalog_path: PathBuf::from(path),
            delimiter: b',',
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            fit: FitOptions::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            log_y: true,
            svg_path: None,
            show_table: false,
        }
    }

    fn event(t0: chrono::DateTime<Utc>, offset: Duration, magnitude: f64) -> SeismicEvent {
        SeismicEvent {
            timestamp: t0 + offset,
            latitude: Some(42.7),
            longitude: Some(13.2),
            depth_km: Some(8.0),
            magnitude,
        }
    }

    /// Catalog whose daily counts follow `round(100 / n)` for `n = 1..=30`.
    fn hyperbolic_catalog() -> Catalog {
        let t0 = Utc.with_ymd_and_hms(2016, 8, 24, 1, 36, 32).unwrap();
        let mut events = vec![event(t0, Duration::zero(), 6.0)];
        for day in 1..=30i64 {
            let count = (100.0 / day as f64).round() as i64;
            for i in 0..count {
                let offset = Duration::days(day - 1) + Duration::minutes(10 + i * 5);
                events.push(event(t0, offset, 2.5));
            }
        }
        Catalog {
            events,
            columns: ColumnMap {
                time: 0,
                latitude: Some(1),
                longitude: Some(2),
                depth_km: Some(3),
                magnitude: 4,
                positional: false,
            },
        }
    }

    #[test]
    fn hyperbolic_decay_recovers_classic_omori() {
        let run = run_with_catalog(hyperbolic_catalog(), &config("memory")).unwrap();
        assert_eq!(run.prepared.series.len(), 30);
        assert_eq!(run.prepared.series.points[0].count, 100);

        assert!(run.outcome.is_converged());
        let p = run.outcome.params();
        assert!((p.p - 1.0).abs() < 0.1, "p = {}", p.p);
        assert!(p.c < 0.5, "c = {}", p.c);
        assert!((p.k - 100.0).abs() < 10.0, "K = {}", p.k);
        assert!(run.outcome.r_squared() > 0.99);
    }

    #[test]
    fn summary_reports_mainshock_and_fit_status() {
        let cfg = config("memory");
        let run = run_with_catalog(hyperbolic_catalog(), &cfg).unwrap();
        let txt = crate::report::format_run_summary(&run, &cfg);
        assert!(txt.contains("- magnitude: M6.0"));
        assert!(txt.contains("over 30 non-empty day(s)"));
        assert!(txt.contains("- status: converged"));
        assert!(txt.contains("Interpretation:"));
    }

    #[test]
    fn in_memory_catalog_still_validates_options() {
        let mut cfg = config("memory");
        cfg.fit.max_evaluations = 0;
        let err = run_with_catalog(hyperbolic_catalog(), &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn only_small_aftershocks_is_a_data_error() {
        let csv = "\
Time,Latitude,Longitude,Depth/Km,Magnitude
2016-08-24T01:36:32Z,42.70,13.23,8.1,6.0
2016-08-24T02:00:00Z,42.71,13.22,9.0,1.2
2016-08-24T03:00:00Z,42.72,13.21,9.5,1.9
";
        let catalog = read_catalog(csv.as_bytes(), b',').unwrap();
        let err = run_with_catalog(catalog, &config("memory")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("No aftershocks"));
    }

    #[test]
    fn missing_catalog_names_the_path() {
        let err = run_analysis(&config("definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("definitely/not/here.csv"));
    }

    #[test]
    fn invalid_bounds_fail_before_loading() {
        let mut cfg = config("definitely/not/here.csv");
        cfg.fit.bounds.p = (2.0, 1.0);
        let err = run_analysis(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("bounds"));
    }
}
