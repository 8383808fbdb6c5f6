//! Synthetic aftershock catalogs drawn from a known Omori law.
//!
//! The generator places a mainshock at the configured instant and then draws:
//!
//! - the number of aftershocks from a Poisson law whose mean is the Omori rate
//!   integrated over the sequence length
//! - each aftershock time from the inverse CDF of the (normalized) Omori rate
//! - magnitudes from Gutenberg-Richter: `M - M_min ~ Exp(b * ln 10)`, capped
//!   below the mainshock so the mainshock stays the unique maximum
//! - locations and depths as normal jitter around the hypocenter
//!
//! A handful of background events are spread uniformly over the week before
//! the mainshock; they exercise the "at or after the mainshock" filter.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal, Poisson};
use serde::Serialize;

use crate::domain::{OmoriParams, SeismicEvent, SimulationConfig};
use crate::error::AppError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Gap kept between the largest aftershock and the mainshock.
const MAINSHOCK_GAP: f64 = 0.1;

/// Epicentral scatter (degrees) of aftershocks and background events.
const AFTERSHOCK_SPREAD_DEG: f64 = 0.1;
const BACKGROUND_SPREAD_DEG: f64 = 0.5;
const DEPTH_SPREAD_KM: f64 = 3.0;

const BACKGROUND_WINDOW_DAYS: f64 = 7.0;
/// Background events end at least this long before the mainshock.
const BACKGROUND_LEAD_DAYS: f64 = 1.0 / 24.0;

/// Refuse sequences that would not fit comfortably in memory.
const MAX_EXPECTED_EVENTS: f64 = 2_000_000.0;

#[derive(Debug, Clone)]
pub struct SyntheticCatalog {
    /// Time-ordered events, mainshock included.
    pub events: Vec<SeismicEvent>,
    /// Mean of the Poisson draw for the aftershock count.
    pub expected_aftershocks: f64,
    pub aftershock_count: usize,
}

/// Draw a synthetic catalog for `config`.
pub fn generate_catalog(config: &SimulationConfig) -> Result<SyntheticCatalog, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let expected = expected_count(&config.params, config.duration_days);
    if expected > MAX_EXPECTED_EVENTS {
        return Err(AppError::new(
            2,
            format!("Expected {expected:.0} aftershocks; reduce K or the duration."),
        ));
    }

    let count = if expected > 0.0 {
        let poisson = Poisson::new(expected)
            .map_err(|e| AppError::new(2, format!("Aftershock count distribution error: {e}")))?;
        let drawn: f64 = poisson.sample(&mut rng);
        drawn as usize
    } else {
        0
    };
    log::debug!("expected {expected:.1} aftershocks, drew {count}");

    let magnitudes = Exp::new(config.b_value * std::f64::consts::LN_10)
        .map_err(|e| AppError::new(2, format!("Magnitude distribution error: {e}")))?;
    let near = Normal::new(0.0, AFTERSHOCK_SPREAD_DEG)
        .map_err(|e| AppError::new(2, format!("Location distribution error: {e}")))?;
    let far = Normal::new(0.0, BACKGROUND_SPREAD_DEG)
        .map_err(|e| AppError::new(2, format!("Location distribution error: {e}")))?;
    let depth = Normal::new(0.0, DEPTH_SPREAD_KM)
        .map_err(|e| AppError::new(2, format!("Depth distribution error: {e}")))?;

    let cap = config.mainshock_magnitude - MAINSHOCK_GAP;
    let draw_magnitude =
        |rng: &mut StdRng| round_to(config.min_magnitude + magnitudes.sample(rng), 2).min(cap);

    let mut events = Vec::with_capacity(count + config.background_events + 1);
    events.push(SeismicEvent {
        timestamp: config.mainshock_time,
        latitude: Some(config.latitude),
        longitude: Some(config.longitude),
        depth_km: Some(config.depth_km),
        magnitude: config.mainshock_magnitude,
    });

    for _ in 0..count {
        let u = rng.gen_range(0.0..1.0);
        let t = omori_inverse_cdf(u, &config.params, config.duration_days);
        events.push(SeismicEvent {
            timestamp: offset_days(config.mainshock_time, t),
            latitude: Some(round_to(config.latitude + near.sample(&mut rng), 4)),
            longitude: Some(round_to(config.longitude + near.sample(&mut rng), 4)),
            depth_km: Some(round_to((config.depth_km + depth.sample(&mut rng)).max(0.0), 1)),
            magnitude: draw_magnitude(&mut rng),
        });
    }

    for _ in 0..config.background_events {
        let t = -rng.gen_range(BACKGROUND_LEAD_DAYS..BACKGROUND_WINDOW_DAYS);
        events.push(SeismicEvent {
            timestamp: offset_days(config.mainshock_time, t),
            latitude: Some(round_to(config.latitude + far.sample(&mut rng), 4)),
            longitude: Some(round_to(config.longitude + far.sample(&mut rng), 4)),
            depth_km: Some(round_to((config.depth_km + depth.sample(&mut rng)).max(0.0), 1)),
            magnitude: draw_magnitude(&mut rng),
        });
    }

    // Stable: the mainshock stays ahead of aftershocks truncated onto its second.
    events.sort_by_key(|e| e.timestamp);

    Ok(SyntheticCatalog {
        events,
        expected_aftershocks: expected,
        aftershock_count: count,
    })
}

/// Write `events` as a catalog CSV that `omori fit` reads back.
pub fn write_catalog_csv(path: &Path, events: &[SeismicEvent]) -> Result<(), AppError> {
    let file = std::fs::File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create '{}': {e}", path.display()))
    })?;
    write_catalog(file, events)
        .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
    log::info!("wrote {} event(s) to {}", events.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct CatalogRow {
    #[serde(rename = "Time")]
    time: DateTime<Utc>,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Depth/Km")]
    depth_km: Option<f64>,
    #[serde(rename = "Magnitude")]
    magnitude: f64,
}

pub fn write_catalog<W: Write>(writer: W, events: &[SeismicEvent]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for e in events {
        wtr.serialize(CatalogRow {
            time: e.timestamp,
            latitude: e.latitude,
            longitude: e.longitude,
            depth_km: e.depth_km,
            magnitude: e.magnitude,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Expected number of events in `[0, duration]` under `rate(t) = K / (t + c)^p`.
pub fn expected_count(params: &OmoriParams, duration: f64) -> f64 {
    let OmoriParams { k, c, p } = *params;
    if (p - 1.0).abs() < 1e-9 {
        k * ((duration + c) / c).ln()
    } else {
        k * (c.powf(1.0 - p) - (duration + c).powf(1.0 - p)) / (p - 1.0)
    }
}

/// Event time in `[0, duration]` for a uniform draw `u` in `[0, 1)`.
pub fn omori_inverse_cdf(u: f64, params: &OmoriParams, duration: f64) -> f64 {
    let OmoriParams { c, p, .. } = *params;
    let t = if (p - 1.0).abs() < 1e-9 {
        c * ((duration + c) / c).powf(u) - c
    } else {
        let q = 1.0 - p;
        let a = c.powf(q);
        let b = (duration + c).powf(q);
        (a - u * (a - b)).powf(1.0 / q) - c
    };
    t.clamp(0.0, duration)
}

fn validate(config: &SimulationConfig) -> Result<(), AppError> {
    let OmoriParams { k, c, p } = config.params;
    if !(k.is_finite() && k >= 0.0) {
        return Err(AppError::new(2, "K must be finite and >= 0."));
    }
    // c = 0 makes the rate non-integrable at t = 0.
    if !(c.is_finite() && c > 0.0) {
        return Err(AppError::new(2, "c must be finite and > 0 for simulation."));
    }
    if !(p.is_finite() && p > 0.0) {
        return Err(AppError::new(2, "p must be finite and > 0."));
    }
    if !(config.duration_days.is_finite() && config.duration_days > 0.0) {
        return Err(AppError::new(2, "Duration must be > 0 days."));
    }
    if !(config.b_value.is_finite() && config.b_value > 0.0) {
        return Err(AppError::new(2, "b-value must be > 0."));
    }
    if !(config.min_magnitude.is_finite() && config.mainshock_magnitude.is_finite()) {
        return Err(AppError::new(2, "Magnitudes must be finite."));
    }
    if config.min_magnitude > config.mainshock_magnitude - MAINSHOCK_GAP {
        return Err(AppError::new(
            2,
            format!(
                "Minimum magnitude {} must be at least {MAINSHOCK_GAP} below the mainshock (M{}).",
                config.min_magnitude, config.mainshock_magnitude
            ),
        ));
    }
    let coords = [config.latitude, config.longitude, config.depth_km];
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "Hypocenter coordinates must be finite."));
    }
    Ok(())
}

fn offset_days(origin: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    // Whole seconds, matching the written timestamp format.
    origin + Duration::seconds((days * SECONDS_PER_DAY).floor() as i64)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::io::ingest::read_catalog;
    use crate::prepare::prepare_series;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            output: "unused.csv".into(),
            seed,
            mainshock_time: Utc.with_ymd_and_hms(2016, 8, 24, 1, 36, 32).unwrap(),
            mainshock_magnitude: 6.0,
            latitude: 42.70,
            longitude: 13.23,
            depth_km: 8.0,
            params: OmoriParams::new(300.0, 0.5, 1.1),
            duration_days: 60.0,
            min_magnitude: 2.0,
            b_value: 1.0,
            background_events: 20,
        }
    }

    #[test]
    fn same_seed_same_catalog() {
        let a = generate_catalog(&config(7)).unwrap();
        let b = generate_catalog(&config(7)).unwrap();
        assert_eq!(a.events, b.events);
        let c = generate_catalog(&config(8)).unwrap();
        assert_ne!(a.events, c.events);
    }

    #[test]
    fn mainshock_is_unique_maximum_and_events_are_sorted() {
        let cfg = config(1);
        let cat = generate_catalog(&cfg).unwrap();
        assert_eq!(cat.events.len(), cat.aftershock_count + cfg.background_events + 1);
        assert!(cat.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let mains: Vec<_> = cat
            .events
            .iter()
            .filter(|e| e.magnitude >= cfg.mainshock_magnitude)
            .collect();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].timestamp, cfg.mainshock_time);
        assert!(cat.events.iter().all(|e| e.magnitude >= cfg.min_magnitude));
    }

    #[test]
    fn aftershock_count_tracks_expected() {
        let cat = generate_catalog(&config(3)).unwrap();
        let sigma = cat.expected_aftershocks.sqrt();
        let diff = (cat.aftershock_count as f64 - cat.expected_aftershocks).abs();
        assert!(diff < 6.0 * sigma, "drew {} vs {}", cat.aftershock_count, cat.expected_aftershocks);
    }

    #[test]
    fn inverse_cdf_hits_interval_ends() {
        for p in [0.8, 1.0, 1.3] {
            let params = OmoriParams::new(100.0, 0.5, p);
            assert!(omori_inverse_cdf(0.0, &params, 30.0).abs() < 1e-9);
            assert!((omori_inverse_cdf(1.0, &params, 30.0) - 30.0).abs() < 1e-6);
            // Early-heavy: the median falls well before the midpoint.
            assert!(omori_inverse_cdf(0.5, &params, 30.0) < 15.0);
        }
    }

    #[test]
    fn expected_count_matches_closed_forms() {
        let params = OmoriParams::new(100.0, 1.0, 1.0);
        assert!((expected_count(&params, 9.0) - 100.0 * 10f64.ln()).abs() < 1e-9);
        let params = OmoriParams::new(100.0, 1.0, 2.0);
        // 100 * (1 - 1/10)
        assert!((expected_count(&params, 9.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn timestamps_serialize_as_utc_rfc3339() {
        let event = SeismicEvent {
            timestamp: Utc.with_ymd_and_hms(2016, 10, 30, 6, 40, 17).unwrap(),
            latitude: Some(42.83),
            longitude: None,
            depth_km: Some(9.2),
            magnitude: 6.5,
        };
        let mut buf = Vec::new();
        write_catalog(&mut buf, &[event]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Time,Latitude,Longitude,Depth/Km,Magnitude\n2016-10-30T06:40:17Z,42.83,,9.2,6.5\n"
        );
    }

    #[test]
    fn zero_c_is_rejected() {
        let mut cfg = config(1);
        cfg.params.c = 0.0;
        assert_eq!(generate_catalog(&cfg).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn written_catalog_reads_back_and_fits() {
        let cfg = config(11);
        let cat = generate_catalog(&cfg).unwrap();

        let mut buf = Vec::new();
        write_catalog(&mut buf, &cat.events).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Time,Latitude,Longitude,Depth/Km,Magnitude\n"));

        let parsed = read_catalog(text.as_bytes(), b',').unwrap();
        assert_eq!(parsed.len(), cat.events.len());

        let prepared = prepare_series(&parsed.events, cfg.min_magnitude).unwrap();
        assert_eq!(prepared.mainshock.event.timestamp, cfg.mainshock_time);
        assert_eq!(prepared.aftershock_count, cat.aftershock_count);

        let outcome = crate::fit::fit(&prepared.series, &Default::default());
        assert!(outcome.is_converged(), "{:?}", outcome.fallback_reason());
        let p = outcome.params().p;
        assert!((0.8..=1.5).contains(&p), "p = {p}");
        assert!(outcome.r_squared() > 0.8);
    }
}
