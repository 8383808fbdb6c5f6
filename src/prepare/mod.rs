//! Event series preparation.
//!
//! Turns a raw catalog into the daily count series the fitter consumes:
//!
//! 1. pick the mainshock (largest magnitude, first occurrence on ties)
//! 2. keep aftershocks: not the mainshock record, `M >= min_magnitude`, at or
//!    after the mainshock instant
//! 3. count them in 24-hour buckets whose edges sit at `T + n * 24h`
//!
//! Bucket `n` is reported at `t = n + 1` days. The Omori rate is singular at
//! `t = 0`, so the first bucket lands on `t = 1`. Empty buckets are dropped
//! rather than kept as zeros; sparse tails therefore bias `p` slightly upward.

use std::collections::BTreeMap;

use crate::domain::{AftershockSubset, DailyCount, DailyCountSeries, Mainshock, SeismicEvent};
use crate::error::PrepareError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Output of [`prepare_series`].
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub mainshock: Mainshock,
    pub aftershock_count: usize,
    pub series: DailyCountSeries,
}

/// Run mainshock identification, aftershock filtering and daily bucketing.
pub fn prepare_series(events: &[SeismicEvent], min_magnitude: f64) -> Result<PreparedSeries, PrepareError> {
    let mainshock = identify_mainshock(events)?;
    log::info!(
        "mainshock: M{} at {} (catalog row {})",
        mainshock.magnitude(),
        mainshock.time(),
        mainshock.index + 1
    );

    let aftershocks = filter_aftershocks(events, &mainshock, min_magnitude)?;
    log::info!("aftershocks with M >= {min_magnitude}: {}", aftershocks.len());

    let series = bucket_daily(&aftershocks, &mainshock, min_magnitude)?;
    log::info!(
        "daily series: {} non-empty day(s), {} event(s)",
        series.len(),
        series.total_events()
    );

    Ok(PreparedSeries {
        mainshock,
        aftershock_count: aftershocks.len(),
        series,
    })
}

/// Select the event with the largest magnitude.
///
/// Only a strictly larger magnitude replaces the current best, so the first
/// of several equal maxima wins.
pub fn identify_mainshock(events: &[SeismicEvent]) -> Result<Mainshock, PrepareError> {
    let mut best: Option<(usize, &SeismicEvent)> = None;
    for (idx, event) in events.iter().enumerate() {
        match best {
            Some((_, current)) if event.magnitude <= current.magnitude => {}
            _ => best = Some((idx, event)),
        }
    }

    let (index, event) = best.ok_or(PrepareError::EmptyCatalog)?;
    Ok(Mainshock {
        index,
        event: event.clone(),
    })
}

/// Keep the events that count as aftershocks of `mainshock`.
///
/// The mainshock is excluded by catalog position, never by value, so a
/// duplicate row with the same time and magnitude still counts.
pub fn filter_aftershocks(
    events: &[SeismicEvent],
    mainshock: &Mainshock,
    min_magnitude: f64,
) -> Result<AftershockSubset, PrepareError> {
    let t0 = mainshock.time();
    let events: Vec<SeismicEvent> = events
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != mainshock.index)
        .map(|(_, e)| e)
        .filter(|e| e.magnitude >= min_magnitude && e.timestamp >= t0)
        .cloned()
        .collect();

    if events.is_empty() {
        return Err(PrepareError::NoAftershocks { min_magnitude });
    }
    Ok(AftershockSubset { events })
}

/// Count aftershocks per mainshock-anchored day.
///
/// `min_magnitude` is only used to describe an empty result.
pub fn bucket_daily(
    aftershocks: &AftershockSubset,
    mainshock: &Mainshock,
    min_magnitude: f64,
) -> Result<DailyCountSeries, PrepareError> {
    let t0 = mainshock.time();
    let mut buckets: BTreeMap<i64, u64> = BTreeMap::new();

    for event in &aftershocks.events {
        let elapsed_ms = (event.timestamp - t0).num_milliseconds();
        if elapsed_ms < 0 {
            // Not an aftershock; `filter_aftershocks` never lets these through.
            continue;
        }
        *buckets.entry(elapsed_ms / MILLIS_PER_DAY).or_insert(0) += 1;
    }

    let points: Vec<DailyCount> = buckets
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(day, count)| DailyCount {
            elapsed_days: day as f64 + 1.0,
            count,
        })
        .collect();

    for p in &points {
        log::debug!("bucket t={:.1}d count={}", p.elapsed_days, p.count);
    }

    if points.is_empty() {
        return Err(PrepareError::NoAftershocks { min_magnitude });
    }
    Ok(DailyCountSeries { points })
}
