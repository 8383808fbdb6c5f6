//! Chart rendering.
//!
//! Both sinks take the same render-only description ([`DecayChart`]): the
//! observed daily counts, the fitted curve sampled over the observed range,
//! a legend label, axis labels and whether the y-axis is logarithmic.
//!
//! - `ascii`: fixed-size character grid for the terminal
//! - `svg`: Plotters chart written to a file

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

/// Number of samples used when the fitted curve is drawn as a smooth line.
pub const CURVE_SAMPLES: usize = 500;

/// Everything needed to draw one decay chart.
#[derive(Debug, Clone)]
pub struct DecayChart<'a> {
    pub title: String,
    /// Observed `(t, N)` pairs.
    pub observed: &'a [(f64, f64)],
    /// Fitted model sampled over the observed t-range.
    pub curve: &'a [(f64, f64)],
    pub observed_label: String,
    pub model_label: String,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub log_y: bool,
}

impl DecayChart<'_> {
    /// t-range covered by observations and curve; widened when degenerate.
    pub fn x_range(&self) -> (f64, f64) {
        let (min, max) = min_max(self.observed.iter().chain(self.curve).map(|&(t, _)| t))
            .unwrap_or((1.0, 2.0));
        if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
    }

    /// y-range over all drawable values, in data units.
    ///
    /// On a log axis non-positive values cannot be drawn and are ignored.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let log_y = self.log_y;
        min_max(
            self.observed
                .iter()
                .chain(self.curve)
                .map(|&(_, y)| y)
                .filter(|y| !log_y || *y > 0.0),
        )
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() { Some((min, max)) } else { None }
}
