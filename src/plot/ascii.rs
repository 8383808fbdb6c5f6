//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed daily counts: `o`
//! - fitted Omori curve: `-` line

use crate::plot::DecayChart;

/// Render `chart` into a `width` × `height` character grid plus header/legend.
pub fn render_ascii_plot(chart: &DecayChart<'_>, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = chart.x_range();
    let scale = AxisScale::new(chart.log_y);
    let (y_min, y_max) = chart
        .y_range()
        .map(|(lo, hi)| (scale.apply(lo), scale.apply(hi)))
        .map(|(lo, hi)| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) })
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    let curve: Vec<(f64, f64)> = chart
        .curve
        .iter()
        .filter(|(_, y)| scale.drawable(*y))
        .map(|&(t, y)| (t, scale.apply(y)))
        .collect();
    draw_curve(&mut grid, &curve, t_min, t_max, y_min, y_max);

    for &(t, y) in chart.observed {
        if !scale.drawable(y) {
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let row = map_y(scale.apply(y), y_min, y_max, height);
        grid[row][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", chart.title));
    out.push_str(&format!(
        "Plot: t=[{t_min:.1}, {t_max:.1}] | N=[{:.2}, {:.2}]{}\n",
        scale.invert(y_min),
        scale.invert(y_max),
        if chart.log_y { " (log)" } else { "" }
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out.push_str(&format!("x: {} | y: {}\n", chart.x_label, chart.y_label));
    out.push_str(&format!("o {}\n", chart.observed_label));
    out.push_str(&format!("- {}\n", chart.model_label));
    out
}

#[derive(Debug, Clone, Copy)]
struct AxisScale {
    log: bool,
}

impl AxisScale {
    fn new(log: bool) -> Self {
        Self { log }
    }

    fn drawable(self, y: f64) -> bool {
        y.is_finite() && (!self.log || y > 0.0)
    }

    fn apply(self, y: f64) -> f64 {
        if self.log { y.log10() } else { y }
    }

    fn invert(self, y: f64) -> f64 {
        if self.log { 10f64.powf(y) } else { y }
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
