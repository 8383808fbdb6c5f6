//! SVG chart export via Plotters.
//!
//! The chart is fully described by [`DecayChart`]; this module only draws.
//! Observed counts are filled circles, the fitted curve is a line, and the
//! legend carries the fitted formula with its R².

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;
use crate::plot::DecayChart;

/// Exit code for chart rendering failures.
pub const PLOT_EXIT_CODE: u8 = 4;

/// Render `chart` to an SVG file of `size` pixels.
pub fn write_svg_chart(path: &Path, chart: &DecayChart<'_>, size: (u32, u32)) -> Result<(), AppError> {
    // The backend only touches the file on `present()`; fail before drawing.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(AppError::new(
                PLOT_EXIT_CODE,
                format!(
                    "Failed to render chart '{}': directory '{}' does not exist",
                    path.display(),
                    parent.display()
                ),
            ));
        }
    }

    draw_svg(path, chart, size).map_err(|e| {
        AppError::new(
            PLOT_EXIT_CODE,
            format!("Failed to render chart '{}': {e}", path.display()),
        )
    })?;
    log::info!("Wrote chart to {}", path.display());
    Ok(())
}

// Linear and log y-axes produce different coordinate types, so the shared
// drawing steps are expanded once per axis kind.
macro_rules! draw_decay_series {
    ($chart:expr, $desc:expr) => {{
        let curve_color = RGBColor(200, 30, 30);
        let points_color = RGBColor(30, 80, 200);

        $chart
            .configure_mesh()
            .x_desc($desc.x_label)
            .y_desc($desc.y_label)
            .x_labels(8)
            .y_labels(8)
            .draw()?;

        $chart
            .draw_series(
                $desc
                    .observed
                    .iter()
                    .filter(|(_, y)| !$desc.log_y || *y > 0.0)
                    .map(|&(x, y)| Circle::new((x, y), 3, points_color.filled())),
            )?
            .label($desc.observed_label.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, points_color.filled()));

        $chart
            .draw_series(LineSeries::new(
                $desc
                    .curve
                    .iter()
                    .copied()
                    .filter(|(_, y)| y.is_finite() && (!$desc.log_y || *y > 0.0)),
                curve_color.stroke_width(2),
            ))?
            .label($desc.model_label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_color.stroke_width(2)));

        $chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
    }};
}

fn draw_svg(path: &Path, desc: &DecayChart<'_>, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = desc.x_range();
    let x_pad = (x1 - x0) * 0.02;
    let (x0, x1) = (x0 - x_pad, x1 + x_pad);

    let y_range = desc.y_range();

    let mut builder = ChartBuilder::on(&root);
    builder
        .caption(&desc.title, ("sans-serif", 22))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45);

    match y_range {
        Some((lo, hi)) if desc.log_y => {
            let (lo, hi) = if hi > lo { (lo / 1.5, hi * 1.5) } else { (lo / 10.0, hi * 10.0) };
            let mut chart = builder.build_cartesian_2d(x0..x1, (lo..hi).log_scale())?;
            draw_decay_series!(chart, desc);
        }
        _ => {
            let (lo, hi) = y_range.unwrap_or((0.0, 1.0));
            let pad = ((hi - lo) * 0.05).max(0.5);
            let mut chart = builder.build_cartesian_2d(x0..x1, (lo - pad).min(0.0)..hi + pad)?;
            draw_decay_series!(chart, desc);
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_svg(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("omori-{}-{name}.svg", std::process::id()))
    }

    fn chart<'a>(observed: &'a [(f64, f64)], curve: &'a [(f64, f64)], log_y: bool) -> DecayChart<'a> {
        DecayChart {
            title: "Aftershock decay".to_string(),
            observed,
            curve,
            observed_label: "observed".to_string(),
            model_label: "N(t) = 100 / (t + 0.00)^1.000".to_string(),
            x_label: "days since mainshock",
            y_label: "events per day",
            log_y,
        }
    }

    #[test]
    fn writes_log_scale_svg() {
        let observed = [(1.0, 100.0), (2.0, 50.0), (4.0, 25.0)];
        let curve = [(1.0, 100.0), (2.0, 50.0), (4.0, 25.0)];
        let path = temp_svg("log");
        write_svg_chart(&path, &chart(&observed, &curve, true), (640, 480)).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("<svg"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_path_maps_to_plot_exit_code() {
        let observed = [(1.0, 3.0)];
        let path = std::env::temp_dir()
            .join("omori-no-such-dir")
            .join("nested")
            .join("chart.svg");
        let err = write_svg_chart(&path, &chart(&observed, &[], false), (320, 240)).unwrap_err();
        assert_eq!(err.exit_code(), PLOT_EXIT_CODE);
        assert!(err.message().contains("chart.svg"));
    }
}
