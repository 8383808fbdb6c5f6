//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the logger
//! - runs the fit pipeline and prints the report/plots
//! - writes synthetic catalogs for `omori simulate`

use clap::Parser;

use crate::cli::{Command, FitArgs, SimulateArgs};
use crate::domain::{AnalysisConfig, FitOptions, OmoriParams, ParamBounds, SimulationConfig};
use crate::error::AppError;
use crate::plot::{CURVE_SAMPLES, DecayChart};

pub mod pipeline;

const X_LABEL: &str = "days since mainshock";
const Y_LABEL: &str = "aftershocks per day";

/// Entry point for the `omori` binary.
pub fn run() -> Result<(), AppError> {
    // `OMORI_CATALOG` may come from a `.env` file; a missing file is fine.
    dotenvy::dotenv().ok();

    // We want `omori` and `omori -f x.csv` to behave like `omori fit ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    let params = run.outcome.params();
    if config.show_table {
        println!("{}", crate::report::format_series_table(&run.prepared.series, &params));
    }

    if !config.plot && config.svg_path.is_none() {
        return Ok(());
    }

    let observed: Vec<(f64, f64)> = run
        .prepared
        .series
        .points
        .iter()
        .map(|p| (p.elapsed_days, p.count as f64))
        .collect();
    let (t_min, t_max) = run.prepared.series.t_range().unwrap_or((1.0, 1.0));

    // Only the curve resolution differs between the two sinks.
    if config.plot {
        let curve = crate::models::sample_curve(&params, t_min, t_max, config.plot_width);
        let chart = decay_chart(&run, &config, &observed, &curve);
        println!(
            "{}",
            crate::plot::render_ascii_plot(&chart, config.plot_width, config.plot_height)
        );
    }

    if let Some(path) = &config.svg_path {
        let curve = crate::models::sample_curve(&params, t_min, t_max, CURVE_SAMPLES);
        let chart = decay_chart(&run, &config, &observed, &curve);
        crate::plot::write_svg_chart(path, &chart, (1024, 768))?;
    }

    Ok(())
}

fn decay_chart<'a>(
    run: &pipeline::RunOutput,
    config: &AnalysisConfig,
    observed: &'a [(f64, f64)],
    curve: &'a [(f64, f64)],
) -> DecayChart<'a> {
    let main = &run.prepared.mainshock;
    DecayChart {
        title: format!(
            "Aftershock decay after M{:.1} on {}",
            main.magnitude(),
            main.time().format("%Y-%m-%d %H:%M UTC")
        ),
        observed,
        curve,
        observed_label: format!("observed daily count (M >= {:.1})", config.min_magnitude),
        model_label: crate::report::model_label(&run.outcome),
        x_label: X_LABEL,
        y_label: Y_LABEL,
        log_y: config.log_y,
    }
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let config = simulation_config_from_args(args)?;
    let catalog = crate::data::generate_catalog(&config)?;
    crate::data::write_catalog_csv(&config.output, &catalog.events)?;

    println!(
        "Wrote {} events ({} aftershocks, expected {:.1}) to {}",
        catalog.events.len(),
        catalog.aftershock_count,
        catalog.expected_aftershocks,
        config.output.display()
    );
    println!(
        "True parameters: K={} c={} p={}",
        config.params.k, config.params.c, config.params.p
    );
    Ok(())
}

pub fn analysis_config_from_args(args: &FitArgs) -> Result<AnalysisConfig, AppError> {
    if !args.delimiter.is_ascii() {
        return Err(AppError::new(2, "Delimiter must be a single ASCII character."));
    }
    if !args.min_magnitude.is_finite() {
        return Err(AppError::new(2, "Minimum magnitude must be finite."));
    }

    let fit = FitOptions {
        initial_guess: OmoriParams::from_slice(&args.initial_guess)
            .ok_or_else(|| AppError::new(2, "Initial guess needs exactly three values: K,c,p."))?,
        bounds: ParamBounds {
            k: pair(&args.k_bounds, "K")?,
            c: pair(&args.c_bounds, "c")?,
            p: pair(&args.p_bounds, "p")?,
        },
        max_evaluations: args.max_evaluations,
    };

    Ok(AnalysisConfig {
        catalog_path: args.file.clone(),
        delimiter: args.delimiter as u8,
        min_magnitude: args.min_magnitude,
        fit,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        log_y: !args.linear_y,
        svg_path: args.svg.clone(),
        show_table: args.table,
    })
}

pub fn simulation_config_from_args(args: &SimulateArgs) -> Result<SimulationConfig, AppError> {
    let mainshock_time = crate::io::ingest::parse_timestamp(&args.mainshock_time)
        .map_err(|e| AppError::new(2, format!("Invalid --mainshock-time: {e}")))?;

    Ok(SimulationConfig {
        output: args.output.clone(),
        seed: args.seed,
        mainshock_time,
        mainshock_magnitude: args.mainshock_magnitude,
        latitude: args.latitude,
        longitude: args.longitude,
        depth_km: args.depth,
        params: OmoriParams::new(args.k, args.c, args.p),
        duration_days: args.days,
        min_magnitude: args.min_magnitude,
        b_value: args.b_value,
        background_events: args.background,
    })
}

fn pair(values: &[f64], name: &str) -> Result<(f64, f64), AppError> {
    match values {
        [lo, hi] => Ok((*lo, *hi)),
        _ => Err(AppError::new(2, format!("{name} bounds need exactly two values: LO,HI."))),
    }
}

/// Rewrite argv so `omori` defaults to `omori fit`.
///
/// Rules:
/// - `omori`                         -> `omori fit`
/// - `omori -f x.csv ...`            -> `omori fit -f x.csv ...`
/// - `omori --help/--version/-h`     -> unchanged (show top-level help/version)
/// - `omori -v ...`                  -> unchanged when a subcommand follows
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = |s: &str| matches!(s, "fit" | "simulate");
    if argv.iter().skip(1).any(|a| is_subcommand(a)) {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
