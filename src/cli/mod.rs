//! Command-line parsing for the Omori aftershock decay fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_CATALOG_PATH, DEFAULT_MAX_EVALUATIONS, DEFAULT_MIN_MAGNITUDE};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "omori", version, about = "Aftershock decay fitting with the modified Omori law")]
pub struct Cli {
    /// More log output (debug level).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Less log output (warnings only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit N(t) = K / (t + c)^p to a catalog and print the report.
    Fit(FitArgs),
    /// Write a synthetic aftershock catalog drawn from a known Omori law.
    Simulate(SimulateArgs),
}

/// Options for `omori fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Earthquake catalog (CSV with Time and Magnitude columns).
    #[arg(short = 'f', long = "file", env = "OMORI_CATALOG", default_value = DEFAULT_CATALOG_PATH)]
    pub file: PathBuf,

    /// Field delimiter of the catalog.
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Completeness threshold: aftershocks below this magnitude are ignored.
    #[arg(short = 'm', long, default_value_t = DEFAULT_MIN_MAGNITUDE)]
    pub min_magnitude: f64,

    /// Initial guess as K,c,p.
    #[arg(long, value_delimiter = ',', value_name = "K,C,P", default_values_t = [1000.0, 1.0, 1.0])]
    pub initial_guess: Vec<f64>,

    /// Bounds for K as LO,HI.
    #[arg(long, value_delimiter = ',', value_name = "LO,HI", default_values_t = [0.1, 50_000.0])]
    pub k_bounds: Vec<f64>,

    /// Bounds for c (days) as LO,HI.
    #[arg(long, value_delimiter = ',', value_name = "LO,HI", default_values_t = [0.0, 15.0])]
    pub c_bounds: Vec<f64>,

    /// Bounds for p as LO,HI.
    #[arg(long, value_delimiter = ',', value_name = "LO,HI", default_values_t = [0.5, 3.0])]
    pub p_bounds: Vec<f64>,

    /// Solver budget (model evaluations).
    #[arg(long, default_value_t = DEFAULT_MAX_EVALUATIONS)]
    pub max_evaluations: usize,

    /// Print the daily series with observed and fitted counts.
    #[arg(long)]
    pub table: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Use a linear instead of a logarithmic y-axis.
    #[arg(long)]
    pub linear_y: bool,

    /// Also write the chart as SVG.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,
}

/// Options for `omori simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "synthetic_catalog.csv")]
    pub output: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Mainshock time (RFC 3339 or `YYYY-MM-DD HH:MM:SS`, UTC).
    #[arg(long, default_value = "2016-08-24T01:36:32Z")]
    pub mainshock_time: String,

    /// Mainshock magnitude.
    #[arg(long, default_value_t = 6.0)]
    pub mainshock_magnitude: f64,

    /// Epicenter latitude.
    #[arg(long, default_value_t = 42.70, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Epicenter longitude.
    #[arg(long, default_value_t = 13.23, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Mainshock depth (km).
    #[arg(long, default_value_t = 8.0)]
    pub depth: f64,

    /// True K (aftershocks per day at t = 1 - c).
    #[arg(short = 'k', long, default_value_t = 300.0)]
    pub k: f64,

    /// True c (days).
    #[arg(short = 'c', long, default_value_t = 0.5)]
    pub c: f64,

    /// True p.
    #[arg(short = 'p', long, default_value_t = 1.1)]
    pub p: f64,

    /// Length of the aftershock sequence (days).
    #[arg(long, default_value_t = 60.0)]
    pub days: f64,

    /// Smallest generated magnitude.
    #[arg(long, default_value_t = DEFAULT_MIN_MAGNITUDE)]
    pub min_magnitude: f64,

    /// Gutenberg-Richter b-value.
    #[arg(long, default_value_t = 1.0)]
    pub b_value: f64,

    /// Unrelated events spread over the week before the mainshock.
    #[arg(long, default_value_t = 20)]
    pub background: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults() {
        let cli = Cli::try_parse_from(["omori", "fit"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.initial_guess, vec![1000.0, 1.0, 1.0]);
        assert_eq!(args.c_bounds, vec![0.0, 15.0]);
        assert_eq!(args.min_magnitude, 2.0);
        assert!(!args.no_plot);
    }

    #[test]
    fn comma_separated_triples() {
        let cli = Cli::try_parse_from([
            "omori",
            "fit",
            "--initial-guess",
            "500,0.5,1.2",
            "--p-bounds",
            "0.8,2.0",
            "-f",
            "catalog.csv",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.initial_guess, vec![500.0, 0.5, 1.2]);
        assert_eq!(args.p_bounds, vec![0.8, 2.0]);
        assert_eq!(args.file, PathBuf::from("catalog.csv"));
    }

    #[test]
    fn value_count_is_left_to_config_mapping() {
        // Wrong arity parses; `analysis_config_from_args` rejects it with exit code 2.
        let cli = Cli::try_parse_from(["omori", "fit", "--initial-guess", "1,2", "--c-bounds", "5,1"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.initial_guess, vec![1.0, 2.0]);
        assert_eq!(args.c_bounds, vec![5.0, 1.0]);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["omori", "-v", "-q", "fit"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
