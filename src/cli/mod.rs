//! Command-line parsing for the wildfire recurrence estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{DEFAULT_FRACTION_COLUMN, EcoLevel};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wfr", version, about = "Wildfire recurrence-interval estimator for ecological units")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit recurrence distributions for every unit of an annual statistics CSV.
    Fit(FitArgs),
    /// Print a previously exported results JSON.
    Show(ShowArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Annual statistics CSV (one row per unit and year).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Ecological level the rows are grouped by.
    #[arg(short = 'l', long, value_enum, default_value_t = EcoLevel::Ecozone)]
    pub level: EcoLevel,

    /// Unit id column (defaults to ECOZONE / ECOPROVINCE / ECOREGION per level).
    #[arg(long)]
    pub unit_column: Option<String>,

    /// Annual land-area fraction burned column.
    #[arg(long, default_value = DEFAULT_FRACTION_COLUMN)]
    pub fraction_column: String,

    /// Largest empirical PMF (years) built per unit.
    #[arg(long, default_value_t = 10_000_000)]
    pub max_support_len: usize,

    /// Largest PMF passed to the curve fit.
    #[arg(long, default_value_t = 10_000_000)]
    pub max_fit_points: usize,

    /// Cost evaluation budget of the least-squares solver.
    #[arg(long, default_value_t = 300)]
    pub max_evaluations: usize,

    /// Export results to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Export per-unit results to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,
}

/// Options for printing saved results.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Results JSON produced by `wfr fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,
}
