//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - runs ingest + estimation
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FitArgs, ShowArgs};
use crate::domain::{EstimateConfig, RunConfig};
use crate::error::AppError;
use crate::fit::FitOptions;

pub mod pipeline;

/// Entry point for the `wfr` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.summary, &config)
    );
    println!(
        "{}",
        crate::report::format_params_table(&run.summary.results, config.level)
    );

    if let Some(path) = &config.export_json {
        let file = crate::io::results_file(config.level, &run.summary.results);
        crate::io::write_results_json(path, &file)?;
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_results_csv(path, &run.summary.results, config.level)?;
    }

    if run.summary.results.is_empty() {
        return Err(AppError::new(4, "No spatial unit could be fitted."));
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::read_results_json(&args.results)?;
    println!("{}", crate::report::format_results_file(&file));
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        csv_path: args.csv.clone(),
        level: args.level,
        unit_column: args.unit_column.clone(),
        fraction_column: args.fraction_column.clone(),
        estimate: EstimateConfig {
            max_support_len: args.max_support_len,
            fit: FitOptions {
                max_fit_points: args.max_fit_points,
                max_evaluations: args.max_evaluations,
                ..FitOptions::default()
            },
        },
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    }
}
