//! Shared fit pipeline: CSV ingest -> per-unit estimation -> summary.
//!
//! Front-ends (the CLI today) only deal with presentation.

use crate::domain::RunConfig;
use crate::error::AppError;
use crate::fit::fit_wildfire_statistics_detailed;
use crate::io::ingest::{IngestedData, load_observations};
use crate::report::{RunSummary, summarize};

/// All computed outputs of a single `wfr fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub summary: RunSummary,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    let ingest = load_observations(
        &config.csv_path,
        config.resolved_unit_column(),
        &config.fraction_column,
    )?;
    run_fit_with_ingest(config, ingest)
}

/// Execute the estimation stage on already ingested rows.
pub fn run_fit_with_ingest(config: &RunConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let outcomes = fit_wildfire_statistics_detailed(&ingest.observations, &config.estimate)?;
    let summary = summarize(&outcomes);
    Ok(RunOutput { ingest, summary })
}
