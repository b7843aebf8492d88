//! Per-unit estimation over an annual statistics table.
//!
//! For every spatial unit, in the order units first appear in the table:
//!
//! 1. collect its burn fractions (`samples` = row count)
//! 2. build the empirical PMF
//! 3. fit the exponential mixture to it
//!
//! Failures are local to a unit: it is logged with `warn!` and left out of the
//! results, and the next unit is processed. Only invalid settings abort.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::domain::{EstimateConfig, FitOutcome, FitResults, MixtureParams, Observation, UnitFit, UnitId};
use crate::error::{EstimateError, Stage};
use crate::fit::empirical::build_empirical_pmf;
use crate::fit::fitter::fit_mixture;

/// Burn fractions of one spatial unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSeries {
    pub unit_id: UnitId,
    pub burn_fractions: Vec<f64>,
}

/// Group rows by unit id, keeping first-seen unit order and row order within a unit.
pub fn group_by_unit(observations: &[Observation]) -> Vec<UnitSeries> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<UnitSeries> = Vec::new();
    for obs in observations {
        let slot = *index.entry(obs.unit_id.as_str()).or_insert_with(|| {
            out.push(UnitSeries {
                unit_id: obs.unit_id.clone(),
                burn_fractions: Vec::new(),
            });
            out.len() - 1
        });
        out[slot].burn_fractions.push(obs.burn_fraction);
    }
    out
}

/// Estimate the mixture for a single unit's burn fractions.
pub fn estimate_unit(burn_fractions: &[f64], config: &EstimateConfig) -> Result<MixtureParams, EstimateError> {
    let pmf = build_empirical_pmf(burn_fractions, config.max_support_len)?;
    let fit = fit_mixture(&pmf.support, &pmf.pmf, &config.fit)?;
    Ok(fit.params)
}

/// Fit every unit and return the successful ones, in first-seen order.
pub fn fit_wildfire_statistics(
    observations: &[Observation],
    config: &EstimateConfig,
) -> Result<FitResults, EstimateError> {
    let outcomes = fit_wildfire_statistics_detailed(observations, config)?;
    let mut results = FitResults::new();
    for (unit_id, outcome) in outcomes {
        if let FitOutcome::Fitted(fit) = outcome {
            results.insert(unit_id, fit);
        }
    }
    Ok(results)
}

/// Like `fit_wildfire_statistics`, but keeps skipped units and their reason.
pub fn fit_wildfire_statistics_detailed(
    observations: &[Observation],
    config: &EstimateConfig,
) -> Result<Vec<(UnitId, FitOutcome)>, EstimateError> {
    config.validate()?;

    let mut outcomes = Vec::new();
    for series in group_by_unit(observations) {
        info!(unit = %series.unit_id, "eco-unit");
        let samples = series.burn_fractions.len();

        let outcome = match fit_unit(&series, config) {
            Ok(params) => {
                info!(
                    unit = %series.unit_id,
                    w = params.w,
                    scale1 = params.scale1,
                    scale2 = params.scale2,
                    samples,
                    "fitted params"
                );
                FitOutcome::Fitted(UnitFit { params, samples })
            }
            Err(error) if error.is_recoverable() => FitOutcome::Skipped { samples, error },
            Err(error) => return Err(error),
        };
        outcomes.push((series.unit_id, outcome));
    }
    Ok(outcomes)
}

fn fit_unit(series: &UnitSeries, config: &EstimateConfig) -> Result<MixtureParams, EstimateError> {
    let unit = &series.unit_id;

    let pmf = build_empirical_pmf(&series.burn_fractions, config.max_support_len).inspect_err(|err| {
        match err {
            EstimateError::ResourceExhausted { .. } => {
                warn!(unit = %unit, "building the empirical pmf exhausted resources for {unit}: {err}")
            }
            _ => warn!(unit = %unit, "skipping {unit}: {err}"),
        }
    })?;

    let fit = fit_mixture(&pmf.support, &pmf.pmf, &config.fit).inspect_err(|err| match err {
        EstimateError::ResourceExhausted {
            stage: Stage::CurveFit,
            ..
        } => warn!(
            unit = %unit,
            pmf_len = pmf.len(),
            "curve fit exhausted resources for pmf of length {}", pmf.len()
        ),
        _ => warn!(unit = %unit, pmf_len = pmf.len(), "curve fit failed for {unit}: {err}"),
    })?;

    Ok(fit.params)
}
