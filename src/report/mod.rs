//! Reporting utilities: run summaries and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{FitOutcome, FitResults, UnitId};

/// A unit that was left out of the results, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedUnit {
    pub unit_id: UnitId,
    pub samples: usize,
    pub reason: String,
}

/// Fitted and skipped units of one run, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: FitResults,
    pub skipped: Vec<SkippedUnit>,
}

impl RunSummary {
    pub fn units_seen(&self) -> usize {
        self.results.len() + self.skipped.len()
    }
}

/// Split per-unit outcomes into results and skips.
pub fn summarize(outcomes: &[(UnitId, FitOutcome)]) -> RunSummary {
    let mut summary = RunSummary::default();
    for (unit_id, outcome) in outcomes {
        match outcome {
            FitOutcome::Fitted(fit) => summary.results.insert(unit_id.clone(), *fit),
            FitOutcome::Skipped { samples, error } => summary.skipped.push(SkippedUnit {
                unit_id: unit_id.clone(),
                samples: *samples,
                reason: error.to_string(),
            }),
        }
    }
    summary
}
