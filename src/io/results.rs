//! Read/write results JSON files.
//!
//! Results JSON is the portable representation of a run:
//! - the eco level the units belong to
//! - per-unit mixture parameters and sample counts, in first-seen order
//!
//! The schema is defined by `domain::ResultsFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;

use crate::domain::{EcoLevel, FitResults, ResultsFile};
use crate::error::AppError;

/// Wrap fitted units into a results file stamped with the current time.
pub fn results_file(level: EcoLevel, units: &FitResults) -> ResultsFile {
    ResultsFile {
        tool: "wfr".to_string(),
        level,
        generated: Utc::now(),
        units: units.clone(),
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), results)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;

    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    let results: ResultsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MixtureParams, UnitFit};

    #[test]
    fn round_trips_through_disk() {
        let mut units = FitResults::new();
        units.insert(
            "12".into(),
            UnitFit {
                params: MixtureParams::new(0.25, 1.0, 310.5),
                samples: 34,
            },
        );
        units.insert(
            "4".into(),
            UnitFit {
                params: MixtureParams::new(1.0, 88.0, 1.0),
                samples: 30,
            },
        );
        let file = results_file(EcoLevel::Ecozone, &units);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_results_json(&path, &file).unwrap();
        let back = read_results_json(&path).unwrap();

        assert_eq!(back.tool, "wfr");
        assert_eq!(back.level, EcoLevel::Ecozone);
        assert_eq!(back.units, units);
        assert_eq!(back.generated, file.generated);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_results_json(Path::new("/nonexistent/results.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
