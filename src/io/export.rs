//! Export per-unit results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{EcoLevel, FitResults, ecozone_name};
use crate::error::AppError;
use crate::models::mixture_mean;

/// Write per-unit results to a CSV file.
pub fn write_results_csv(path: &Path, results: &FitResults, level: EcoLevel) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results_csv_to(BufWriter::new(file), results, level)
}

/// Write per-unit results as CSV into any writer.
pub fn write_results_csv_to<W: Write>(mut out: W, results: &FitResults, level: EcoLevel) -> Result<(), AppError> {
    writeln!(out, "unit_id,name,w,scale1,scale2,mean_interval,samples")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (unit_id, fit) in results.iter() {
        let name = match level {
            EcoLevel::Ecozone => ecozone_name(unit_id).unwrap_or(""),
            _ => "",
        };
        let p = &fit.params;
        writeln!(
            out,
            "{},{},{:.10},{:.10},{:.10},{:.6},{}",
            unit_id,
            name,
            p.w,
            p.scale1,
            p.scale2,
            mixture_mean(p),
            fit.samples,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MixtureParams, UnitFit};

    #[test]
    fn writes_named_ecozone_rows() {
        let mut results = FitResults::new();
        results.insert(
            "6".into(),
            UnitFit {
                params: MixtureParams::new(0.5, 2.0, 10.0),
                samples: 34,
            },
        );
        let mut buf = Vec::new();
        write_results_csv_to(&mut buf, &results, EcoLevel::Ecozone).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "unit_id,name,w,scale1,scale2,mean_interval,samples");
        assert_eq!(
            lines[1],
            "6,Boreal Shield,0.5000000000,2.0000000000,10.0000000000,6.000000,34"
        );
    }

    #[test]
    fn other_levels_have_no_names() {
        let mut results = FitResults::new();
        results.insert(
            "6".into(),
            UnitFit {
                params: MixtureParams::new(1.0, 3.0, 1.0),
                samples: 2,
            },
        );
        let mut buf = Vec::new();
        write_results_csv_to(&mut buf, &results, EcoLevel::Ecoregion).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("6,,1.0000000000"));
    }
}
