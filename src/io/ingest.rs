//! CSV ingest of annual burned-area statistics.
//!
//! Turns a table with (at least) a spatial-unit id column and a land-area
//! fraction column into `Observation`s.
//!
//! Design goals:
//! - **Strict schema** for the two required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip unparsable rows, but report what happened)
//! - **No range checks here**: a fraction outside `(0, 1]` is passed through so
//!   the estimator can skip just that unit

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Observation, UnitId};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub unit_id: Option<UnitId>,
    pub message: String,
}

/// Ingest output: observations + row errors + counters.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Unit column as spelled in the file header.
    pub unit_column: String,
}

/// Load observations from a CSV file.
pub fn load_observations(path: &Path, unit_column: &str, fraction_column: &str) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_observations(file, unit_column, fraction_column)
}

/// Read observations from any CSV source.
pub fn read_observations<R: Read>(
    source: R,
    unit_column: &str,
    fraction_column: &str,
) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let unit_idx = require_column(&header_map, unit_column)?;
    let fraction_idx = require_column(&header_map, fraction_column)?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    unit_id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, unit_idx, fraction_idx) {
            Ok(obs) => observations.push(obs),
            Err((unit_id, message)) => row_errors.push(RowError {
                line,
                unit_id,
                message,
            }),
        }
    }

    for err in &row_errors {
        warn!(line = err.line, unit = ?err.unit_id, "skipping row: {}", err.message);
    }

    let rows_used = observations.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows in the input table."));
    }
    debug!(rows_read, rows_used, "ingested annual statistics");

    Ok(IngestedData {
        observations,
        row_errors,
        rows_read,
        rows_used,
        unit_column: headers
            .get(unit_idx)
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .unwrap_or_else(|| unit_column.to_string()),
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicate headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
}

fn parse_row(
    record: &StringRecord,
    unit_idx: usize,
    fraction_idx: usize,
) -> Result<Observation, (Option<UnitId>, String)> {
    let unit_id = record
        .get(unit_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_unit_id)
        .ok_or_else(|| (None, "Missing unit id.".to_string()))?;

    let raw = record
        .get(fraction_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| (Some(unit_id.clone()), "Missing burn fraction.".to_string()))?;

    let burn_fraction = raw
        .parse::<f64>()
        .map_err(|_| (Some(unit_id.clone()), format!("Invalid burn fraction '{raw}'.")))?;

    Ok(Observation {
        unit_id,
        burn_fraction,
    })
}

/// Integral floats (`"6.0"`, as exported from dataframes) become `"6"`.
fn normalize_unit_id(raw: &str) -> UnitId {
    if raw.contains('.') {
        if let Ok(v) = raw.parse::<f64>() {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                return format!("{}", v as i64);
            }
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_and_reports_bad_ones() {
        let csv = "\u{feff}ECOZONE,YEAR,LAND_AREA_FRACTION\n\
                   6,1990,0.01\n\
                   6.0,1991,0.002\n\
                   9,1990,abc\n\
                   ,1990,0.1\n\
                   9,1991,0\n";
        let data = read_observations(csv.as_bytes(), "ecozone", "LAND_AREA_FRACTION").unwrap();

        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 3);
        assert_eq!(data.unit_column, "ECOZONE");
        assert_eq!(data.observations[0], Observation::new("6", 0.01));
        assert_eq!(data.observations[1], Observation::new("6", 0.002));
        // Out-of-range values are passed through to the estimator.
        assert_eq!(data.observations[2], Observation::new("9", 0.0));

        assert_eq!(data.row_errors.len(), 2);
        assert_eq!(data.row_errors[0].line, 4);
        assert_eq!(data.row_errors[0].unit_id.as_deref(), Some("9"));
        assert_eq!(data.row_errors[1].line, 5);
        assert_eq!(data.row_errors[1].unit_id, None);
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let csv = "ECOREGION,LAND_AREA_FRACTION\n1,0.5\n";
        let err = read_observations(csv.as_bytes(), "ECOZONE", "LAND_AREA_FRACTION").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("ECOZONE"));
    }

    #[test]
    fn no_usable_rows() {
        let csv = "ECOZONE,LAND_AREA_FRACTION\n1,\n";
        let err = read_observations(csv.as_bytes(), "ECOZONE", "LAND_AREA_FRACTION").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unit_ids_keep_text_form() {
        assert_eq!(normalize_unit_id("12"), "12");
        assert_eq!(normalize_unit_id("12.0"), "12");
        assert_eq!(normalize_unit_id("12.5"), "12.5");
        assert_eq!(normalize_unit_id("Boreal.Shield"), "Boreal.Shield");
    }
}
