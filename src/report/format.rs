//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized

use crate::domain::{EcoLevel, FitResults, ResultsFile, RunConfig, ecozone_name};
use crate::io::ingest::IngestedData;
use crate::models::{mixture_mean, mixture_survival};
use crate::report::RunSummary;

/// Horizon (years) for the "no fire within a century" column.
const CENTURY: f64 = 100.0;

/// Format the run summary (input stats + fitted/skipped counts + skip reasons).
pub fn format_run_summary(ingest: &IngestedData, summary: &RunSummary, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== wfr - wildfire recurrence fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Level: {} (column `{}`)\n",
        config.level.display_name(),
        ingest.unit_column
    ));
    out.push_str(&format!(
        "Rows: read={} used={} rejected={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Units: seen={} fitted={} skipped={}\n",
        summary.units_seen(),
        summary.results.len(),
        summary.skipped.len()
    ));

    if !summary.skipped.is_empty() {
        out.push_str("\nSkipped units:\n");
        for s in &summary.skipped {
            out.push_str(&format!("  {} (samples={}): {}\n", s.unit_id, s.samples, s.reason));
        }
    }
    out.push('\n');

    out
}

/// Format a saved results file header plus its table.
pub fn format_results_file(file: &ResultsFile) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} results ({}), generated {}\n\n",
        file.level.display_name(),
        file.tool,
        file.generated.to_rfc3339()
    ));
    out.push_str(&format_params_table(&file.units, file.level));
    out
}

/// Format the per-unit parameter table.
pub fn format_params_table(results: &FitResults, level: EcoLevel) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:<20} {:>8} {:>12} {:>12} {:>12} {:>10} {:>8}\n",
            "unit", "name", "w", "scale1", "scale2", "mean", "P(>100y)", "samples"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<20} {:-<8} {:-<12} {:-<12} {:-<12} {:-<10} {:-<8}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (unit_id, fit) in results.iter() {
        let name = match level {
            EcoLevel::Ecozone => ecozone_name(unit_id).unwrap_or(""),
            _ => "",
        };
        let p = &fit.params;
        out.push_str(
            format!(
                "{:<10} {:<20} {:>8.4} {:>12.3} {:>12.3} {:>12.3} {:>10.4} {:>8}\n",
                truncate(unit_id, 10),
                truncate(name, 20),
                p.w,
                p.scale1,
                p.scale2,
                mixture_mean(p),
                mixture_survival(CENTURY, p),
                fit.samples,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
