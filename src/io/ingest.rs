//! CSV ingest of run data.
//!
//! Expected layout: one row per measurement tuple, a `run` column naming the
//! run the tuple belongs to, and one numeric column per dimension:
//!
//! ```text
//! run,FEs,f
//! 1,10,812.5
//! 1,100,97.1
//! 2,10,790.0
//! ```
//!
//! Rows are grouped into runs by their `run` value, in order of first
//! appearance; tuple order inside a run follows file order. Columns listed as
//! time columns become `Time` dimensions, every other value column an
//! `Objective` dimension.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Dimension, DimensionKind, InstanceRuns, Run};
use crate::error::{FitError, Result};

const RUN_COLUMN: &str = "run";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the runs, their typed dimensions and row statistics.
#[derive(Debug)]
pub struct IngestedRuns {
    pub runs: InstanceRuns,
    /// Value columns in header order; `index` is the position inside each tuple.
    pub dimensions: Vec<Dimension>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedRuns {
    /// Look up a dimension by its column name (case-insensitive).
    pub fn dimension(&self, name: &str) -> Result<&Dimension> {
        let wanted = normalize_header_name(name);
        self.dimensions
            .iter()
            .find(|d| normalize_header_name(&d.name) == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = self.dimensions.iter().map(|d| d.name.as_str()).collect();
                FitError::Input(format!("Unknown dimension '{name}'. Available columns: {}.", known.join(", ")))
            })
    }
}

/// Load a run CSV into an [`InstanceRuns`] named after the file stem.
pub fn load_instance_runs(path: &Path, time_columns: &[String]) -> Result<IngestedRuns> {
    let file = File::open(path)
        .map_err(|e| FitError::Input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| FitError::Input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let (run_col, dimensions, value_cols) = resolve_columns(&headers, time_columns)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, run_col, &value_cols, &dimensions) {
            Ok((key, values)) => {
                let group = groups.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                });
                group.extend(values);
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows_used == 0 {
        return Err(FitError::Input(format!(
            "No valid rows in '{}' ({} read, {} rejected).",
            path.display(),
            rows_read,
            row_errors.len()
        )));
    }
    if !row_errors.is_empty() {
        tracing::warn!(rejected = row_errors.len(), rows_read, "some CSV rows were skipped");
    }

    let d = dimensions.len();
    let mut runs = Vec::with_capacity(order.len());
    for key in &order {
        let values = groups.remove(key).unwrap_or_default();
        runs.push(Run::from_flat(d, values)?);
    }

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());
    tracing::debug!(instance = %id, runs = runs.len(), rows_used, "loaded run data");

    Ok(IngestedRuns {
        runs: InstanceRuns::new(id, runs),
        dimensions,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Locate the run column and classify every other column as a dimension.
fn resolve_columns(headers: &StringRecord, time_columns: &[String]) -> Result<(usize, Vec<Dimension>, Vec<usize>)> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let run_col = names
        .iter()
        .position(|n| n == RUN_COLUMN)
        .ok_or_else(|| FitError::Input(format!("CSV is missing the required '{RUN_COLUMN}' column.")))?;

    let wanted_time: Vec<String> = time_columns.iter().map(|c| normalize_header_name(c)).collect();
    for (given, wanted) in time_columns.iter().zip(&wanted_time) {
        if !names.iter().any(|n| n == wanted) {
            return Err(FitError::Input(format!("Time column '{given}' is not in the CSV header.")));
        }
    }

    let mut dimensions = Vec::new();
    let mut value_cols = Vec::new();
    for (col, raw) in headers.iter().enumerate() {
        if col == run_col {
            continue;
        }
        let kind = if wanted_time.contains(&names[col]) {
            DimensionKind::Time
        } else {
            DimensionKind::Objective
        };
        let name = raw.trim().trim_start_matches('\u{feff}');
        dimensions.push(Dimension::new(dimensions.len(), kind, name));
        value_cols.push(col);
    }

    if dimensions.is_empty() {
        return Err(FitError::Input("CSV has no value columns besides 'run'.".into()));
    }
    Ok((run_col, dimensions, value_cols))
}

fn parse_row(
    record: &StringRecord,
    run_col: usize,
    value_cols: &[usize],
    dimensions: &[Dimension],
) -> std::result::Result<(String, Vec<f64>), String> {
    let key = record.get(run_col).unwrap_or("").to_string();
    if key.is_empty() {
        return Err("missing run id".into());
    }

    let mut values = Vec::with_capacity(value_cols.len());
    for (col, dim) in value_cols.iter().zip(dimensions) {
        let cell = record.get(*col).unwrap_or("");
        let v: f64 = cell
            .parse()
            .map_err(|_| format!("invalid {} value '{cell}'", dim.name))?;
        if !v.is_finite() {
            return Err(format!("non-finite {} value '{cell}'", dim.name));
        }
        values.push(v);
    }
    Ok((key, values))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
