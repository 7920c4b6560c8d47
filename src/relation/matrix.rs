//! Data matrix assembly: the `(x, y)` samples of two dimensions across all runs.

use nalgebra::DMatrix;

use crate::domain::{DataMatrix, InstanceRuns, RunData};
use crate::error::{FitError, Result};

/// Stack `(value_at(p, dim_x), value_at(p, dim_y))` for every point of every
/// run, in run order then point order.
///
/// The table is sized from the providers' reported lengths; a provider that
/// yields a different number of points than it reported is an internal
/// consistency error.
pub fn assemble_matrix<R: RunData>(runs: &[R], dim_x: usize, dim_y: usize) -> Result<DataMatrix> {
    for (r, run) in runs.iter().enumerate() {
        let d = run.dimension_count();
        if dim_x >= d || dim_y >= d {
            return Err(FitError::Configuration(format!(
                "Run {r} has {d} dimensions; cannot relate dimension {dim_x} to {dim_y}."
            )));
        }
    }

    let expected: usize = runs.iter().map(RunData::len).sum();
    let mut table = DMatrix::zeros(expected, 2);
    let mut written = 0usize;
    for run in runs {
        for p in 0..run.len() {
            if written >= expected {
                written += 1;
                continue;
            }
            table[(written, 0)] = run.value_at(p, dim_x);
            table[(written, 1)] = run.value_at(p, dim_y);
            written += 1;
        }
    }

    if written != expected {
        return Err(FitError::InternalConsistency(format!(
            "Data matrix sized for {expected} points but runs produced {written}."
        )));
    }
    Ok(DataMatrix::from_table(table))
}

/// Data matrix of `dim_y` against `dim_x` over all runs of `owner`.
pub fn build_data_matrix(owner: &InstanceRuns, dim_x: usize, dim_y: usize) -> Result<DataMatrix> {
    assemble_matrix(owner.runs(), dim_x, dim_y)
}
