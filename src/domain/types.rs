//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built by the CSV ingest or the synthetic sample generator
//! - passed to the fitting engine
//! - rendered by the report and export modules

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use nalgebra::DMatrix;

use crate::fit::FitterSettings;

/// Measurement kind of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    /// Elapsed effort: runtime, function evaluations, generations.
    Time,
    /// Solution quality, e.g. the best objective value found so far.
    Objective,
}

/// One typed axis of the run data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    /// Column of this dimension inside every run.
    pub index: usize,
    pub kind: DimensionKind,
    /// Display name (CSV header).
    pub name: String,
}

impl Dimension {
    pub fn new(index: usize, kind: DimensionKind, name: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            name: name.into(),
        }
    }

    pub fn is_time(&self) -> bool {
        self.kind == DimensionKind::Time
    }
}

/// Dense `m × 2` table of `(x, y)` samples taken from all runs of one instance.
///
/// Column 0 holds `x`, column 1 holds `y`. Row order follows run order, then
/// point order inside each run.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    table: DMatrix<f64>,
}

impl DataMatrix {
    /// Wrap an already assembled table.
    ///
    /// # Panics
    /// Panics if `table` does not have exactly two columns.
    pub fn from_table(table: DMatrix<f64>) -> Self {
        assert_eq!(table.ncols(), 2, "data matrix must have two columns");
        Self { table }
    }

    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let table = DMatrix::from_fn(points.len(), 2, |i, j| if j == 0 { points[i].0 } else { points[i].1 });
        Self { table }
    }

    pub fn len(&self) -> usize {
        self.table.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.nrows() == 0
    }

    pub fn x(&self, row: usize) -> f64 {
        self.table[(row, 0)]
    }

    pub fn y(&self, row: usize) -> f64 {
        self.table[(row, 1)]
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.table.nrows()).map(move |i| self.table[(i, 0)])
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.table.nrows()).map(move |i| self.table[(i, 1)])
    }

    pub fn all_finite(&self) -> bool {
        self.table.iter().all(|v| v.is_finite())
    }

    /// Stable hash of the sample values, used to seed initial-guess generators
    /// so repeated fits of the same data explore the same starting points.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.table.nrows().hash(&mut hasher);
        for v in self.table.iter() {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// `(min, max)` of the x column, or `None` when empty.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut xs = self.xs();
        let first = xs.next()?;
        Some(xs.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Configuration of a `dimfit fit` run.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    /// CSV columns that hold time measures; every other value column is an objective.
    pub time_columns: Vec<String>,
    pub x_column: String,
    pub y_column: String,
    pub export_path: Option<PathBuf>,
    pub settings: FitterSettings,
    pub grid_points: usize,
}

/// Configuration of a `dimfit demo` run on synthetic logistic data.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub runs: usize,
    pub points_per_run: usize,
    pub seed: u64,
    /// Standard deviation of the multiplicative log-normal noise.
    pub noise: f64,
    pub settings: FitterSettings,
    pub grid_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_matrix_exposes_columns() {
        let m = DataMatrix::from_points(&[(1.0, 10.0), (2.0, 5.0), (4.0, 2.5)]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.x(1), 2.0);
        assert_eq!(m.y(2), 2.5);
        assert_eq!(m.x_range(), Some((1.0, 4.0)));
        assert_eq!(m.xs().collect::<Vec<_>>(), vec![1.0, 2.0, 4.0]);
        assert_eq!(m.ys().collect::<Vec<_>>(), vec![10.0, 5.0, 2.5]);
    }

    #[test]
    fn fingerprint_depends_on_values() {
        let a = DataMatrix::from_points(&[(1.0, 2.0)]);
        let b = DataMatrix::from_points(&[(1.0, 2.5)]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
