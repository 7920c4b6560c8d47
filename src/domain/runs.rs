//! Run data: the measurement tuples recorded by repeated algorithm runs.

use crate::cache::{AttributeCache, CacheOwner};
use crate::error::{FitError, Result};

/// Read access to one run's measurements.
///
/// Implemented by [`Run`]; data matrix assembly is written against this trait
/// so alternative providers can be plugged in.
pub trait RunData {
    /// Number of measurement tuples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of components per tuple.
    fn dimension_count(&self) -> usize;

    /// Component `dimension` of tuple `point`.
    fn value_at(&self, point: usize, dimension: usize) -> f64;
}

/// An immutable sequence of measurement tuples, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    dimension_count: usize,
    values: Vec<f64>,
}

impl Run {
    /// Build a run from row-major values.
    pub fn from_flat(dimension_count: usize, values: Vec<f64>) -> Result<Self> {
        if dimension_count == 0 {
            return Err(FitError::Configuration("A run needs at least one dimension.".into()));
        }
        if values.len() % dimension_count != 0 {
            return Err(FitError::Configuration(format!(
                "Run has {} values, not a multiple of {dimension_count} dimensions.",
                values.len()
            )));
        }
        Ok(Self {
            dimension_count,
            values,
        })
    }

    /// Build a run from one tuple per point.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(FitError::Configuration("A run needs at least one point.".into()));
        };
        let d = first.len();
        let mut values = Vec::with_capacity(rows.len() * d);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(FitError::Configuration(format!(
                    "Point {i} has {} components, expected {d}.",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::from_flat(d, values)
    }
}

impl RunData for Run {
    fn len(&self) -> usize {
        self.values.len() / self.dimension_count
    }

    fn dimension_count(&self) -> usize {
        self.dimension_count
    }

    /// # Panics
    /// Panics if `point` or `dimension` is out of range.
    fn value_at(&self, point: usize, dimension: usize) -> f64 {
        assert!(dimension < self.dimension_count, "dimension {dimension} out of range");
        self.values[point * self.dimension_count + dimension]
    }
}

/// All runs recorded for one benchmark instance.
///
/// This is the owner that derived attributes (fitted relationship models) are
/// cached against; the cache lives exactly as long as the instance.
#[derive(Debug)]
pub struct InstanceRuns {
    id: String,
    runs: Vec<Run>,
    cache: AttributeCache,
}

impl InstanceRuns {
    pub fn new(id: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            id: id.into(),
            runs,
            cache: AttributeCache::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Total number of measurement tuples across all runs.
    pub fn point_count(&self) -> usize {
        self.runs.iter().map(RunData::len).sum()
    }
}

impl CacheOwner for InstanceRuns {
    fn attribute_cache(&self) -> &AttributeCache {
        &self.cache
    }
}
