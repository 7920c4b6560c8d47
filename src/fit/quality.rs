//! Weighted root-mean-square fitting quality.
//!
//! For samples `(x_i, y_i)`, `i = 1..m`, and parameters `p`:
//!
//! ```text
//! r_i     = w_i · (f(x_i; p) − y_i)
//! quality = sqrt(Σ r_i² / m)
//! ```
//!
//! The weights `w_i = 1 / max(|y_i|, floor)` turn the residuals into relative
//! errors, so a run that ends at `f = 1e-8` counts as much as its start at
//! `f = 1e3`. `floor` is the smallest non-zero `|y|` in the data (or `1` if every
//! `y` is zero), which keeps exact-zero targets finite.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::domain::DataMatrix;
use crate::error::{FitError, Result};
use crate::models::ParametricModel;

/// Scalar goodness-of-fit over one data matrix; lower is better.
///
/// Quality values are only comparable between evaluations of the same measure.
#[derive(Debug, Clone)]
pub struct QualityMeasure {
    data: Arc<DataMatrix>,
    weights: Arc<[f64]>,
}

impl QualityMeasure {
    pub fn new(data: Arc<DataMatrix>) -> Self {
        let floor = data
            .ys()
            .map(f64::abs)
            .filter(|v| *v > 0.0 && v.is_finite())
            .fold(f64::INFINITY, f64::min);
        let floor = if floor.is_finite() { floor } else { 1.0 };
        let weights = data.ys().map(|y| 1.0 / y.abs().max(floor)).collect();
        Self { data, weights }
    }

    pub fn data(&self) -> &DataMatrix {
        &self.data
    }

    pub fn shared_data(&self) -> &Arc<DataMatrix> {
        &self.data
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Quality of `params`; non-finite outcomes are errors, never large numbers.
    pub fn evaluate(&self, model: &dyn ParametricModel, params: &[f64]) -> Result<f64> {
        self.check_shape(model, params)?;
        let m = self.data.len();
        let mut sum = 0.0;
        for i in 0..m {
            let r = self.weights[i] * (model.value(self.data.x(i), params) - self.data.y(i));
            sum += r * r;
        }
        let quality = (sum / m as f64).sqrt();
        if quality.is_finite() {
            Ok(quality)
        } else {
            Err(FitError::FitFailure(format!(
                "{} produced a non-finite quality for parameters {params:?}",
                model.name()
            )))
        }
    }

    /// Fill `eval` with weighted residuals, Jacobian and error norms.
    ///
    /// Buffers inside `eval` are reused when the shape matches the previous call.
    pub fn evaluate_into(&self, model: &dyn ParametricModel, params: &[f64], eval: &mut FittingEvaluation) -> Result<()> {
        self.check_shape(model, params)?;
        let m = self.data.len();
        let n = params.len();
        eval.prepare(m, n);

        let mut sum = 0.0;
        for i in 0..m {
            let x = self.data.x(i);
            let w = self.weights[i];
            model.gradient(x, params, &mut eval.gradient);
            let r = w * (model.value(x, params) - self.data.y(i));
            eval.residuals[i] = r;
            sum += r * r;
            for j in 0..n {
                eval.jacobian[(i, j)] = w * eval.gradient[j];
            }
        }

        eval.root_sum_squared_error = sum.sqrt();
        eval.root_mean_square_error = eval.root_sum_squared_error / (m as f64).sqrt();
        eval.quality = eval.root_mean_square_error;

        if eval.quality.is_finite() && eval.jacobian.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(FitError::FitFailure(format!(
                "{} produced non-finite residuals or derivatives for parameters {params:?}",
                model.name()
            )))
        }
    }

    fn check_shape(&self, model: &dyn ParametricModel, params: &[f64]) -> Result<()> {
        if self.data.is_empty() {
            return Err(FitError::FitFailure("cannot evaluate a fit on empty data".into()));
        }
        if params.len() != model.parameter_count() {
            return Err(FitError::FitFailure(format!(
                "{} expects {} parameters, got {}",
                model.name(),
                model.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

/// Scratch record of one detailed evaluation.
///
/// The arrays are overwritten by the next `evaluate_into` call on the same record.
#[derive(Debug, Clone)]
pub struct FittingEvaluation {
    jacobian: DMatrix<f64>,
    residuals: DVector<f64>,
    gradient: Vec<f64>,
    root_sum_squared_error: f64,
    root_mean_square_error: f64,
    quality: f64,
}

impl Default for FittingEvaluation {
    fn default() -> Self {
        Self {
            jacobian: DMatrix::zeros(0, 0),
            residuals: DVector::zeros(0),
            gradient: Vec::new(),
            root_sum_squared_error: f64::NAN,
            root_mean_square_error: f64::NAN,
            quality: f64::NAN,
        }
    }
}

impl FittingEvaluation {
    /// Weighted `∂r_i/∂p_j`, shape `m × n`.
    pub fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    /// Weighted residuals `w_i · (f(x_i) − y_i)`.
    pub fn residuals(&self) -> &DVector<f64> {
        &self.residuals
    }

    pub fn root_sum_squared_error(&self) -> f64 {
        self.root_sum_squared_error
    }

    pub fn root_mean_square_error(&self) -> f64 {
        self.root_mean_square_error
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    fn prepare(&mut self, m: usize, n: usize) {
        if self.jacobian.shape() != (m, n) {
            self.jacobian = DMatrix::zeros(m, n);
        }
        if self.residuals.len() != m {
            self.residuals = DVector::zeros(m);
        }
        self.gradient.resize(n, 0.0);
    }
}
