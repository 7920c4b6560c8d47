//! Fitted model parameters and their quality.

use std::sync::Arc;

use crate::models::ParametricModel;

/// Outcome of fitting one model to one data matrix.
///
/// Immutable once built; the cache hands it out behind an `Arc` and callers
/// only ever see the parameters as a read-only slice.
#[derive(Debug, Clone)]
pub struct FittingResult {
    quality: f64,
    parameters: Vec<f64>,
    model: Arc<dyn ParametricModel>,
}

impl FittingResult {
    pub fn new(quality: f64, parameters: Vec<f64>, model: Arc<dyn ParametricModel>) -> Self {
        Self {
            quality,
            parameters,
            model,
        }
    }

    /// Lower is better; only comparable with results of the same quality measure.
    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn fitted_parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn model(&self) -> &Arc<dyn ParametricModel> {
        &self.model
    }

    /// Evaluate the fitted curve at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.model.value(x, &self.parameters)
    }
}

impl PartialEq for FittingResult {
    fn eq(&self, other: &Self) -> bool {
        self.quality == other.quality
            && self.parameters == other.parameters
            && self.model.name() == other.model.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExponentialDecay, Quadratic};

    #[test]
    fn equality_includes_the_model() {
        let a = FittingResult::new(0.1, vec![1.0, 2.0, 3.0], Arc::new(Quadratic));
        let b = FittingResult::new(0.1, vec![1.0, 2.0, 3.0], Arc::new(Quadratic));
        let c = FittingResult::new(0.1, vec![1.0, 2.0, 3.0], Arc::new(ExponentialDecay));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.predict(2.0), 1.0 + 4.0 + 12.0);
    }
}
