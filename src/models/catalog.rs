//! Candidate models per dimension pairing.
//!
//! | x kind | y kind | candidates |
//! |---|---|---|
//! | time | time | quadratic |
//! | objective | objective | quadratic |
//! | time | objective | logistic over `ln x`, exponential decay |
//! | objective | time | rejected |
//!
//! List order is the tie-break priority of the multi-fitter search.

use std::sync::{Arc, OnceLock};

use crate::error::{FitError, Result};
use crate::models::{ExponentialDecay, LogisticWithOffsetOverLogX, ParametricModel, Quadratic};

/// Immutable model lists, built once and shared.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    equal_type: Vec<Arc<dyn ParametricModel>>,
    time_objective: Vec<Arc<dyn ParametricModel>>,
}

impl ModelCatalog {
    pub fn new(equal_type: Vec<Arc<dyn ParametricModel>>, time_objective: Vec<Arc<dyn ParametricModel>>) -> Self {
        Self {
            equal_type,
            time_objective,
        }
    }

    /// The process-wide standard catalog.
    pub fn standard() -> Arc<ModelCatalog> {
        static STANDARD: OnceLock<Arc<ModelCatalog>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let quadratic: Arc<dyn ParametricModel> = Arc::new(Quadratic);
                let logistic: Arc<dyn ParametricModel> = Arc::new(LogisticWithOffsetOverLogX);
                let decay: Arc<dyn ParametricModel> = Arc::new(ExponentialDecay);
                Arc::new(ModelCatalog::new(vec![quadratic], vec![logistic, decay]))
            })
            .clone()
    }

    /// Candidate models for modelling y as a function of x.
    pub fn select_models(&self, is_x_time: bool, is_y_time: bool) -> Result<&[Arc<dyn ParametricModel>]> {
        if is_y_time && !is_x_time {
            return Err(FitError::Configuration(
                "A time dimension cannot be modelled as a function of an objective dimension.".into(),
            ));
        }
        if is_x_time == is_y_time {
            Ok(&self.equal_type)
        } else {
            Ok(&self.time_objective)
        }
    }

    /// Look up a model by its stable name (used when restoring persisted fits).
    pub fn find(&self, name: &str) -> Option<Arc<dyn ParametricModel>> {
        self.equal_type
            .iter()
            .chain(self.time_objective.iter())
            .find(|m| m.name() == name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(models: &[Arc<dyn ParametricModel>]) -> Vec<&'static str> {
        models.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn objective_as_function_of_objective_is_quadratic() {
        let cat = ModelCatalog::standard();
        assert_eq!(names(cat.select_models(false, false).unwrap()), vec!["quadratic"]);
        assert_eq!(names(cat.select_models(true, true).unwrap()), vec!["quadratic"]);
    }

    #[test]
    fn time_objective_catalog_order() {
        let cat = ModelCatalog::standard();
        assert_eq!(
            names(cat.select_models(true, false).unwrap()),
            vec!["logistic-offset-log-x", "exponential-decay"]
        );
    }

    #[test]
    fn time_over_objective_is_rejected() {
        let err = ModelCatalog::standard().select_models(false, true).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
    }

    #[test]
    fn selections_are_reference_stable() {
        let a = ModelCatalog::standard();
        let b = ModelCatalog::standard();
        assert!(Arc::ptr_eq(&a, &b));
        let first = a.select_models(true, false).unwrap();
        let second = b.select_models(true, false).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn find_by_name() {
        let cat = ModelCatalog::standard();
        assert_eq!(cat.find("exponential-decay").unwrap().parameter_count(), 4);
        assert!(cat.find("cubic").is_none());
    }
}
