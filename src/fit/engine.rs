//! The fitting engine: a model catalog plus the multi-fitter search.

use std::sync::{Arc, OnceLock};

use crate::domain::DataMatrix;
use crate::error::Result;
use crate::fit::{FitterSettings, FittingResult, MultiFitter, QualityMeasure};
use crate::models::{ModelCatalog, ParametricModel};

#[derive(Debug, Clone)]
pub struct FittingEngine {
    catalog: Arc<ModelCatalog>,
    fitters: MultiFitter,
}

impl FittingEngine {
    pub fn new(catalog: Arc<ModelCatalog>, fitters: MultiFitter) -> Self {
        Self { catalog, fitters }
    }

    /// Shared engine with the standard catalog and default fitter settings.
    pub fn standard() -> Arc<FittingEngine> {
        static STANDARD: OnceLock<Arc<FittingEngine>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                Arc::new(FittingEngine::new(
                    ModelCatalog::standard(),
                    MultiFitter::standard(FitterSettings::default()),
                ))
            })
            .clone()
    }

    /// Standard catalog with fitters tuned by `settings`.
    pub fn with_settings(settings: FitterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(ModelCatalog::standard(), MultiFitter::standard(settings)))
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    pub fn fitters(&self) -> &MultiFitter {
        &self.fitters
    }

    pub fn models_for(&self, is_x_time: bool, is_y_time: bool) -> Result<&[Arc<dyn ParametricModel>]> {
        self.catalog.select_models(is_x_time, is_y_time)
    }

    /// Fit `models` to `data`, returning the winner and the measure it was scored with.
    pub fn fit(&self, models: &[Arc<dyn ParametricModel>], data: Arc<DataMatrix>) -> Result<(FittingResult, QualityMeasure)> {
        let measure = QualityMeasure::new(data);
        tracing::debug!(points = measure.data().len(), models = models.len(), "fitting data matrix");
        let result = self.fitters.fit_best(models, &measure)?;
        Ok((result, measure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;

    #[test]
    fn standard_engine_is_shared() {
        assert!(Arc::ptr_eq(&FittingEngine::standard(), &FittingEngine::standard()));
        assert_eq!(FittingEngine::standard().fitters().fitters().len(), 2);
    }

    #[test]
    fn fits_a_line_with_the_quadratic() {
        let engine = FittingEngine::standard();
        let pts: Vec<(f64, f64)> = (1..=15).map(|i| (i as f64, 2.0 + 3.0 * i as f64)).collect();
        let models = engine.models_for(true, true).unwrap();
        let (res, measure) = engine.fit(models, Arc::new(DataMatrix::from_points(&pts))).unwrap();
        assert_eq!(res.model().name(), "quadratic");
        assert!(res.quality() < 1e-8, "quality {}", res.quality());
        assert_eq!(measure.data().len(), 15);
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        let settings = FitterSettings {
            max_iterations: 0,
            ..FitterSettings::default()
        };
        let err = FittingEngine::with_settings(settings).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)), "{err}");
    }

    #[test]
    fn too_little_data_is_a_total_failure() {
        let engine = FittingEngine::standard();
        let models = engine.models_for(false, false).unwrap();
        let err = engine
            .fit(models, Arc::new(DataMatrix::from_points(&[(1.0, 1.0), (2.0, 2.0)])))
            .unwrap_err();
        assert!(matches!(err, FitError::TotalFailure { .. }), "{err}");
    }
}
