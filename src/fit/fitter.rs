//! The fitter-engine contract and the single (fitter, model) fitting job.

use std::fmt;
use std::sync::Arc;

use crate::error::{FitError, Result};
use crate::fit::{FittingResult, QualityMeasure};
use crate::models::ParametricModel;

/// Options shared by the iterative fitters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitterSettings {
    /// Iteration cap per start.
    pub max_iterations: usize,
    /// Relative improvement below which a descent is considered converged.
    pub tolerance: f64,
    /// Number of starting points drawn from the model's initial guesser.
    pub restarts: usize,
}

impl Default for FitterSettings {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-10,
            restarts: 8,
        }
    }
}

impl FitterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(FitError::Configuration("max_iterations must be > 0.".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FitError::Configuration("tolerance must be finite and > 0.".into()));
        }
        if self.restarts == 0 {
            return Err(FitError::Configuration("restarts must be > 0.".into()));
        }
        Ok(())
    }
}

/// A numerical method that searches the parameters of one model.
pub trait Fitter: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Minimize `measure` over the parameters of `model`.
    ///
    /// Data preconditions (enough finite samples) are already checked by
    /// [`FittingJob::run`].
    fn fit(&self, model: &Arc<dyn ParametricModel>, measure: &QualityMeasure) -> Result<FittingResult>;
}

/// One (fitter, model) pairing.
#[derive(Debug, Clone, Copy)]
pub struct FittingJob<'a> {
    fitter: &'a dyn Fitter,
    model: &'a Arc<dyn ParametricModel>,
}

impl<'a> FittingJob<'a> {
    pub fn new(fitter: &'a dyn Fitter, model: &'a Arc<dyn ParametricModel>) -> Self {
        Self { fitter, model }
    }

    /// `fitter/model`, used in logs and aggregated failures.
    pub fn label(&self) -> String {
        format!("{}/{}", self.fitter.name(), self.model.name())
    }

    /// Produce exactly one validated result, or a `FitFailure`.
    ///
    /// A `Configuration` error from the fitter is passed through unchanged.
    pub fn run(&self, measure: &QualityMeasure) -> Result<FittingResult> {
        let data = measure.data();
        let k = self.model.parameter_count();
        if data.len() < k {
            return Err(FitError::FitFailure(format!(
                "{} points cannot determine {k} parameters of {}",
                data.len(),
                self.model.name()
            )));
        }
        if !data.all_finite() {
            return Err(FitError::FitFailure("data contains non-finite samples".into()));
        }

        // Bad settings are fatal for every job; everything else is this job's failure.
        let result = self.fitter.fit(self.model, measure).map_err(|e| match e {
            FitError::FitFailure(_) | FitError::Configuration(_) => e,
            other => FitError::FitFailure(other.to_string()),
        })?;

        let params = result.fitted_parameters();
        if params.len() != k || params.iter().any(|p| !p.is_finite()) || !result.quality().is_finite() {
            return Err(FitError::FitFailure(format!(
                "{} returned an unusable result (quality {}, parameters {params:?})",
                self.fitter.name(),
                result.quality()
            )));
        }
        Ok(result)
    }
}

/// Run `descend` from `restarts` starting points and keep the best outcome.
///
/// `descend` maps a start to `(parameters, quality)`. Ties keep the earlier
/// start. Fails with the last error if no start succeeds.
pub(crate) fn best_of_starts<F>(
    model: &Arc<dyn ParametricModel>,
    measure: &QualityMeasure,
    restarts: usize,
    mut descend: F,
) -> Result<FittingResult>
where
    F: FnMut(Vec<f64>) -> Result<(Vec<f64>, f64)>,
{
    let mut best: Option<(Vec<f64>, f64)> = None;
    let mut last_err = None;

    for start in model.initial_guesser(measure.data()).take(restarts) {
        match descend(start) {
            Ok((params, quality)) if quality.is_finite() => {
                if best.as_ref().is_none_or(|(_, q)| quality < *q) {
                    best = Some((params, quality));
                }
            }
            Ok((_, quality)) => {
                last_err = Some(FitError::FitFailure(format!("descent ended at quality {quality}")));
            }
            Err(e) => last_err = Some(e),
        }
    }

    match best {
        Some((params, quality)) => Ok(FittingResult::new(quality, params, model.clone())),
        None => Err(last_err.unwrap_or_else(|| FitError::FitFailure("no starting point was generated".into()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataMatrix;
    use crate::models::Quadratic;

    #[derive(Debug)]
    struct Constant(Vec<f64>);

    impl Fitter for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn fit(&self, model: &Arc<dyn ParametricModel>, measure: &QualityMeasure) -> Result<FittingResult> {
            let q = measure.evaluate(model.as_ref(), &self.0)?;
            Ok(FittingResult::new(q, self.0.clone(), model.clone()))
        }
    }

    fn measure(points: &[(f64, f64)]) -> QualityMeasure {
        QualityMeasure::new(Arc::new(DataMatrix::from_points(points)))
    }

    #[test]
    fn job_rejects_too_few_points() {
        let model: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let fitter = Constant(vec![0.0, 0.0, 0.0]);
        let err = FittingJob::new(&fitter, &model)
            .run(&measure(&[(1.0, 1.0), (2.0, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, FitError::FitFailure(_)));
    }

    #[test]
    fn job_rejects_non_finite_data() {
        let model: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let fitter = Constant(vec![0.0, 0.0, 0.0]);
        let err = FittingJob::new(&fitter, &model)
            .run(&measure(&[(1.0, 1.0), (2.0, f64::NAN), (3.0, 2.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn job_wraps_fitter_result() {
        let model: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let fitter = Constant(vec![1.0, 1.0, 0.0]);
        let job = FittingJob::new(&fitter, &model);
        let res = job.run(&measure(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)])).unwrap();
        assert_eq!(res.quality(), 0.0);
        assert_eq!(job.label(), "constant/quadratic");
    }

    #[derive(Debug)]
    struct Misconfigured;

    impl Fitter for Misconfigured {
        fn name(&self) -> &'static str {
            "misconfigured"
        }

        fn fit(&self, _model: &Arc<dyn ParametricModel>, _measure: &QualityMeasure) -> Result<FittingResult> {
            Err(FitError::Configuration("restarts must be > 0.".into()))
        }
    }

    #[test]
    fn job_passes_configuration_errors_through() {
        let model: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let err = FittingJob::new(&Misconfigured, &model)
            .run(&measure(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]))
            .unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)), "{err}");
    }

    #[test]
    fn settings_validation() {
        assert!(FitterSettings::default().validate().is_ok());
        let bad = FitterSettings {
            restarts: 0,
            ..FitterSettings::default()
        };
        assert!(matches!(bad.validate(), Err(FitError::Configuration(_))));
    }
}
