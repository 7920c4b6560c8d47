//! Multi-fitter search: every fitter against every candidate model.
//!
//! Jobs run in parallel; the winner is the lowest quality, ties broken by job
//! order (fitter order first, then model order), so the outcome does not
//! depend on scheduling.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{FitError, Result};
use crate::fit::{FitterSettings, Fitter, FittingJob, FittingResult, LevenbergMarquardtFitter, NelderMeadFitter, QualityMeasure};
use crate::models::ParametricModel;

/// Runs a fixed list of fitters over a list of candidate models.
#[derive(Debug, Clone)]
pub struct MultiFitter {
    fitters: Vec<Arc<dyn Fitter>>,
}

impl MultiFitter {
    pub fn new(fitters: Vec<Arc<dyn Fitter>>) -> Self {
        Self { fitters }
    }

    /// Levenberg–Marquardt first, then Nelder–Mead as the derivative-free fallback.
    pub fn standard(settings: FitterSettings) -> Self {
        let lm: Arc<dyn Fitter> = Arc::new(LevenbergMarquardtFitter::new(settings));
        let simplex: Arc<dyn Fitter> = Arc::new(NelderMeadFitter::new(settings));
        Self::new(vec![lm, simplex])
    }

    pub fn fitters(&self) -> &[Arc<dyn Fitter>] {
        &self.fitters
    }

    /// Best result over all (fitter, model) combinations.
    ///
    /// Fails with [`FitError::TotalFailure`] listing every combination's reason
    /// when none succeeds, or with the first `Configuration` error.
    pub fn fit_best(&self, models: &[Arc<dyn ParametricModel>], measure: &QualityMeasure) -> Result<FittingResult> {
        if self.fitters.is_empty() {
            return Err(FitError::Configuration("No fitters configured.".into()));
        }
        if models.is_empty() {
            return Err(FitError::Configuration("No candidate models to fit.".into()));
        }

        let jobs: Vec<FittingJob<'_>> = self
            .fitters
            .iter()
            .flat_map(|fitter| models.iter().map(move |model| FittingJob::new(fitter.as_ref(), model)))
            .collect();

        // `collect` keeps job order regardless of which thread finished first.
        let outcomes: Vec<(String, Result<FittingResult>)> = jobs
            .par_iter()
            .map(|job| (job.label(), job.run(measure)))
            .collect();

        select_best(outcomes)
    }
}

/// Pick the lowest-quality success from `outcomes`, in order.
///
/// Only a strictly better quality replaces the current best, so earlier
/// outcomes win ties. A `Configuration` error is returned as is, since it
/// would fail every retry the same way.
pub fn select_best(outcomes: Vec<(String, Result<FittingResult>)>) -> Result<FittingResult> {
    let mut best: Option<(String, FittingResult)> = None;
    let mut failures = Vec::new();

    for (label, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                if best.as_ref().is_none_or(|(_, b)| result.quality() < b.quality()) {
                    best = Some((label, result));
                }
            }
            Err(err @ FitError::Configuration(_)) => return Err(err),
            Err(err) => {
                tracing::debug!(combination = %label, error = %err, "fitting combination failed");
                failures.push(format!("{label}: {err}"));
            }
        }
    }

    match best {
        Some((label, result)) => {
            tracing::info!(
                combination = %label,
                quality = result.quality(),
                failed = failures.len(),
                "selected best fit"
            );
            Ok(result)
        }
        None => Err(FitError::TotalFailure { failures }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataMatrix;
    use crate::models::{Quadratic, ExponentialDecay};

    /// Returns a fixed quality regardless of data.
    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        quality: Option<f64>,
    }

    impl Fitter for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fit(&self, model: &Arc<dyn ParametricModel>, _measure: &QualityMeasure) -> Result<FittingResult> {
            match self.quality {
                Some(q) => Ok(FittingResult::new(q, vec![0.0; model.parameter_count()], model.clone())),
                None => Err(FitError::FitFailure(format!("{} gave up", self.name))),
            }
        }
    }

    fn fixed(name: &'static str, quality: Option<f64>) -> Arc<dyn Fitter> {
        Arc::new(Fixed { name, quality })
    }

    fn measure() -> QualityMeasure {
        let pts: Vec<(f64, f64)> = (1..=10).map(|i| (i as f64, 1.0 / i as f64)).collect();
        QualityMeasure::new(Arc::new(DataMatrix::from_points(&pts)))
    }

    fn models() -> Vec<Arc<dyn ParametricModel>> {
        vec![Arc::new(Quadratic), Arc::new(ExponentialDecay)]
    }

    #[test]
    fn lowest_quality_wins() {
        let multi = MultiFitter::new(vec![fixed("a", Some(0.5)), fixed("b", Some(0.1))]);
        let best = multi.fit_best(&models(), &measure()).unwrap();
        assert_eq!(best.quality(), 0.1);
    }

    #[test]
    fn ties_keep_job_order() {
        let multi = MultiFitter::new(vec![fixed("a", Some(0.2)), fixed("b", Some(0.2))]);
        for _ in 0..20 {
            let best = multi.fit_best(&models(), &measure()).unwrap();
            // First job is fitter "a" with the first model.
            assert_eq!(best.model().name(), "quadratic");
        }
    }

    #[test]
    fn failures_are_skipped() {
        let multi = MultiFitter::new(vec![fixed("broken", None), fixed("ok", Some(0.3))]);
        let best = multi.fit_best(&models(), &measure()).unwrap();
        assert_eq!(best.quality(), 0.3);
    }

    #[test]
    fn total_failure_lists_every_combination() {
        let multi = MultiFitter::new(vec![fixed("x", None), fixed("y", None)]);
        match multi.fit_best(&models(), &measure()) {
            Err(FitError::TotalFailure { failures }) => {
                assert_eq!(failures.len(), 4, "{failures:?}");
                assert!(failures[0].starts_with("x/quadratic"), "{failures:?}");
            }
            other => panic!("expected total failure, got {other:?}"),
        }
    }

    #[test]
    fn invalid_fitter_settings_are_fatal() {
        let settings = FitterSettings {
            restarts: 0,
            ..FitterSettings::default()
        };
        let multi = MultiFitter::standard(settings);
        let err = multi.fit_best(&models(), &measure()).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)), "{err}");
    }

    #[test]
    fn empty_inputs_are_configuration_errors() {
        let multi = MultiFitter::new(Vec::new());
        assert!(matches!(multi.fit_best(&models(), &measure()), Err(FitError::Configuration(_))));
        let multi = MultiFitter::standard(FitterSettings::default());
        assert!(matches!(multi.fit_best(&[], &measure()), Err(FitError::Configuration(_))));
    }
}
