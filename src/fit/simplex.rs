//! Nelder–Mead downhill simplex fitter.
//!
//! Derivative-free, so it still makes progress where a model's gradient is
//! unreliable (e.g. exponents near zero with samples at `x = 0`). Coefficients
//! are the standard ones: reflection 1, expansion 2, contraction ½, shrink ½.

use std::sync::Arc;

use crate::error::{FitError, Result};
use crate::fit::fitter::best_of_starts;
use crate::fit::{FittingResult, Fitter, FitterSettings, QualityMeasure};
use crate::models::ParametricModel;

/// Relative size of the initial simplex around the starting point.
const INITIAL_STEP: f64 = 0.1;
/// Absolute initial step for zero components.
const ZERO_STEP: f64 = 0.05;

#[derive(Debug, Clone, Default)]
pub struct NelderMeadFitter {
    settings: FitterSettings,
}

impl NelderMeadFitter {
    pub fn new(settings: FitterSettings) -> Self {
        Self { settings }
    }

    fn descend(&self, model: &dyn ParametricModel, measure: &QualityMeasure, start: Vec<f64>) -> Result<(Vec<f64>, f64)> {
        let n = start.len();
        // Invalid vertices rank last inside the search; the final vertex is
        // re-evaluated strictly below.
        let objective = |p: &[f64]| measure.evaluate(model, p).unwrap_or(f64::INFINITY);

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        let f0 = objective(&start);
        simplex.push((start.clone(), f0));
        for j in 0..n {
            let mut v = start.clone();
            v[j] += if v[j] != 0.0 { INITIAL_STEP * v[j].abs() } else { ZERO_STEP };
            let f = objective(&v);
            simplex.push((v, f));
        }

        let tol = self.settings.tolerance;
        for _ in 0..self.settings.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            let best = simplex[0].1;
            let worst = simplex[n].1;
            if best.is_finite() && (worst - best).abs() <= tol * (best.abs() + tol) {
                break;
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|v| v.0[j]).sum::<f64>() / n as f64)
                .collect();
            let worst_point = simplex[n].0.clone();
            let towards = |coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&worst_point)
                    .map(|(c, w)| c + coef * (c - w))
                    .collect()
            };

            let reflected = towards(1.0);
            let fr = objective(&reflected);
            if fr < best {
                let expanded = towards(2.0);
                let fe = objective(&expanded);
                simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
            } else if fr < simplex[n - 1].1 {
                simplex[n] = (reflected, fr);
            } else {
                let contracted = if fr < worst { towards(0.5) } else { towards(-0.5) };
                let fc = objective(&contracted);
                if fc < fr.min(worst) {
                    simplex[n] = (contracted, fc);
                } else {
                    let anchor = simplex[0].0.clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        vertex.0 = anchor
                            .iter()
                            .zip(&vertex.0)
                            .map(|(a, v)| a + 0.5 * (v - a))
                            .collect();
                        vertex.1 = objective(&vertex.0);
                    }
                }
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (params, f) = simplex.swap_remove(0);
        if !f.is_finite() {
            return Err(FitError::FitFailure(format!(
                "simplex search for {} never reached a finite quality",
                model.name()
            )));
        }
        let quality = measure.evaluate(model, &params)?;
        Ok((params, quality))
    }
}

impl Fitter for NelderMeadFitter {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    fn fit(&self, model: &Arc<dyn ParametricModel>, measure: &QualityMeasure) -> Result<FittingResult> {
        self.settings.validate()?;
        best_of_starts(model, measure, self.settings.restarts, |start| {
            self.descend(model.as_ref(), measure, start)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataMatrix;
    use crate::models::Quadratic;

    #[test]
    fn improves_on_its_start() {
        let pts: Vec<(f64, f64)> = (1..=20).map(|i| {
            let x = i as f64;
            (x, 5.0 + 2.0 * x + 0.3 * x * x)
        }).collect();
        let measure = QualityMeasure::new(Arc::new(DataMatrix::from_points(&pts)));
        let model: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let fitter = NelderMeadFitter::default();

        let start = vec![1.0, 1.0, 1.0];
        let start_quality = measure.evaluate(model.as_ref(), &start).unwrap();
        let (_, q) = fitter.descend(model.as_ref(), &measure, start).unwrap();
        assert!(q < start_quality * 0.1, "{q} vs {start_quality}");

        let res = fitter.fit(&model, &measure).unwrap();
        assert!(res.quality() < 1e-6, "quality {}", res.quality());
    }

    #[test]
    fn invalid_everywhere_is_a_failure() {
        let measure = QualityMeasure::new(Arc::new(DataMatrix::from_points(&[(-1.0, 1.0), (-2.0, 2.0), (-3.0, 3.0), (-4.0, 4.0)])));
        // Negative time makes every exponential-decay candidate NaN.
        let model: Arc<dyn ParametricModel> = Arc::new(crate::models::ExponentialDecay);
        assert!(NelderMeadFitter::default().fit(&model, &measure).is_err());
    }
}
