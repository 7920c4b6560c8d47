//! Levenberg–Marquardt fitter.
//!
//! Each iteration solves the damped Gauss–Newton step as a least-squares
//! problem instead of forming normal equations:
//!
//! ```text
//! [ J        ]       [ −r ]
//! [ √λ · D   ] δ  ≈  [  0 ]
//! ```
//!
//! where `J`, `r` are the weighted Jacobian and residuals from the quality
//! measure and `D = diag(‖J_j‖)` (Marquardt scaling). Accepted steps shrink `λ`
//! by 10, rejected steps grow it by 10.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::Result;
use crate::fit::fitter::best_of_starts;
use crate::fit::{FittingEvaluation, FittingResult, Fitter, FitterSettings, QualityMeasure};
use crate::math::solve_least_squares;
use crate::models::ParametricModel;

const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e12;
const MIN_COLUMN_SCALE: f64 = 1e-12;

#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardtFitter {
    settings: FitterSettings,
}

impl LevenbergMarquardtFitter {
    pub fn new(settings: FitterSettings) -> Self {
        Self { settings }
    }

    fn descend(&self, model: &dyn ParametricModel, measure: &QualityMeasure, start: Vec<f64>) -> Result<(Vec<f64>, f64)> {
        let tol = self.settings.tolerance;
        let mut params = DVector::from_vec(start);
        let mut current = FittingEvaluation::default();
        let mut trial = FittingEvaluation::default();

        measure.evaluate_into(model, params.as_slice(), &mut current)?;
        let mut cost = current.root_sum_squared_error().powi(2);
        let mut lambda = INITIAL_DAMPING;

        for _ in 0..self.settings.max_iterations {
            if cost == 0.0 {
                break;
            }

            let (a, b) = damped_system(&current, lambda);
            let Some(step) = solve_least_squares(&a, &b) else {
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    break;
                }
                continue;
            };

            let candidate = &params + &step;
            let accepted = measure.evaluate_into(model, candidate.as_slice(), &mut trial).is_ok()
                && trial.root_sum_squared_error().powi(2) < cost;
            if !accepted {
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    break;
                }
                continue;
            }

            let new_cost = trial.root_sum_squared_error().powi(2);
            let improvement = (cost - new_cost) / cost;
            let step_small = step.norm() <= tol * (params.norm() + tol);

            params = candidate;
            std::mem::swap(&mut current, &mut trial);
            cost = new_cost;
            lambda = (lambda / 10.0).max(MIN_DAMPING);

            // Tiny progress only means convergence in the Gauss–Newton regime;
            // under heavy damping it just means the step was short.
            if lambda <= INITIAL_DAMPING && (improvement <= tol || step_small) {
                break;
            }
        }

        Ok((params.iter().copied().collect(), current.quality()))
    }
}

/// Build the augmented matrix and right-hand side of one damped step.
fn damped_system(eval: &FittingEvaluation, lambda: f64) -> (DMatrix<f64>, DVector<f64>) {
    let jac = eval.jacobian();
    let res = eval.residuals();
    let (m, n) = jac.shape();

    let mut a = DMatrix::zeros(m + n, n);
    a.rows_mut(0, m).copy_from(jac);
    let damping = lambda.sqrt();
    for j in 0..n {
        a[(m + j, j)] = damping * jac.column(j).norm().max(MIN_COLUMN_SCALE);
    }

    let mut b = DVector::zeros(m + n);
    for i in 0..m {
        b[i] = -res[i];
    }
    (a, b)
}

impl Fitter for LevenbergMarquardtFitter {
    fn name(&self) -> &'static str {
        "levenberg-marquardt"
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
    use crate::models::{ExponentialDecay, LogisticWithOffsetOverLogX, Quadratic};

    fn fit(model: Arc<dyn ParametricModel>, points: &[(f64, f64)]) -> FittingResult {
        let measure = QualityMeasure::new(Arc::new(DataMatrix::from_points(points)));
        LevenbergMarquardtFitter::default().fit(&model, &measure).unwrap()
    }

    #[test]
    fn recovers_exact_quadratic() {
        let pts: Vec<(f64, f64)> = (0..12).map(|i| {
            let x = i as f64 * 0.5;
            (x, 3.0 + 0.5 * x - 0.25 * x * x)
        }).collect();
        let res = fit(Arc::new(Quadratic), &pts);
        assert!(res.quality() < 1e-9, "quality {}", res.quality());
    }

    #[test]
    fn fits_logistic_over_log_time() {
        let truth = [1.0, 99.0, 0.01, 1.2];
        let model = LogisticWithOffsetOverLogX;
        let pts: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                let x = 10f64.powf(i as f64 / 10.0);
                (x, model.value(x, &truth))
            })
            .collect();
        let res = fit(Arc::new(model), &pts);
        assert!(res.quality() < 1e-6, "quality {}", res.quality());
        for (x, y) in &pts {
            assert!((res.predict(*x) - y).abs() <= 1e-4 * y.abs(), "x={x}");
        }
    }

    #[test]
    fn fits_exponential_decay() {
        let truth = [0.5, 20.0, -0.2, 1.0];
        let pts: Vec<(f64, f64)> = (0..30)
            .map(|i| {
                let x = i as f64;
                (x, ExponentialDecay.value(x, &truth))
            })
            .collect();
        let res = fit(Arc::new(ExponentialDecay), &pts);
        assert!(res.quality() < 1e-6, "quality {}", res.quality());
    }
}
