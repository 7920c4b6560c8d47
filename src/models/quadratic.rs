//! `f(x) = a + b·x + c·x²`, used when both dimensions have the same kind.

use nalgebra::{DMatrix, DVector};

use crate::domain::DataMatrix;
use crate::math::{median, solve_least_squares};
use crate::models::{InitialGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl ParametricModel for Quadratic {
    fn name(&self) -> &'static str {
        "quadratic"
    }

    fn formula(&self) -> &'static str {
        "a + b*x + c*x^2"
    }

    fn parameter_count(&self) -> usize {
        3
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        params[0] + x * (params[1] + x * params[2])
    }

    fn gradient(&self, x: f64, _params: &[f64], out: &mut [f64]) {
        out[0] = 1.0;
        out[1] = x;
        out[2] = x * x;
    }

    fn initial_guesser(&self, data: &DataMatrix) -> InitialGuesser {
        let mut anchors = Vec::new();

        // The model is linear in its parameters, so ordinary least squares is
        // already the exact unweighted optimum.
        if data.len() >= 3 {
            let design = DMatrix::from_fn(data.len(), 3, |i, j| data.x(i).powi(j as i32));
            let y = DVector::from_iterator(data.len(), data.ys());
            if let Some(beta) = solve_least_squares(&design, &y) {
                anchors.push(beta.iter().copied().collect());
            }
        }
        anchors.push(vec![median(data.ys()).unwrap_or(0.0), 0.0, 0.0]);

        InitialGuesser::new(3, anchors, data.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ols_anchor_recovers_exact_parabola() {
        let pts: Vec<(f64, f64)> = (0..10).map(|i| {
            let x = i as f64;
            (x, 1.0 - 2.0 * x + 0.5 * x * x)
        }).collect();
        let data = DataMatrix::from_points(&pts);
        let first = Quadratic.initial_guesser(&data).next().unwrap();
        assert!((first[0] - 1.0).abs() < 1e-9);
        assert!((first[1] + 2.0).abs() < 1e-9);
        assert!((first[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn gradient_is_design_row() {
        let mut g = [0.0; 3];
        Quadratic.gradient(3.0, &[0.0, 0.0, 0.0], &mut g);
        assert_eq!(g, [1.0, 3.0, 9.0]);
    }
}
