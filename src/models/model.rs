//! The parametric model contract and initial-guess generation.
//!
//! Fitters only rely on three primitive operations:
//! - evaluate `f(x; p)` (for residuals and reports)
//! - evaluate `∂f/∂p` at `x` (for Jacobians)
//! - produce starting points for the parameter search

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::domain::DataMatrix;

/// A fixed functional form with free numeric parameters.
///
/// Implementations are pure: no interior state besides constants.
pub trait ParametricModel: Send + Sync + fmt::Debug {
    /// Stable identifier, used in logs, reports and persisted records.
    fn name(&self) -> &'static str;

    /// Human-readable formula in terms of `x` and the parameters.
    fn formula(&self) -> &'static str;

    fn parameter_count(&self) -> usize;

    fn value(&self, x: f64, params: &[f64]) -> f64;

    /// Write `∂f/∂p_j` at `x` into `out`.
    ///
    /// # Panics
    /// Panics if `out` or `params` is shorter than `parameter_count()`.
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);

    /// Starting points for fitting this model to `data`.
    fn initial_guesser(&self, data: &DataMatrix) -> InitialGuesser;
}

/// Endless, reproducible sequence of starting points.
///
/// The heuristic anchors computed from the data come first, in order. After
/// that every guess is a random anchor perturbed multiplicatively by
/// `exp(N(0, 0.5²))` per component (zero components get additive `N(0, 0.1²)`).
#[derive(Debug, Clone)]
pub struct InitialGuesser {
    parameter_count: usize,
    anchors: Vec<Vec<f64>>,
    issued: usize,
    rng: StdRng,
}

impl InitialGuesser {
    /// Anchors of the wrong length or with non-finite components are dropped.
    pub fn new(parameter_count: usize, anchors: Vec<Vec<f64>>, seed: u64) -> Self {
        let anchors = anchors
            .into_iter()
            .filter(|a| a.len() == parameter_count && a.iter().all(|v| v.is_finite()))
            .collect();
        Self {
            parameter_count,
            anchors,
            issued: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of heuristic anchors emitted before random perturbation starts.
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }
}

impl Iterator for InitialGuesser {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        let idx = self.issued;
        self.issued += 1;
        if let Some(anchor) = self.anchors.get(idx) {
            return Some(anchor.clone());
        }

        if self.anchors.is_empty() {
            let guess = (0..self.parameter_count)
                .map(|_| self.rng.sample::<f64, _>(StandardNormal))
                .collect();
            return Some(guess);
        }

        let pick = self.rng.gen_range(0..self.anchors.len());
        let base = self.anchors[pick].clone();
        let guess = base
            .into_iter()
            .map(|p| {
                let z: f64 = self.rng.sample(StandardNormal);
                if p == 0.0 { 0.1 * z } else { p * (0.5 * z).exp() }
            })
            .collect();
        Some(guess)
    }
}

/// Collect the data as `(x, y)` pairs (guessers work on sorted copies).
pub(crate) fn points_of(data: &DataMatrix) -> Vec<(f64, f64)> {
    data.xs().zip(data.ys()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_come_first_then_perturbations() {
        let anchors = vec![vec![1.0, 2.0], vec![3.0, 0.0]];
        let guesses: Vec<Vec<f64>> = InitialGuesser::new(2, anchors, 7).take(5).collect();
        assert_eq!(guesses[0], vec![1.0, 2.0]);
        assert_eq!(guesses[1], vec![3.0, 0.0]);
        for g in &guesses[2..] {
            assert_eq!(g.len(), 2);
            assert!(g.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a: Vec<Vec<f64>> = InitialGuesser::new(2, vec![vec![1.0, 1.0]], 11).take(6).collect();
        let b: Vec<Vec<f64>> = InitialGuesser::new(2, vec![vec![1.0, 1.0]], 11).take(6).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_anchors_are_dropped() {
        let g = InitialGuesser::new(2, vec![vec![f64::NAN, 1.0], vec![1.0]], 0);
        assert_eq!(g.anchor_count(), 0);
    }
}
