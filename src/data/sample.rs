//! Synthetic run generation.
//!
//! Every run samples the same logistic-over-log-time curve
//! `f(t) = a + b / (1 + c·t^d)` at log-spaced times with a small per-run
//! jitter, applies multiplicative log-normal noise and keeps the best value so
//! far, like an anytime optimizer would report it.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DemoConfig, Dimension, DimensionKind, InstanceRuns, Run};
use crate::error::{FitError, Result};
use crate::models::{LogisticWithOffsetOverLogX, ParametricModel};

/// `[a, b, c, d]` of the generating curve.
pub const SAMPLE_TRUTH: [f64; 4] = [0.5, 1000.0, 1e-3, 1.5];

/// Sampled times span `10^0 ..= 10^TIME_DECADES`.
const TIME_DECADES: f64 = 5.0;

#[derive(Debug)]
pub struct SampleData {
    pub runs: InstanceRuns,
    /// `[time, objective]`.
    pub dimensions: [Dimension; 2],
}

pub fn generate_logistic_runs(config: &DemoConfig) -> Result<SampleData> {
    if config.runs == 0 {
        return Err(FitError::Configuration("Run count must be > 0.".into()));
    }
    if config.points_per_run < 2 {
        return Err(FitError::Configuration("Need at least 2 points per run.".into()));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(FitError::Configuration("Noise must be finite and >= 0.".into()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| FitError::InternalConsistency(format!("Noise distribution error: {e}")))?;
    let curve = LogisticWithOffsetOverLogX;
    let last = (config.points_per_run - 1) as f64;

    let mut runs = Vec::with_capacity(config.runs);
    for _ in 0..config.runs {
        let mut values = Vec::with_capacity(config.points_per_run * 2);
        let mut best = f64::INFINITY;
        for j in 0..config.points_per_run {
            // Evaluations are whole numbers; the curve is sampled where the run records it.
            let jittered = 10f64.powf(TIME_DECADES * j as f64 / last) * rng.gen_range(0.9..1.1);
            let t = jittered.round().max(1.0);
            let noisy = curve.value(t, &SAMPLE_TRUTH) * rng.sample(normal).exp();
            best = best.min(noisy);
            values.push(t);
            values.push(best);
        }
        runs.push(Run::from_flat(2, values)?);
    }

    Ok(SampleData {
        runs: InstanceRuns::new(format!("synthetic-{}", config.seed), runs),
        dimensions: [
            Dimension::new(0, DimensionKind::Time, "FEs"),
            Dimension::new(1, DimensionKind::Objective, "f"),
        ],
    })
}
