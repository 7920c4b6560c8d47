//! Exponential decay with a stretched exponent:
//!
//! ```text
//! f(x) = a + b·exp(c·x^d)
//! ```
//!
//! With `c < 0` the curve falls from `a + b` at `x = 0` towards `a`.

use crate::domain::DataMatrix;
use crate::math::{edge_means, median, power_with_log_derivative};
use crate::models::model::points_of;
use crate::models::{InitialGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialDecay;

impl ParametricModel for ExponentialDecay {
    fn name(&self) -> &'static str {
        "exponential-decay"
    }

    fn formula(&self) -> &'static str {
        "a + b * exp(c*x^d)"
    }

    fn parameter_count(&self) -> usize {
        4
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        let (a, b, c, d) = (params[0], params[1], params[2], params[3]);
        let (p, _) = power_with_log_derivative(x, d);
        a + b * (c * p).exp()
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (b, c, d) = (params[1], params[2], params[3]);
        let (p, dp) = power_with_log_derivative(x, d);
        let e = (c * p).exp();
        out[0] = 1.0;
        out[1] = e;
        out[2] = b * e * p;
        out[3] = b * e * c * dp;
    }

    fn initial_guesser(&self, data: &DataMatrix) -> InitialGuesser {
        let pts = points_of(data);
        let mut anchors = Vec::new();
        if let Some((y_start, y_end)) = edge_means(&pts, 0.1) {
            let a = y_end;
            let b = y_start - a;
            let x_mid = median(data.xs().filter(|x| *x > 0.0)).unwrap_or(1.0);
            // Half of the decay is done at the median x.
            for d in [1.0, 0.5, 2.0] {
                anchors.push(vec![a, b, -std::f64::consts::LN_2 / x_mid.powf(d), d]);
            }
        }
        InitialGuesser::new(4, anchors, data.fingerprint() ^ 0x6578_7064)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_matches_finite_differences() {
        let m = ExponentialDecay;
        let p = [0.5, 20.0, -0.3, 0.8];
        let mut g = [0.0; 4];
        for &x in &[0.25, 1.0, 7.0, 60.0] {
            m.gradient(x, &p, &mut g);
            for j in 0..4 {
                let h = 1e-6 * p[j].abs().max(1.0);
                let mut hi = p;
                let mut lo = p;
                hi[j] += h;
                lo[j] -= h;
                let fd = (m.value(x, &hi) - m.value(x, &lo)) / (2.0 * h);
                assert!((g[j] - fd).abs() < 1e-5 * fd.abs().max(1.0), "x={x} j={j}: {} vs {fd}", g[j]);
            }
        }
    }

    #[test]
    fn starts_at_offset_plus_scale() {
        assert!((ExponentialDecay.value(0.0, &[1.0, 4.0, -1.0, 1.0]) - 5.0).abs() < 1e-12);
    }
}
