//! Logistic curve with offset over `ln x`:
//!
//! ```text
//! f(x) = a + b / (1 + c·x^d)
//! ```
//!
//! Since `c·x^d = exp(ln c + d·ln x)`, this is a logistic function of `ln x`.
//! It starts at `a + b` for `x → 0` and levels off at `a`, the typical shape of
//! best-so-far objective values over runtime.

use crate::domain::DataMatrix;
use crate::math::{edge_means, median, power_with_log_derivative};
use crate::models::model::points_of;
use crate::models::{InitialGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticWithOffsetOverLogX;

impl ParametricModel for LogisticWithOffsetOverLogX {
    fn name(&self) -> &'static str {
        "logistic-offset-log-x"
    }

    fn formula(&self) -> &'static str {
        "a + b / (1 + c*x^d)"
    }

    fn parameter_count(&self) -> usize {
        4
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        let (a, b, c, d) = (params[0], params[1], params[2], params[3]);
        let (p, _) = power_with_log_derivative(x, d);
        a + b / (1.0 + c * p)
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (b, c, d) = (params[1], params[2], params[3]);
        let (p, dp) = power_with_log_derivative(x, d);
        let q = 1.0 + c * p;
        let q2 = q * q;
        out[0] = 1.0;
        out[1] = 1.0 / q;
        out[2] = -b * p / q2;
        out[3] = -b * c * dp / q2;
    }

    fn initial_guesser(&self, data: &DataMatrix) -> InitialGuesser {
        let pts = points_of(data);
        let mut anchors = Vec::new();
        if let Some((y_start, y_end)) = edge_means(&pts, 0.1) {
            let a = y_end;
            let b = y_start - a;
            let x_mid = median(data.xs().filter(|x| *x > 0.0)).unwrap_or(1.0);
            // Put the logistic midpoint (c·x^d = 1) at the median x.
            for d in [1.0, 2.0, 0.5] {
                anchors.push(vec![a, b, x_mid.powf(-d), d]);
            }
        }
        InitialGuesser::new(4, anchors, data.fingerprint() ^ 0x6c6f_6769)
    }
}
