//! Power terms `x^d` shared by the time-objective models.
//!
//! Both the logistic-over-log-x and the exponential-decay model contain `x^d`
//! with a free exponent `d`, and their gradients need `∂(x^d)/∂d = x^d · ln x`.
//!
//! Numerical notes:
//! - time measures are non-negative; `x < 0` yields NaN so the quality measure
//!   rejects the candidate
//! - at `x = 0` we use the analytic limits: `x^d → 0` for `d > 0`, `1` for
//!   `d = 0`, `+∞` for `d < 0`; the `d`-derivative is taken as `0`

/// Return `(x^d, x^d · ln x)`.
pub fn power_with_log_derivative(x: f64, d: f64) -> (f64, f64) {
    if x > 0.0 {
        let p = x.powf(d);
        (p, p * x.ln())
    } else if x == 0.0 {
        let p = if d > 0.0 {
            0.0
        } else if d == 0.0 {
            1.0
        } else {
            f64::INFINITY
        };
        (p, 0.0)
    } else {
        (f64::NAN, f64::NAN)
    }
}
