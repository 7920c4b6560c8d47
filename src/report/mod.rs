//! Terminal reporting of fitted relationships.

use crate::domain::Dimension;
use crate::fit::{FittingResult, QualityMeasure};

/// Format the chosen model, its parameters and a small table of fitted values.
pub fn format_relationship(
    dim_x: &Dimension,
    dim_y: &Dimension,
    fit: &FittingResult,
    measure: &QualityMeasure,
    grid_points: usize,
) -> String {
    let mut out = String::new();
    let data = measure.data();

    out.push_str(&format!(
        "=== {} ~ f({}) [{:?} vs {:?}] ===\n",
        dim_y.name, dim_x.name, dim_y.kind, dim_x.kind
    ));
    if let Some((lo, hi)) = data.x_range() {
        out.push_str(&format!("Points: n={} | {}=[{lo:.4}, {hi:.4}]\n", data.len(), dim_x.name));
    }

    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {} : {}\n", fit.model().name(), fit.model().formula()));
    out.push_str(&format!("- params : {}\n", fmt_vec(fit.fitted_parameters())));
    out.push_str(&format!("- quality: {:.6} (weighted relative RMSE)\n", fit.quality()));

    let grid = build_grid(data.x_range(), dim_x.is_time(), grid_points);
    if !grid.is_empty() {
        out.push('\n');
        out.push_str(&format!("{:>14} {:>14}\n", dim_x.name, dim_y.name));
        out.push_str(&format!("{:->14} {:->14}\n", "", ""));
        for x in grid {
            out.push_str(&format!("{x:>14.4} {:>14.6}\n", fit.predict(x)));
        }
    }

    out
}

/// `n` evaluation points over `range`; log-spaced for positive time ranges.
fn build_grid(range: Option<(f64, f64)>, log_spaced: bool, n: usize) -> Vec<f64> {
    let Some((lo, hi)) = range else {
        return Vec::new();
    };
    if n == 0 || !(lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }
    if n == 1 || hi <= lo {
        return vec![lo];
    }

    let log = log_spaced && lo > 0.0;
    (0..n)
        .map(|i| {
            let u = i as f64 / (n - 1) as f64;
            if log {
                (lo.ln() + u * (hi.ln() - lo.ln())).exp()
            } else {
                lo + u * (hi - lo)
            }
        })
        .collect()
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::{DataMatrix, DimensionKind};
    use crate::models::Quadratic;

    #[test]
    fn grid_is_log_spaced_for_time() {
        let g = build_grid(Some((1.0, 100.0)), true, 3);
        assert!((g[1] - 10.0).abs() < 1e-9, "{g:?}");
        let g = build_grid(Some((0.0, 100.0)), true, 3);
        assert_eq!(g, vec![0.0, 50.0, 100.0]);
        assert!(build_grid(None, false, 3).is_empty());
    }

    #[test]
    fn report_names_model_and_dimensions() {
        let data = Arc::new(DataMatrix::from_points(&[(0.0, 1.0), (1.0, 2.0), (2.0, 5.0)]));
        let fit = FittingResult::new(0.0, vec![1.0, 0.0, 1.0], Arc::new(Quadratic));
        let text = format_relationship(
            &Dimension::new(0, DimensionKind::Objective, "x"),
            &Dimension::new(1, DimensionKind::Objective, "y"),
            &fit,
            &QualityMeasure::new(data),
            4,
        );
        assert!(text.contains("y ~ f(x)"), "{text}");
        assert!(text.contains("quadratic"), "{text}");
        assert_eq!(text.lines().filter(|l| l.ends_with("5.000000")).count(), 1, "{text}");
    }
}
