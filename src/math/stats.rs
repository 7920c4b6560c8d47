//! Small order statistics used by the initial guessers.

/// Median of the finite values, or `None` if there are none.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

/// Mean `y` of the `fraction` of points with the smallest and the largest `x`.
///
/// Returns `(y_near_min_x, y_near_max_x)`; at least one point is taken on each
/// side. `None` if `points` is empty.
pub fn edge_means(points: &[(f64, f64)], fraction: f64) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let k = ((sorted.len() as f64 * fraction).ceil() as usize).clamp(1, sorted.len());
    let mean = |s: &[(f64, f64)]| s.iter().map(|p| p.1).sum::<f64>() / s.len() as f64;
    Some((mean(&sorted[..k]), mean(&sorted[sorted.len() - k..])))
}
