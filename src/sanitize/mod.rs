use crate::types::EPSILON;

/// Clamp a value into [0, 1] so it can be used as a sampling weight.
/// NaN maps to 0.
pub fn sanitize_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

/// Safe division; returns `fallback` when the denominator is ~0 or the
/// result is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.abs() < EPSILON {
        return fallback;
    }
    let r = numerator / denominator;
    if r.is_finite() {
        r
    } else {
        fallback
    }
}

/// Arithmetic mean; `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
