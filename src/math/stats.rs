//! Small numeric helpers shared by the normalizer and the bounding steps.

/// Median of the finite values in `values`, or `None` if there are none.
///
/// Even-length inputs average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Round half away from zero to `decimals` places.
///
/// Returns `value` unchanged when the scaled result is not finite, which
/// happens for very large precisions or magnitudes.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let rounded = (value * scale).round() / scale;
    if !rounded.is_finite() {
        return value;
    }
    // Avoid persisting "-0.0" for tiny negative inputs.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Clamp `value` into `[lo, hi]`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
