//! Fourier basis for yearly seasonality on monthly data.
//!
//! Seasonality is modelled as a truncated Fourier series over the calendar
//! month `m ∈ {0..11}` (January = 0):
//!
//! - `s_k(m) = sin(2πk·m / 12)`
//! - `c_k(m) = cos(2πk·m / 12)`
//!
//! for harmonics `k = 1..=order`. Order 6 is the most a 12-month cycle can
//! resolve; higher orders only alias lower ones.

use std::f64::consts::PI;

/// Months in the seasonal cycle.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Highest harmonic that carries new information on a 12-month cycle.
pub const MAX_ORDER: usize = 6;

/// Append `2 * order` seasonal regressors for `month_of_year` (1..=12) to `out`.
pub fn push_fourier_terms(month_of_year: u32, order: usize, out: &mut Vec<f64>) {
    let m = f64::from(month_of_year.saturating_sub(1));
    for k in 1..=order.min(MAX_ORDER) {
        let angle = 2.0 * PI * k as f64 * m / MONTHS_PER_YEAR;
        out.push(angle.sin());
        out.push(angle.cos());
    }
}

/// Number of columns `push_fourier_terms` appends for `order`.
pub fn fourier_width(order: usize) -> usize {
    2 * order.min(MAX_ORDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_repeat_every_twelve_months() {
        let mut jan = Vec::new();
        push_fourier_terms(1, 3, &mut jan);
        assert_eq!(jan.len(), fourier_width(3));
        // January is the phase origin: every sine is 0, every cosine is 1.
        for pair in jan.chunks(2) {
            assert!(pair[0].abs() < 1e-12);
            assert!((pair[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn order_is_capped() {
        let mut out = Vec::new();
        push_fourier_terms(7, 20, &mut out);
        assert_eq!(out.len(), 2 * MAX_ORDER);
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
