//! Fourier series features for periodic seasonality

use std::f64::consts::PI;

/// Sine/cosine pairs for harmonics `1..=order` of a period.
///
/// `t` and `period` share a unit (days in this workspace). The output has
/// `2 * order` entries ordered `sin(1), cos(1), sin(2), cos(2), ...`.
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}
