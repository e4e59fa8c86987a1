//! Robust correlation — median/MAD clipping and a trimmed variant.

use crate::correlation::pearson;
use crate::stats::median_of;

/// Median absolute deviation around the median.
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let med = median_of(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median_of(&deviations)
}

/// MAD-based robust correlation.
///
/// Both series are centered on their medians and clipped to 3×MAD before a
/// Pearson computation on the clipped values, so a handful of extreme points
/// cannot dominate the coefficient. NaN when either MAD is zero or input is
/// degenerate.
pub fn robust_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return f64::NAN;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return f64::NAN;
    }

    let x_mad = median_abs_deviation(x);
    let y_mad = median_abs_deviation(y);
    if x_mad == 0.0 || y_mad == 0.0 || !x_mad.is_finite() || !y_mad.is_finite() {
        return f64::NAN;
    }

    let clip = |values: &[f64], mad: f64| -> Vec<f64> {
        let med = median_of(values);
        values
            .iter()
            .map(|v| {
                let centered = v - med;
                centered.signum() * centered.abs().min(3.0 * mad)
            })
            .collect()
    };

    pearson(&clip(x, x_mad), &clip(y, y_mad))
}

/// 10%-trimmed correlation.
///
/// Pairs are ordered by `x` and 10% of pairs are dropped from each tail
/// before a Pearson computation on the survivors. Pairing is preserved —
/// trimming each series independently would correlate two sorted sequences
/// and always report near-perfect agreement. Falls back to the untrimmed
/// coefficient when trimming would leave fewer than 2 pairs.
pub fn trimmed_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return f64::NAN;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return f64::NAN;
    }

    let n = x.len();
    let trim_count = (n as f64 * 0.1) as usize;
    if trim_count == 0 || n - 2 * trim_count < 2 {
        return pearson(x, y);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        x[a].partial_cmp(&x[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let kept = &order[trim_count..n - trim_count];

    let trimmed_x: Vec<f64> = kept.iter().map(|&i| x[i]).collect();
    let trimmed_y: Vec<f64> = kept.iter().map(|&i| y[i]).collect();
    pearson(&trimmed_x, &trimmed_y)
}
