//! Correlation engine — Pearson and tie-aware Spearman coefficients.
//!
//! Spearman is computed exactly: mid-ranks (ties receive the arithmetic mean
//! of their tied positions) followed by the product-moment formula on the
//! ranks. No large-sample approximation.
//!
//! All entry points return NaN rather than erroring for degenerate input:
//! fewer than 2 points, mismatched lengths, non-finite values, or a zero
//! variance denominator.

use serde::{Deserialize, Serialize};

/// Which correlation coefficient to use for IC computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Rank correlation with mid-rank tie handling (the default).
    #[default]
    Spearman,
    /// Linear product-moment correlation.
    Pearson,
}

impl CorrelationMethod {
    /// Compute the coefficient between two equal-length sequences.
    pub fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Spearman => spearman(x, y),
            Self::Pearson => pearson(x, y),
        }
    }
}

fn inputs_valid(x: &[f64], y: &[f64]) -> bool {
    x.len() >= 2
        && x.len() == y.len()
        && x.iter().all(|v| v.is_finite())
        && y.iter().all(|v| v.is_finite())
}

/// Product-moment (Pearson) correlation, clamped to [-1, 1].
///
/// The clamp absorbs floating-point overshoot only; a zero-variance
/// denominator yields NaN, never a division by zero.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if !inputs_valid(x, y) {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return f64::NAN;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Spearman rank correlation: Pearson applied to mid-ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if !inputs_valid(x, y) {
        return f64::NAN;
    }
    let rank_x = mid_ranks(x);
    let rank_y = mid_ranks(y);
    pearson(&rank_x, &rank_y)
}

/// 1-based mid-ranks: tied values share the mean of their tied positions.
///
/// The rank sum is always n(n+1)/2 regardless of ties.
pub fn mid_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i+1..=j share the mid-rank (i + 1 + j) / 2
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}
