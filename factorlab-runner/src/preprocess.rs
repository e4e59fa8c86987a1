//! Factor preprocessing — winsorization and rescaling.
//!
//! Applied to factor columns only, never to returns. Winsorization clips to
//! quantile bounds instead of discarding rows; standardization/normalization
//! is skipped (with a note) when the column is degenerate, rather than
//! producing a divide-by-zero column of garbage.

use serde::{Deserialize, Serialize};
use tracing::warn;

use factorlab_core::stats::bootstrap::percentile_sorted;
use factorlab_core::stats::{mean_of, sample_std};

use crate::config::FactorProcessing;

/// What actually happened to a factor column during preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSummary {
    /// Number of values clipped by winsorization.
    pub winsorized_count: usize,
    /// The rescaling that was applied, if any.
    pub applied: Option<FactorProcessing>,
    /// Set when a requested rescaling was skipped (zero std / flat range).
    pub skipped_reason: Option<String>,
}

/// Winsorize in place: clip to the (low_q, high_q) quantiles of the finite
/// values. NaN entries are left untouched. Returns the clip count.
pub fn winsorize(values: &mut [f64], limits: (f64, f64)) -> usize {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return 0;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let lower = percentile_sorted(&finite, limits.0 * 100.0);
    let upper = percentile_sorted(&finite, limits.1 * 100.0);

    let mut clipped = 0;
    for v in values.iter_mut() {
        if v.is_finite() {
            let bounded = v.clamp(lower, upper);
            if bounded != *v {
                *v = bounded;
                clipped += 1;
            }
        }
    }
    clipped
}

/// Apply the configured preprocessing to one factor column.
pub fn preprocess_factor(
    factor_name: &str,
    values: &mut [f64],
    do_winsorize: bool,
    winsorize_limits: (f64, f64),
    processing: Option<FactorProcessing>,
) -> PreprocessSummary {
    let winsorized_count = if do_winsorize {
        winsorize(values, winsorize_limits)
    } else {
        0
    };

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (applied, skipped_reason) = match processing {
        None => (None, None),
        Some(FactorProcessing::Standardize) => {
            let mean = mean_of(&finite);
            let std = sample_std(&finite);
            if std.is_finite() && std > 0.0 {
                for v in values.iter_mut() {
                    if v.is_finite() {
                        *v = (*v - mean) / std;
                    }
                }
                (Some(FactorProcessing::Standardize), None)
            } else {
                warn!(factor = factor_name, "standardize skipped: zero std");
                (None, Some("zero standard deviation".to_string()))
            }
        }
        Some(FactorProcessing::Normalize) => {
            let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max > min {
                for v in values.iter_mut() {
                    if v.is_finite() {
                        *v = (*v - min) / (max - min);
                    }
                }
                (Some(FactorProcessing::Normalize), None)
            } else {
                warn!(factor = factor_name, "normalize skipped: flat range");
                (None, Some("max equals min".to_string()))
            }
        }
    };

    PreprocessSummary {
        winsorized_count,
        applied,
        skipped_reason,
    }
}
