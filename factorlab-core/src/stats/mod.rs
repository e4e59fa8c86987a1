//! Robust-statistics toolkit — stateless leaf utilities.
//!
//! Everything in this module is a pure function over numeric slices: no
//! orchestration state, no I/O. The daily aggregator and the group-return
//! engine both call into here.

pub mod bootstrap;
pub mod dist;
pub mod fdr;
pub mod kendall;
pub mod nonparam;
pub mod outliers;
pub mod robust;
pub mod rolling;

pub use bootstrap::{bootstrap_ci, BootstrapCi, BootstrapConfig, BootstrapStatistic};
pub use fdr::{fdr_correct, FdrMethod, FdrOutcome};
pub use kendall::kendall_tau;
pub use nonparam::{mann_whitney_u, MannWhitneyResult};
pub use outliers::{detect_outliers, OutlierMethod, OutlierReport};
pub use robust::{robust_correlation, trimmed_correlation};
pub use rolling::{rolling_ic_analysis, RollingIcAnalysis};

// ─── Shared numeric helpers ──────────────────────────────────────────

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); NaN for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_of(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (ddof = 0); 0.0 for fewer than 2 values.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_of(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median; NaN for an empty slice.
pub fn median_of(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Count of distinct values under exact bit-level equality.
///
/// The variability gate asks "how many distinct factor levels exist today",
/// so exact comparison is the right notion — near-duplicates are distinct.
pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_known_values() {
        let values = [0.10, -0.05, 0.20, 0.00, 0.15];
        assert!((mean_of(&values) - 0.08).abs() < 1e-12);
        // ddof=1: sqrt(0.043 / 4)
        assert!((sample_std(&values) - (0.043_f64 / 4.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sample_std_short_input() {
        assert!(sample_std(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn population_std_smaller_than_sample_std() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(population_std(&values) < sample_std(&values));
    }

    #[test]
    fn median_odd_and_even() {
        assert!((median_of(&[3.0, 1.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!((median_of(&[4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < 1e-12);
        assert!(median_of(&[]).is_nan());
    }

    #[test]
    fn distinct_count_with_duplicates() {
        assert_eq!(distinct_count(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]), 3);
        assert_eq!(distinct_count(&[]), 0);
        assert_eq!(distinct_count(&[5.0; 10]), 1);
    }
}
