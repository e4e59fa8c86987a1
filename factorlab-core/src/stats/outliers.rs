//! Outlier detection — IQR fences, z-scores, and modified z-scores.
//!
//! Detection only: nothing here removes points. The analysis keeps every
//! observation and reports which ones look extreme.

use serde::{Deserialize, Serialize};

use crate::stats::bootstrap::percentile_sorted;
use crate::stats::{mean_of, median_of, population_std};
use crate::stats::robust::median_abs_deviation;

/// Detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Tukey fences: 1.5×IQR mild, 3×IQR extreme.
    Iqr,
    /// |z| > 3 against mean and population std.
    ZScore,
    /// 0.6745·(x − median)/MAD, threshold 3.5.
    ModifiedZScore,
}

/// Per-point outlier flags plus the thresholds that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    /// One flag per input point.
    pub outlier_mask: Vec<bool>,
    /// Extreme (3×IQR) flags — populated for the IQR method only.
    pub extreme_mask: Vec<bool>,
    /// (lower, upper) fence for IQR; (threshold, threshold) otherwise.
    pub threshold: (f64, f64),
}

/// Detect outliers in a series. Fewer than 3 points flags nothing.
pub fn detect_outliers(values: &[f64], method: OutlierMethod) -> OutlierReport {
    let n = values.len();
    if n < 3 {
        return OutlierReport {
            method,
            outlier_mask: vec![false; n],
            extreme_mask: vec![false; n],
            threshold: (f64::NAN, f64::NAN),
        };
    }

    match method {
        OutlierMethod::Iqr => {
            let mut sorted: Vec<f64> = values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let q1 = percentile_sorted(&sorted, 25.0);
            let q3 = percentile_sorted(&sorted, 75.0);
            let iqr = q3 - q1;

            let lower = q1 - 1.5 * iqr;
            let upper = q3 + 1.5 * iqr;
            let extreme_lower = q1 - 3.0 * iqr;
            let extreme_upper = q3 + 3.0 * iqr;

            OutlierReport {
                method,
                outlier_mask: values.iter().map(|&v| v < lower || v > upper).collect(),
                extreme_mask: values
                    .iter()
                    .map(|&v| v < extreme_lower || v > extreme_upper)
                    .collect(),
                threshold: (lower, upper),
            }
        }
        OutlierMethod::ZScore => {
            let mean = mean_of(values);
            let std = population_std(values);
            let threshold = 3.0;
            let mask = if std > 0.0 {
                values
                    .iter()
                    .map(|&v| ((v - mean) / std).abs() > threshold)
                    .collect()
            } else {
                vec![false; n]
            };
            OutlierReport {
                method,
                outlier_mask: mask,
                extreme_mask: vec![false; n],
                threshold: (threshold, threshold),
            }
        }
        OutlierMethod::ModifiedZScore => {
            let med = median_of(values);
            let mad = median_abs_deviation(values);
            let threshold = 3.5;
            let mask = if mad > 0.0 {
                values
                    .iter()
                    .map(|&v| (0.6745 * (v - med) / mad).abs() > threshold)
                    .collect()
            } else {
                vec![false; n]
            };
            OutlierReport {
                method,
                outlier_mask: mask,
                extreme_mask: vec![false; n],
                threshold: (threshold, threshold),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_outlier() -> Vec<f64> {
        let mut v: Vec<f64> = (0..30).map(|i| 10.0 + (i % 7) as f64 * 0.5).collect();
        v.push(500.0);
        v
    }

    #[test]
    fn iqr_flags_extreme_point() {
        let values = with_outlier();
        let report = detect_outliers(&values, OutlierMethod::Iqr);
        assert!(report.outlier_mask[values.len() - 1]);
        assert!(report.extreme_mask[values.len() - 1]);
        assert_eq!(report.outlier_mask[..10].iter().filter(|&&b| b).count(), 0);
    }

    #[test]
    fn iqr_mild_but_not_extreme() {
        // Bulk at 0..=9 repeated; 18.0 is past 1.5×IQR but inside 3×IQR
        let mut values: Vec<f64> = (0..40).map(|i| (i % 10) as f64).collect();
        values.push(18.0);
        let report = detect_outliers(&values, OutlierMethod::Iqr);
        let last = values.len() - 1;
        assert!(report.outlier_mask[last]);
        assert!(!report.extreme_mask[last]);
    }

    #[test]
    fn zscore_flags_extreme_point() {
        let values = with_outlier();
        let report = detect_outliers(&values, OutlierMethod::ZScore);
        assert!(report.outlier_mask[values.len() - 1]);
    }

    #[test]
    fn modified_zscore_flags_extreme_point() {
        let values = with_outlier();
        let report = detect_outliers(&values, OutlierMethod::ModifiedZScore);
        assert!(report.outlier_mask[values.len() - 1]);
    }

    #[test]
    fn constant_series_flags_nothing() {
        let values = vec![4.0; 20];
        for method in [
            OutlierMethod::Iqr,
            OutlierMethod::ZScore,
            OutlierMethod::ModifiedZScore,
        ] {
            let report = detect_outliers(&values, method);
            assert!(report.outlier_mask.iter().all(|&b| !b), "{method:?}");
        }
    }

    #[test]
    fn short_series_flags_nothing() {
        let report = detect_outliers(&[1.0, 1000.0], OutlierMethod::Iqr);
        assert_eq!(report.outlier_mask, vec![false, false]);
        assert!(report.threshold.0.is_nan());
    }
}
