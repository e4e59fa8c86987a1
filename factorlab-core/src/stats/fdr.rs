//! False discovery rate control — Benjamini-Hochberg and Benjamini-Yekutieli.
//!
//! Adjusted p-values use the step-up procedure, so corrected values are
//! monotone non-decreasing in raw-p order and clamped to 1. NaN p-values are
//! excluded from the correction and stay NaN in the output, preserving the
//! caller's positional alignment with factor names.

use serde::{Deserialize, Serialize};

/// Correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdrMethod {
    /// Benjamini-Hochberg: valid under independence / positive dependence.
    BenjaminiHochberg,
    /// Benjamini-Yekutieli: harmonic-number correction, valid under
    /// arbitrary dependence. More conservative.
    BenjaminiYekutieli,
}

/// Outcome of an FDR correction, position-aligned with the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdrOutcome {
    pub method: FdrMethod,
    pub alpha: f64,
    /// Adjusted p-values; NaN where the input was NaN.
    pub corrected_p: Vec<f64>,
    /// Rejection flags at `alpha`; false where the input was NaN.
    pub reject: Vec<bool>,
    pub n_significant: usize,
}

/// Apply FDR correction to a set of p-values.
pub fn fdr_correct(p_values: &[f64], method: FdrMethod, alpha: f64) -> FdrOutcome {
    let m_total = p_values.len();
    let mut corrected = vec![f64::NAN; m_total];
    let mut reject = vec![false; m_total];

    // Indices of usable p-values, sorted ascending by value
    let mut valid: Vec<usize> = (0..m_total).filter(|&i| p_values[i].is_finite()).collect();
    valid.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let m = valid.len();
    if m == 0 {
        return FdrOutcome {
            method,
            alpha,
            corrected_p: corrected,
            reject,
            n_significant: 0,
        };
    }

    // BY multiplies the BH factor by the harmonic number c_m
    let c_m = match method {
        FdrMethod::BenjaminiHochberg => 1.0,
        FdrMethod::BenjaminiYekutieli => (1..=m).map(|i| 1.0 / i as f64).sum(),
    };

    // Step-up adjustment, working backwards from the largest p-value:
    // adjusted(k) = min(p(k) * m * c_m / rank, adjusted(k+1)), clamped to 1
    let mut adjusted = vec![0.0; m];
    let mut running = 1.0_f64;
    for k in (0..m).rev() {
        let rank = (k + 1) as f64;
        let raw = p_values[valid[k]];
        running = (raw * m as f64 * c_m / rank).min(running).min(1.0);
        adjusted[k] = running;
    }

    let mut n_significant = 0;
    for (k, &original_index) in valid.iter().enumerate() {
        corrected[original_index] = adjusted[k];
        if adjusted[k] <= alpha {
            reject[original_index] = true;
            n_significant += 1;
        }
    }

    FdrOutcome {
        method,
        alpha,
        corrected_p: corrected,
        reject,
        n_significant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Benjamini-Hochberg ──

    #[test]
    fn bh_empty() {
        let outcome = fdr_correct(&[], FdrMethod::BenjaminiHochberg, 0.05);
        assert!(outcome.corrected_p.is_empty());
        assert_eq!(outcome.n_significant, 0);
    }

    #[test]
    fn bh_single_significant() {
        let outcome = fdr_correct(&[0.01], FdrMethod::BenjaminiHochberg, 0.05);
        assert!((outcome.corrected_p[0] - 0.01).abs() < 1e-12);
        assert!(outcome.reject[0]);
    }

    #[test]
    fn bh_mixed_significance() {
        let p = [0.001, 0.02, 0.04, 0.2, 0.5];
        let outcome = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);

        // Adjusted: [0.005, 0.05, 0.0667, 0.25, 0.5] — the first two survive
        assert!(outcome.reject[0]);
        assert!(outcome.reject[1]);
        assert!(!outcome.reject[2]);
        assert!(!outcome.reject[3]);
        assert!(!outcome.reject[4]);
        assert_eq!(outcome.n_significant, 2);
    }

    #[test]
    fn bh_adjusted_monotone_in_raw_order() {
        let p = [0.04, 0.001, 0.5, 0.02, 0.2];
        let outcome = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);

        let mut pairs: Vec<(f64, f64)> = p
            .iter()
            .zip(&outcome.corrected_p)
            .map(|(&raw, &adj)| (raw, adj))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for w in pairs.windows(2) {
            assert!(
                w[1].1 >= w[0].1 - 1e-12,
                "adjusted p not monotone: {pairs:?}"
            );
        }
    }

    #[test]
    fn bh_clamps_to_one() {
        let p = [0.9, 0.95, 0.99];
        let outcome = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);
        assert!(outcome.corrected_p.iter().all(|&v| v <= 1.0));
    }

    // ── NaN handling ──

    #[test]
    fn nan_values_passed_through() {
        let p = [0.001, f64::NAN, 0.02, f64::NAN];
        let outcome = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);
        assert!(outcome.corrected_p[1].is_nan());
        assert!(outcome.corrected_p[3].is_nan());
        assert!(!outcome.reject[1]);
        assert!(!outcome.reject[3]);
        // Correction runs over the two valid entries only: m = 2
        assert!((outcome.corrected_p[0] - 0.002).abs() < 1e-12);
        assert!((outcome.corrected_p[2] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn all_nan_flags_nothing() {
        let p = [f64::NAN, f64::NAN];
        let outcome = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);
        assert_eq!(outcome.n_significant, 0);
        assert!(outcome.corrected_p.iter().all(|v| v.is_nan()));
    }

    // ── Benjamini-Yekutieli ──

    #[test]
    fn by_more_conservative_than_bh() {
        let p = [0.001, 0.02, 0.04, 0.2, 0.5];
        let bh = fdr_correct(&p, FdrMethod::BenjaminiHochberg, 0.05);
        let by = fdr_correct(&p, FdrMethod::BenjaminiYekutieli, 0.05);
        for (a, b) in bh.corrected_p.iter().zip(&by.corrected_p) {
            assert!(b >= a, "BY should not be less conservative: {a} vs {b}");
        }
        assert!(by.n_significant <= bh.n_significant);
    }

    #[test]
    fn by_harmonic_factor_applied() {
        // m = 3: c_m = 1 + 1/2 + 1/3 = 11/6
        let p = [0.01, 0.6, 0.7];
        let by = fdr_correct(&p, FdrMethod::BenjaminiYekutieli, 0.05);
        let expected = 0.01 * 3.0 * (11.0 / 6.0) / 1.0;
        assert!((by.corrected_p[0] - expected).abs() < 1e-12);
    }
}
