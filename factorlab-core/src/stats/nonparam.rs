//! Mann-Whitney U test with a large-sample normal approximation.

use serde::{Deserialize, Serialize};

use crate::correlation::mid_ranks;
use crate::stats::dist::two_tailed_normal_p_value;

/// Result of a Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyResult {
    /// The smaller of U1 and U2.
    pub u_statistic: f64,
    /// Two-tailed p-value from the normal approximation.
    pub p_value: f64,
}

impl MannWhitneyResult {
    fn undefined() -> Self {
        Self {
            u_statistic: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

/// Mann-Whitney U test of two independent samples.
///
/// Non-finite values are dropped before ranking; mid-ranks handle ties. An
/// empty sample on either side yields NaN statistics, and a zero variance
/// term (possible only in degenerate tie structures) yields p = 1.0.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> MannWhitneyResult {
    let x: Vec<f64> = x.iter().copied().filter(|v| v.is_finite()).collect();
    let y: Vec<f64> = y.iter().copied().filter(|v| v.is_finite()).collect();

    if x.is_empty() || y.is_empty() {
        return MannWhitneyResult::undefined();
    }

    let n1 = x.len();
    let n2 = y.len();

    let mut combined = Vec::with_capacity(n1 + n2);
    combined.extend_from_slice(&x);
    combined.extend_from_slice(&y);
    let ranks = mid_ranks(&combined);

    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.min(u2);

    let n = (n1 + n2) as f64;
    let mean_u = (n1 * n2) as f64 / 2.0;
    let var_u = (n1 * n2) as f64 * (n + 1.0) / 12.0;

    if var_u == 0.0 {
        return MannWhitneyResult {
            u_statistic: u,
            p_value: 1.0,
        };
    }

    let z = (u - mean_u) / var_u.sqrt();
    MannWhitneyResult {
        u_statistic: u,
        p_value: two_tailed_normal_p_value(z),
    }
}
