//! Percentile bootstrap confidence intervals.
//!
//! Resamples observation indices with replacement under a seeded RNG, so a
//! fixed seed gives a byte-for-byte reproducible interval. At least 10 valid
//! resampled statistics are required; below that the bounds degrade to NaN
//! rather than reporting an interval nobody should trust.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::correlation::pearson;
use crate::stats::mean_of;

/// Minimum number of valid resampled statistics for a usable interval.
const MIN_VALID_RESAMPLES: usize = 10;

/// Which statistic to bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStatistic {
    /// Pearson correlation of the resampled pairs.
    Correlation,
    /// mean(x*) - mean(y*) of the resampled pairs.
    MeanDifference,
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of resamples (default 1000).
    pub n_resamples: usize,
    /// Confidence level for the percentile interval (default 0.95).
    pub confidence_level: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_resamples: 1000,
            confidence_level: 0.95,
            seed: 42,
        }
    }
}

/// A percentile bootstrap confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapCi {
    pub lower: f64,
    pub upper: f64,
    /// Number of resamples that produced a finite statistic.
    pub n_valid: usize,
}

impl BootstrapCi {
    fn insufficient(n_valid: usize) -> Self {
        Self {
            lower: f64::NAN,
            upper: f64::NAN,
            n_valid,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }
}

/// Percentile bootstrap CI for a paired statistic.
///
/// `x` and `y` must have equal length >= 2; indices are resampled jointly so
/// pairing survives each draw. Resamples producing a non-finite statistic
/// (e.g. a constant-x draw under the correlation statistic) are discarded.
pub fn bootstrap_ci(
    x: &[f64],
    y: &[f64],
    statistic: BootstrapStatistic,
    config: &BootstrapConfig,
) -> BootstrapCi {
    let n = x.len();
    if n < 2 || n != y.len() {
        return BootstrapCi::insufficient(0);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = Vec::with_capacity(config.n_resamples);

    for _ in 0..config.n_resamples {
        let mut boot_x = Vec::with_capacity(n);
        let mut boot_y = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.gen_range(0..n);
            boot_x.push(x[idx]);
            boot_y.push(y[idx]);
        }

        let value = match statistic {
            BootstrapStatistic::Correlation => pearson(&boot_x, &boot_y),
            BootstrapStatistic::MeanDifference => mean_of(&boot_x) - mean_of(&boot_y),
        };
        if value.is_finite() {
            stats.push(value);
        }
    }

    if stats.len() < MIN_VALID_RESAMPLES {
        return BootstrapCi::insufficient(stats.len());
    }

    stats.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let alpha = 1.0 - config.confidence_level;
    BootstrapCi {
        lower: percentile_sorted(&stats, 100.0 * alpha / 2.0),
        upper: percentile_sorted(&stats, 100.0 * (1.0 - alpha / 2.0)),
        n_valid: stats.len(),
    }
}

/// Percentile of a sorted slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
