//! Bucketed group returns — the monotonic-spread view of a factor.
//!
//! All valid observations are sorted ascending by factor value and split into
//! near-equal buckets; bucket boundaries come from sort order alone, never
//! from dates. Each bucket gets raw return statistics plus compound
//! annualization with reverse-validation; annualizations that fail validation
//! degrade that bucket's annualized figures to NaN and are tallied.

use serde::{Deserialize, Serialize};
use tracing::debug;

use factorlab_core::annualize::{
    annualize_std, cagr_annual_return, risk_adjusted_ratio, validated_annual_return,
    AnnualizeError, DEFAULT_REVERSE_TOLERANCE,
};
use factorlab_core::domain::Observation;
use factorlab_core::stats::dist::two_tailed_t_p_value;
use factorlab_core::stats::{mean_of, sample_std};

use crate::config::AnalysisConfig;

/// Floor applied to bucket p-values so a vanishing tail never prints as zero.
const P_VALUE_FLOOR: f64 = 1e-10;

// ─── Data characteristics ────────────────────────────────────────────

/// Trading-frequency class, from trades per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyClass {
    /// More than 100 signals per year.
    High,
    /// More than 20 signals per year.
    Medium,
    Low,
}

/// Observation-period characteristics feeding the annualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCharacteristics {
    pub total_observations: usize,
    /// Span of signal dates in years (365.25-day years).
    pub observation_years: f64,
    /// Mean gap between consecutive signal rows, in days.
    pub mean_signal_interval_days: f64,
    pub trades_per_year: f64,
    pub frequency_class: FrequencyClass,
    pub holding_period_days: f64,
}

/// Derive period characteristics from the observation dates.
pub fn analyze_characteristics(
    observations: &[Observation],
    holding_period_days: f64,
) -> DataCharacteristics {
    let mut dates: Vec<_> = observations.iter().map(|o| o.date).collect();
    dates.sort();

    let total_days = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days(),
        _ => 0,
    };
    let observation_years = total_days as f64 / 365.25;

    let diffs: Vec<f64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect();
    let mean_interval = mean_of(&diffs);
    let trades_per_year = if mean_interval > 0.0 {
        365.0 / mean_interval
    } else {
        365.0
    };

    let frequency_class = if trades_per_year > 100.0 {
        FrequencyClass::High
    } else if trades_per_year > 20.0 {
        FrequencyClass::Medium
    } else {
        FrequencyClass::Low
    };

    DataCharacteristics {
        total_observations: observations.len(),
        observation_years,
        mean_signal_interval_days: mean_interval,
        trades_per_year,
        frequency_class,
        holding_period_days,
    }
}

// ─── Bucket statistics ───────────────────────────────────────────────

/// Statistics for one factor-sorted bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketStatistics {
    /// 1-based bucket index; bucket 1 holds the lowest factor values.
    pub bucket_index: usize,
    pub factor_min: f64,
    pub factor_max: f64,
    pub mean_return: f64,
    /// Sample std (ddof = 1); NaN for a single-row bucket.
    pub std_return: f64,
    pub count: usize,
    pub t_stat: f64,
    pub p_value: f64,
    /// P(return > 0) within the bucket.
    pub win_rate: f64,
    /// Largest peak-to-trough drawdown of the cumulative product, as a
    /// positive magnitude.
    pub max_drawdown: f64,
    /// Single-period mean/std ratio.
    pub sharpe: f64,
    /// Single-period mean over downside std (returns < 0 only).
    pub sortino: f64,
    /// Compound annualized return; NaN when validation rejected it.
    pub annualized_return: f64,
    /// Log-domain CAGR cross-check of `annualized_return`.
    pub cagr_check: f64,
    /// Deprecated linear-annualization slot; always NaN.
    pub linear_annualized: f64,
    pub annualized_std: f64,
    pub annualized_sharpe: f64,
    pub annualized_sortino: f64,
}

/// Group-return analysis for one factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReturns {
    pub buckets: Vec<BucketStatistics>,
    /// max - min of the bucket annualized returns; NaN when fewer than two
    /// buckets annualized successfully.
    pub long_short_return: f64,
    pub characteristics: DataCharacteristics,
}

/// Near-equal bucket sizes: ⌊total/n⌋ each, remainder spread one per bucket
/// starting from the first.
pub fn bucket_sizes(total: usize, n_buckets: usize) -> Vec<usize> {
    if n_buckets == 0 {
        return Vec::new();
    }
    let base = total / n_buckets;
    let remainder = total % n_buckets;
    (0..n_buckets)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// Compute the bucketed group-return analysis for one factor.
///
/// Returns None when there are no valid observations (the factor is still
/// emitted upstream, with NaN spread). Annualization failures per bucket are
/// returned alongside for the diagnostics accumulator.
pub fn compute_group_returns(
    observations: &[Observation],
    config: &AnalysisConfig,
) -> (Option<GroupReturns>, Vec<(usize, AnnualizeError)>) {
    if observations.is_empty() {
        return (None, Vec::new());
    }

    let characteristics = analyze_characteristics(observations, config.holding_period_days);
    let years = characteristics.observation_years;

    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by(|a, b| {
        a.factor_value
            .partial_cmp(&b.factor_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut failures = Vec::new();
    let mut buckets = Vec::with_capacity(config.n_buckets);
    let mut offset = 0;

    for (i, size) in bucket_sizes(sorted.len(), config.n_buckets)
        .into_iter()
        .enumerate()
    {
        let bucket_index = i + 1;
        let rows = &sorted[offset..offset + size];
        offset += size;

        if rows.is_empty() {
            // More buckets than observations: emit an empty placeholder so
            // the bucket count stays contiguous for reporting.
            buckets.push(empty_bucket(bucket_index));
            continue;
        }

        buckets.push(bucket_statistics(
            bucket_index,
            rows,
            &characteristics,
            years,
            &mut failures,
        ));
    }

    let annualized: Vec<f64> = buckets
        .iter()
        .map(|b| b.annualized_return)
        .filter(|v| v.is_finite())
        .collect();
    let long_short_return = if annualized.len() >= 2 {
        let max = annualized.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = annualized.iter().copied().fold(f64::INFINITY, f64::min);
        max - min
    } else {
        f64::NAN
    };

    (
        Some(GroupReturns {
            buckets,
            long_short_return,
            characteristics,
        }),
        failures,
    )
}

fn empty_bucket(bucket_index: usize) -> BucketStatistics {
    BucketStatistics {
        bucket_index,
        factor_min: f64::NAN,
        factor_max: f64::NAN,
        mean_return: f64::NAN,
        std_return: f64::NAN,
        count: 0,
        t_stat: f64::NAN,
        p_value: f64::NAN,
        win_rate: 0.0,
        max_drawdown: 0.0,
        sharpe: 0.0,
        sortino: 0.0,
        annualized_return: f64::NAN,
        cagr_check: f64::NAN,
        linear_annualized: f64::NAN,
        annualized_std: f64::NAN,
        annualized_sharpe: 0.0,
        annualized_sortino: 0.0,
    }
}

fn bucket_statistics(
    bucket_index: usize,
    rows: &[&Observation],
    characteristics: &DataCharacteristics,
    years: f64,
    failures: &mut Vec<(usize, AnnualizeError)>,
) -> BucketStatistics {
    let returns: Vec<f64> = rows.iter().map(|o| o.forward_return).collect();
    let count = returns.len();

    let mean_return = mean_of(&returns);
    let std_return = sample_std(&returns);

    let (t_stat, p_value) = if count > 1 && std_return.is_finite() && std_return > 0.0 {
        let t = mean_return / (std_return / (count as f64).sqrt());
        let p = two_tailed_t_p_value(t, (count - 1) as f64).max(P_VALUE_FLOOR);
        (t, p)
    } else {
        (f64::NAN, f64::NAN)
    };

    let win_rate = returns.iter().filter(|&&r| r > 0.0).count() as f64 / count as f64;
    let max_drawdown = max_drawdown_magnitude(&returns);

    let sharpe = if std_return.is_finite() && std_return > 0.0 {
        mean_return / std_return
    } else {
        0.0
    };

    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_std = if downside.len() >= 2 {
        sample_std(&downside)
    } else {
        f64::NAN
    };
    let sortino = if downside_std.is_finite() && downside_std > 0.0 {
        mean_return / downside_std
    } else {
        0.0
    };

    // Compound annualization of the bucket's mean holding-period return,
    // with the CAGR cross-check running in parallel.
    let annualized_return =
        match validated_annual_return(mean_return, years, DEFAULT_REVERSE_TOLERANCE) {
            Ok(value) => value,
            Err(reason) => {
                debug!(bucket_index, %reason, "annualization discarded");
                failures.push((bucket_index, reason));
                f64::NAN
            }
        };
    let cagr_check = cagr_annual_return(mean_return, years).unwrap_or(f64::NAN);

    let holding = characteristics.holding_period_days;
    let annualized_std = annualize_std(std_return, holding, years);
    let annualized_downside_std = annualize_std(downside_std, holding, years);

    BucketStatistics {
        bucket_index,
        factor_min: rows.first().map(|o| o.factor_value).unwrap_or(f64::NAN),
        factor_max: rows.last().map(|o| o.factor_value).unwrap_or(f64::NAN),
        mean_return,
        std_return,
        count,
        t_stat,
        p_value,
        win_rate,
        max_drawdown,
        sharpe,
        sortino,
        annualized_return,
        cagr_check,
        linear_annualized: f64::NAN,
        annualized_std,
        annualized_sharpe: risk_adjusted_ratio(annualized_return, annualized_std),
        annualized_sortino: risk_adjusted_ratio(annualized_return, annualized_downside_std),
    }
}

/// Largest drawdown of the cumulative product of (1 + r) taken in bucket
/// order, reported as a positive magnitude. 0 for monotone growth.
fn max_drawdown_magnitude(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mut cumulative = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &r in returns {
        cumulative *= 1.0 + r;
        if cumulative > peak {
            peak = cumulative;
        }
        if peak > 0.0 {
            let drawdown = (cumulative - peak) / peak;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            factor_columns: vec!["f".into()],
            return_column: "r".into(),
            ..AnalysisConfig::default()
        }
    }

    /// `n` observations spread weekly over ~2 years; return rises with the
    /// factor so bucket means are monotone.
    fn monotone_dataset(n: usize) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        (0..n)
            .map(|i| {
                let date = start + chrono::Duration::days((i as i64 * 730) / n as i64);
                let factor = i as f64;
                let ret = -0.01 + 0.0005 * i as f64;
                Observation::new(format!("E{i}"), format!("Entity {i}"), date, factor, ret)
            })
            .collect()
    }

    // ── Bucket sizes ──

    #[test]
    fn sizes_23_into_5() {
        assert_eq!(bucket_sizes(23, 5), vec![5, 5, 5, 4, 4]);
    }

    #[test]
    fn sizes_exact_division() {
        assert_eq!(bucket_sizes(10, 5), vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn sizes_remainder_goes_to_front() {
        assert_eq!(bucket_sizes(7, 3), vec![3, 2, 2]);
        assert_eq!(bucket_sizes(11, 4), vec![3, 3, 3, 2]);
    }

    #[test]
    fn sizes_fewer_rows_than_buckets() {
        assert_eq!(bucket_sizes(3, 5), vec![1, 1, 1, 0, 0]);
    }

    // ── Partition invariants ──

    #[test]
    fn buckets_partition_sample_exactly() {
        let observations = monotone_dataset(23);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        assert_eq!(group.buckets.len(), 5);
        let counts: Vec<usize> = group.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![5, 5, 5, 4, 4]);
        assert_eq!(counts.iter().sum::<usize>(), 23);
    }

    #[test]
    fn bucket_boundaries_follow_sort_order() {
        let observations = monotone_dataset(50);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        for pair in group.buckets.windows(2) {
            assert!(pair[0].factor_max <= pair[1].factor_min);
            assert!(pair[0].factor_min <= pair[0].factor_max);
        }
    }

    #[test]
    fn monotone_factor_gives_monotone_bucket_means() {
        let observations = monotone_dataset(100);
        let (result, failures) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        assert!(failures.is_empty(), "failures: {failures:?}");
        for pair in group.buckets.windows(2) {
            assert!(pair[0].mean_return < pair[1].mean_return);
        }
        assert!(group.long_short_return > 0.0);
    }

    // ── Per-bucket statistics ──

    #[test]
    fn win_rate_counts_positive_returns() {
        let observations = monotone_dataset(100);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        // Lowest bucket: returns -0.01..-0.0005, all negative
        assert_eq!(group.buckets[0].win_rate, 0.0);
        // Highest bucket: all positive
        assert_eq!(group.buckets[4].win_rate, 1.0);
    }

    #[test]
    fn drawdown_zero_for_all_positive_bucket() {
        let observations = monotone_dataset(100);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        assert_eq!(group.buckets[4].max_drawdown, 0.0);
        // All-negative bucket: the cumulative product only falls
        assert!(group.buckets[0].max_drawdown > 0.0);
    }

    #[test]
    fn drawdown_known_sequence() {
        // 1.0 -> 1.1 -> 0.99 -> peak 1.1, trough 0.99: 10% drawdown
        let dd = max_drawdown_magnitude(&[0.1, -0.1]);
        assert!((dd - 0.1).abs() < 1e-12);
        assert_eq!(max_drawdown_magnitude(&[0.1]), 0.0);
    }

    #[test]
    fn sortino_zero_without_downside() {
        let observations = monotone_dataset(100);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        assert_eq!(group.buckets[4].sortino, 0.0);
        assert!(group.buckets[4].sharpe > 0.0);
    }

    #[test]
    fn bucket_t_stats_defined_for_varied_buckets() {
        let observations = monotone_dataset(100);
        let (result, _) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        for bucket in &group.buckets {
            assert!(bucket.t_stat.is_finite());
            assert!(bucket.p_value >= P_VALUE_FLOOR);
            assert!(bucket.p_value <= 1.0);
        }
    }

    // ── Annualization plumbing ──

    #[test]
    fn annualized_figures_populated_over_multi_year_span() {
        let observations = monotone_dataset(100);
        let (result, failures) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        assert!(failures.is_empty());
        for bucket in &group.buckets {
            assert!(bucket.annualized_return.is_finite());
            // The CAGR cross-check must agree with the primary path
            assert!((bucket.annualized_return - bucket.cagr_check).abs() < 1e-10);
            // The deprecated linear slot stays NaN
            assert!(bucket.linear_annualized.is_nan());
            assert!(bucket.annualized_std.is_finite());
        }
    }

    #[test]
    fn single_date_span_degrades_annualization_to_nan() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let observations: Vec<Observation> = (0..20)
            .map(|i| {
                Observation::new(
                    format!("E{i}"),
                    format!("Entity {i}"),
                    date,
                    i as f64,
                    0.001 * i as f64,
                )
            })
            .collect();
        let (result, failures) = compute_group_returns(&observations, &config());
        let group = result.unwrap();
        // Zero-year span: every bucket's annualization is rejected
        assert_eq!(failures.len(), group.buckets.len());
        assert!(group
            .buckets
            .iter()
            .all(|b| b.annualized_return.is_nan() && b.annualized_sharpe == 0.0));
        assert!(group.long_short_return.is_nan());
        // Raw statistics remain intact
        assert!(group.buckets[0].mean_return.is_finite());
    }

    #[test]
    fn empty_observations_yield_none() {
        let (result, failures) = compute_group_returns(&[], &config());
        assert!(result.is_none());
        assert!(failures.is_empty());
    }

    // ── Characteristics ──

    #[test]
    fn characteristics_measure_span_and_frequency() {
        let observations = monotone_dataset(100);
        let c = analyze_characteristics(&observations, 2.0);
        assert_eq!(c.total_observations, 100);
        assert!((c.observation_years - 2.0).abs() < 0.1, "{}", c.observation_years);
        // ~50 signals/year: Medium frequency
        assert_eq!(c.frequency_class, FrequencyClass::Medium);
        assert!(c.trades_per_year > 20.0 && c.trades_per_year < 100.0);
        assert_eq!(c.holding_period_days, 2.0);
    }

    #[test]
    fn characteristics_single_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let observations =
            vec![Observation::new("A", "Alpha", date, 1.0, 0.01); 5];
        let c = analyze_characteristics(&observations, 2.0);
        assert_eq!(c.observation_years, 0.0);
        // Zero mean interval falls back to daily frequency
        assert_eq!(c.trades_per_year, 365.0);
        assert_eq!(c.frequency_class, FrequencyClass::High);
    }
}
