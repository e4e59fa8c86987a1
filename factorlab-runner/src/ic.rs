//! Daily IC aggregation and significance testing.
//!
//! For each signal date the engine gates the partition on adaptive
//! sample-count and variability thresholds, computes one correlation between
//! factor values and forward returns, and collects the survivors into an IC
//! series. Gating outcomes are explicit values (`IcSample` vs `SkipReason`),
//! not exceptions; every skip is tallied in the factor's diagnostics.
//!
//! Two fallbacks keep sparse data usable:
//! - a zero-variance partition borrows one pooled whole-sample correlation
//!   for that date before being given up on;
//! - a run that yields no usable days at all falls back to a single
//!   whole-dataset correlation with its own sample-size-adjusted t-test.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use factorlab_core::correlation::{pearson, CorrelationMethod};
use factorlab_core::domain::Observation;
use factorlab_core::stats::dist::two_tailed_t_p_value;
use factorlab_core::stats::{
    bootstrap_ci, distinct_count, kendall_tau, mann_whitney_u, mean_of, robust_correlation,
    sample_std, BootstrapCi, BootstrapConfig, BootstrapStatistic, MannWhitneyResult,
};

use crate::config::AnalysisConfig;
use crate::diagnostics::{FactorDiagnostics, SkipReason};

/// Minimum usable IC samples before the daily-path t-test is attempted.
const MIN_SERIES_FOR_T_TEST: usize = 5;

/// Minimum pooled rows for the per-date degenerate-variance fallback.
const MIN_POOLED_FALLBACK_ROWS: usize = 3;

// ─── Adaptive gating ─────────────────────────────────────────────────

/// Data-density tier derived from the average daily sample count. The tier
/// sets every per-day and pooled minimum, so gating adapts to sparsity
/// instead of using one fixed constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleTier {
    /// avg >= 5 samples/day
    High,
    /// avg >= 3 samples/day
    Medium,
    /// anything sparser
    Low,
}

impl SampleTier {
    pub fn from_avg_daily_samples(avg: f64) -> Self {
        if avg >= 5.0 {
            Self::High
        } else if avg >= 3.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Minimum valid rows a partition needs to be considered.
    pub fn min_samples_per_day(&self) -> usize {
        match self {
            Self::High => 5,
            Self::Medium => 3,
            Self::Low => 2,
        }
    }

    /// Minimum distinct values required of both series in a partition.
    pub fn min_unique_values(&self) -> usize {
        self.min_samples_per_day()
    }

    /// Minimum pooled rows for the whole-dataset fallback.
    pub fn min_pooled_samples(&self) -> usize {
        match self {
            Self::High => 25,
            Self::Medium => 15,
            Self::Low => 10,
        }
    }
}

// ─── Series types ────────────────────────────────────────────────────

/// One accepted daily IC observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcSample {
    pub date: NaiveDate,
    /// Correlation value; always within [-1, 1].
    pub value: f64,
    /// Valid rows in the partition that produced this sample.
    pub sample_count: usize,
    pub method: CorrelationMethod,
}

/// Date-ordered IC series for one factor — a strict subset of the distinct
/// signal dates that passed gating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IcSeries {
    samples: Vec<IcSample>,
}

impl IcSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[IcSample] {
        &self.samples
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    fn push(&mut self, sample: IcSample) {
        self.samples.push(sample);
    }
}

/// Which computation produced the factor's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcComputationPath {
    /// Mean/std/t over the daily IC series.
    Daily,
    /// Single whole-dataset correlation (daily path yielded nothing).
    WholeSample,
    /// Nothing could be computed; all statistics are NaN.
    Undefined,
}

/// Optional robustness statistics attached to the factor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraStatistics {
    pub kendall_tau: Option<f64>,
    pub robust_corr: Option<f64>,
    pub mann_whitney: Option<MannWhitneyResult>,
    pub bootstrap_ci: Option<BootstrapCi>,
}

/// Aggregate IC statistics for one factor. NaN marks anything undecidable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorStatistics {
    pub ic_mean: f64,
    /// Sample std (ddof = 1) on the daily path; the theoretical
    /// sqrt((1 - r²)/(n - 2)) on the whole-sample path.
    pub ic_std: f64,
    /// Information ratio: ic_mean / ic_std.
    pub ir: f64,
    pub t_stat: f64,
    pub p_value: f64,
    /// IC samples behind the statistics (days, or pooled rows for the
    /// whole-sample path).
    pub sample_count: usize,
    pub path: IcComputationPath,
    pub extra: ExtraStatistics,
}

impl FactorStatistics {
    /// The "no signal detected" sentinel: emitted, never an error.
    pub fn undefined() -> Self {
        Self {
            ic_mean: f64::NAN,
            ic_std: f64::NAN,
            ir: f64::NAN,
            t_stat: f64::NAN,
            p_value: f64::NAN,
            sample_count: 0,
            path: IcComputationPath::Undefined,
            extra: ExtraStatistics::default(),
        }
    }
}

// ─── Daily aggregation ───────────────────────────────────────────────

/// Compute the IC series and aggregate statistics for one factor.
///
/// Never fails: total inability to compute yields an all-NaN
/// `FactorStatistics` with an empty series, plus diagnostics explaining why.
pub fn compute_factor_ic(
    observations: &[Observation],
    config: &AnalysisConfig,
) -> (FactorStatistics, IcSeries, FactorDiagnostics) {
    let mut diagnostics = FactorDiagnostics::default();
    let mut series = IcSeries::default();

    let partitions = partition_by_date(observations);
    diagnostics.total_dates = partitions.len();
    if partitions.is_empty() {
        return (FactorStatistics::undefined(), series, diagnostics);
    }

    let counts: Vec<f64> = partitions.values().map(|rows| rows.len() as f64).collect();
    let avg_daily = mean_of(&counts);
    let tier = SampleTier::from_avg_daily_samples(avg_daily);
    diagnostics.avg_daily_samples = avg_daily;
    diagnostics.min_samples_per_day = tier.min_samples_per_day();

    // Pooled correlation shared by every zero-variance partition; computed
    // at most once.
    let mut pooled_fallback: Option<Option<f64>> = None;

    for (&date, rows) in &partitions {
        match evaluate_partition(date, rows, tier, config.correlation_method, || {
            *pooled_fallback.get_or_insert_with(|| pooled_correlation(observations))
        }) {
            Ok(PartitionIc { sample, pooled }) => {
                if pooled {
                    diagnostics.pooled_fallback_dates += 1;
                }
                diagnostics.processed_dates += 1;
                series.push(sample);
            }
            Err(reason) => {
                debug!(%date, %reason, "partition skipped");
                diagnostics.record_skip(date, reason);
            }
        }
    }

    if !series.is_empty() {
        let stats = daily_series_statistics(&series, config);
        return (stats, series, diagnostics);
    }

    // Zero usable days: one whole-dataset correlation with its own test.
    warn!("no usable daily partitions; falling back to whole-sample IC");
    let stats = whole_sample_statistics(observations, tier, config)
        .unwrap_or_else(FactorStatistics::undefined);
    (stats, series, diagnostics)
}

fn partition_by_date(observations: &[Observation]) -> BTreeMap<NaiveDate, Vec<&Observation>> {
    let mut partitions: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        partitions.entry(obs.date).or_default().push(obs);
    }
    partitions
}

/// Outcome of a successful partition evaluation.
struct PartitionIc {
    sample: IcSample,
    /// True when the value came from the whole-sample fallback rather than
    /// the partition itself.
    pooled: bool,
}

/// Gate one daily partition and compute its IC.
///
/// `pooled` supplies the lazily computed whole-sample correlation used when
/// a partition has zero variance in either series.
fn evaluate_partition(
    date: NaiveDate,
    rows: &[&Observation],
    tier: SampleTier,
    method: CorrelationMethod,
    pooled: impl FnOnce() -> Option<f64>,
) -> Result<PartitionIc, SkipReason> {
    let need = tier.min_samples_per_day();
    if rows.len() < need {
        return Err(SkipReason::InsufficientSamples {
            have: rows.len(),
            need,
        });
    }

    let factors: Vec<f64> = rows.iter().map(|o| o.factor_value).collect();
    let returns: Vec<f64> = rows.iter().map(|o| o.forward_return).collect();

    let factor_std = sample_std(&factors);
    let return_std = sample_std(&returns);
    let factor_degenerate = !(factor_std > 0.0);
    let return_degenerate = !(return_std > 0.0);

    if factor_degenerate || return_degenerate {
        // Borrow the pooled correlation for this date before giving up.
        if let Some(value) = pooled() {
            return Ok(PartitionIc {
                sample: IcSample {
                    date,
                    value,
                    sample_count: rows.len(),
                    method: CorrelationMethod::Pearson,
                },
                pooled: true,
            });
        }
        return Err(if factor_degenerate {
            SkipReason::ZeroFactorVariance
        } else {
            SkipReason::ZeroReturnVariance
        });
    }

    let need_unique = tier.min_unique_values();
    let factor_unique = distinct_count(&factors);
    if factor_unique < need_unique {
        return Err(SkipReason::LowFactorVariability {
            unique: factor_unique,
            need: need_unique,
        });
    }
    let return_unique = distinct_count(&returns);
    if return_unique < need_unique {
        return Err(SkipReason::LowReturnVariability {
            unique: return_unique,
            need: need_unique,
        });
    }

    let value = method.compute(&factors, &returns);
    if !value.is_finite() {
        return Err(SkipReason::NonFiniteCorrelation);
    }

    Ok(PartitionIc {
        sample: IcSample {
            date,
            value,
            sample_count: rows.len(),
            method,
        },
        pooled: false,
    })
}

/// Pooled Pearson correlation over every observation, used as the
/// degenerate-partition stand-in.
fn pooled_correlation(observations: &[Observation]) -> Option<f64> {
    if observations.len() < MIN_POOLED_FALLBACK_ROWS {
        return None;
    }
    let factors: Vec<f64> = observations.iter().map(|o| o.factor_value).collect();
    let returns: Vec<f64> = observations.iter().map(|o| o.forward_return).collect();
    let value = pearson(&factors, &returns);
    value.is_finite().then_some(value)
}

// ─── Significance ────────────────────────────────────────────────────

/// Mean / sample std / t / two-tailed p for an IC series.
///
/// The t-test needs at least 5 samples and a positive std; below that the
/// mean and std are still reported with NaN significance.
fn series_significance(values: &[f64]) -> (f64, f64, f64, f64) {
    let n = values.len();
    let ic_mean = mean_of(values);
    let ic_std = sample_std(values);

    if n >= MIN_SERIES_FOR_T_TEST && ic_std.is_finite() && ic_std > 0.0 {
        let t_stat = ic_mean / (ic_std / (n as f64).sqrt());
        let p_value = two_tailed_t_p_value(t_stat, (n - 1) as f64);
        (ic_mean, ic_std, t_stat, p_value)
    } else {
        (ic_mean, ic_std, f64::NAN, f64::NAN)
    }
}

fn information_ratio(ic_mean: f64, ic_std: f64) -> f64 {
    if ic_std.is_finite() && ic_std > 0.0 && ic_mean.is_finite() {
        ic_mean / ic_std
    } else {
        f64::NAN
    }
}

fn daily_series_statistics(series: &IcSeries, config: &AnalysisConfig) -> FactorStatistics {
    let values = series.values();
    let (ic_mean, ic_std, t_stat, p_value) = series_significance(&values);

    FactorStatistics {
        ic_mean,
        ic_std,
        ir: information_ratio(ic_mean, ic_std),
        t_stat,
        p_value,
        sample_count: series.len(),
        path: IcComputationPath::Daily,
        extra: daily_extra_statistics(&values, config),
    }
}

/// Robustness statistics on the daily path: the IC series is examined as a
/// time series (trend, drift, distance from zero).
fn daily_extra_statistics(ic_values: &[f64], config: &AnalysisConfig) -> ExtraStatistics {
    let index: Vec<f64> = (0..ic_values.len()).map(|i| i as f64).collect();
    let zeros = vec![0.0; ic_values.len()];

    ExtraStatistics {
        kendall_tau: config
            .enable_kendall
            .then(|| kendall_tau(&index, ic_values)),
        robust_corr: config
            .enable_robust_corr
            .then(|| robust_correlation(&index, ic_values)),
        mann_whitney: config
            .enable_nonparam_test
            .then(|| mann_whitney_u(ic_values, &zeros)),
        bootstrap_ci: config.enable_bootstrap_ci.then(|| {
            // CI on the IC mean: mean difference against a zero series
            bootstrap_ci(
                ic_values,
                &zeros,
                BootstrapStatistic::MeanDifference,
                &bootstrap_config(config),
            )
        }),
    }
}

fn bootstrap_config(config: &AnalysisConfig) -> BootstrapConfig {
    BootstrapConfig {
        n_resamples: config.n_bootstrap,
        confidence_level: config.confidence_level,
        seed: config.bootstrap_seed,
    }
}

/// Whole-dataset fallback: one correlation over all pooled rows with a
/// sample-size-adjusted significance test (dof = n - 2, Spearman-form t).
fn whole_sample_statistics(
    observations: &[Observation],
    tier: SampleTier,
    config: &AnalysisConfig,
) -> Option<FactorStatistics> {
    let n = observations.len();
    if n < tier.min_pooled_samples() {
        return None;
    }

    let factors: Vec<f64> = observations.iter().map(|o| o.factor_value).collect();
    let returns: Vec<f64> = observations.iter().map(|o| o.forward_return).collect();

    let need_unique = tier.min_unique_values();
    if distinct_count(&factors) < need_unique || distinct_count(&returns) < need_unique {
        return None;
    }

    let ic = config.correlation_method.compute(&factors, &returns);
    if !ic.is_finite() {
        return None;
    }

    // Theoretical sampling std of the coefficient
    let ic_std = if n > 2 {
        ((1.0 - ic * ic) / (n - 2) as f64).sqrt()
    } else {
        f64::NAN
    };

    let (t_stat, p_value) = if ic.abs() < 1.0 {
        let t = ic * ((n - 2) as f64 / (1.0 - ic * ic)).sqrt();
        (t, two_tailed_t_p_value(t, (n - 2) as f64))
    } else {
        // |r| = 1: the t-statistic is unbounded
        (f64::NAN, f64::NAN)
    };

    let extra = ExtraStatistics {
        kendall_tau: config
            .enable_kendall
            .then(|| kendall_tau(&factors, &returns)),
        robust_corr: config
            .enable_robust_corr
            .then(|| robust_correlation(&factors, &returns)),
        mann_whitney: config
            .enable_nonparam_test
            .then(|| mann_whitney_u(&factors, &returns)),
        bootstrap_ci: config.enable_bootstrap_ci.then(|| {
            bootstrap_ci(
                &factors,
                &returns,
                BootstrapStatistic::Correlation,
                &bootstrap_config(config),
            )
        }),
    };

    Some(FactorStatistics {
        ic_mean: ic,
        ic_std,
        ir: information_ratio(ic, ic_std),
        t_stat,
        p_value,
        sample_count: n,
        path: IcComputationPath::WholeSample,
        extra,
    })
}
