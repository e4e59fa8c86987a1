//! Structured run diagnostics.
//!
//! Every degraded computation — a skipped date, a failed annualization, a
//! preprocessing fallback — lands here as data. Each component builds its own
//! `FactorDiagnostics` value and returns it; the runner merges them into a
//! `RunDiagnostics` keyed by factor. Nothing is accumulated through shared
//! mutable state, and nothing in here is ever a reason to abort a run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use factorlab_core::annualize::AnnualizeError;

use crate::preprocess::PreprocessSummary;

/// Why a daily partition produced no IC sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer valid rows than the adaptive per-day minimum.
    InsufficientSamples { have: usize, need: usize },
    /// Factor values have zero standard deviation and the pooled fallback
    /// was unavailable.
    ZeroFactorVariance,
    /// Return values have zero standard deviation and the pooled fallback
    /// was unavailable.
    ZeroReturnVariance,
    /// Too few distinct factor values.
    LowFactorVariability { unique: usize, need: usize },
    /// Too few distinct return values.
    LowReturnVariability { unique: usize, need: usize },
    /// The correlation came back NaN or infinite.
    NonFiniteCorrelation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples { have, need } => {
                write!(f, "insufficient samples ({have} < {need})")
            }
            Self::ZeroFactorVariance => write!(f, "factor values have zero variance"),
            Self::ZeroReturnVariance => write!(f, "return values have zero variance"),
            Self::LowFactorVariability { unique, need } => {
                write!(f, "factor variability too low ({unique} unique < {need})")
            }
            Self::LowReturnVariability { unique, need } => {
                write!(f, "return variability too low ({unique} unique < {need})")
            }
            Self::NonFiniteCorrelation => write!(f, "correlation was not finite"),
        }
    }
}

/// Everything that went sideways while evaluating one factor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorDiagnostics {
    pub total_dates: usize,
    pub processed_dates: usize,
    pub skipped_dates: usize,
    /// Dates rescued by the pooled whole-sample fallback.
    pub pooled_fallback_dates: usize,
    pub avg_daily_samples: f64,
    pub min_samples_per_day: usize,
    /// Skipped dates with the reason each was dropped.
    pub skipped: Vec<(NaiveDate, SkipReason)>,
    /// Buckets whose annualization was discarded, with the reason.
    pub annualization_failures: Vec<(usize, AnnualizeError)>,
    pub preprocess: Option<PreprocessSummary>,
    /// IQR outliers observed in the factor column (detection only; no
    /// observation is removed).
    pub outlier_count: usize,
    /// Outliers beyond the 3×IQR fences.
    pub extreme_outlier_count: usize,
}

impl FactorDiagnostics {
    pub fn record_skip(&mut self, date: NaiveDate, reason: SkipReason) {
        self.skipped_dates += 1;
        self.skipped.push((date, reason));
    }

    /// Count of skips matching a predicate, for reporting breakdowns.
    pub fn skip_count_where(&self, predicate: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|(_, r)| predicate(r)).count()
    }
}

/// Per-run diagnostics, keyed by factor name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDiagnostics {
    per_factor: BTreeMap<String, FactorDiagnostics>,
}

impl RunDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one factor's diagnostics into the run map.
    pub fn insert(&mut self, factor: impl Into<String>, diagnostics: FactorDiagnostics) {
        self.per_factor.insert(factor.into(), diagnostics);
    }

    pub fn factor(&self, name: &str) -> Option<&FactorDiagnostics> {
        self.per_factor.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactorDiagnostics)> {
        self.per_factor.iter()
    }

    pub fn len(&self) -> usize {
        self.per_factor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_factor.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn record_skip_tallies() {
        let mut diag = FactorDiagnostics::default();
        diag.record_skip(date(1), SkipReason::ZeroFactorVariance);
        diag.record_skip(
            date(2),
            SkipReason::InsufficientSamples { have: 1, need: 3 },
        );
        assert_eq!(diag.skipped_dates, 2);
        assert_eq!(
            diag.skip_count_where(|r| matches!(r, SkipReason::ZeroFactorVariance)),
            1
        );
    }

    #[test]
    fn run_diagnostics_keyed_by_factor() {
        let mut run = RunDiagnostics::new();
        let mut diag = FactorDiagnostics::default();
        diag.total_dates = 10;
        run.insert("momentum", diag);

        assert_eq!(run.len(), 1);
        assert_eq!(run.factor("momentum").unwrap().total_dates, 10);
        assert!(run.factor("absent").is_none());
    }

    #[test]
    fn skip_reason_display_is_descriptive() {
        let reason = SkipReason::InsufficientSamples { have: 2, need: 5 };
        assert_eq!(reason.to_string(), "insufficient samples (2 < 5)");
        assert!(SkipReason::NonFiniteCorrelation.to_string().contains("finite"));
    }
}
