//! FactorLab Core — statistical primitives for factor evaluation.
//!
//! This crate contains the numeric heart of the factor analyzer:
//! - Domain types (observations, the column-major factor table, schema contract)
//! - Correlation engine (Pearson, tie-aware Spearman)
//! - Robust-statistics toolkit (Kendall's tau, MAD-robust correlation,
//!   Mann-Whitney U, seeded bootstrap intervals, outlier detection,
//!   FDR correction, rolling-window IC decay)
//! - Compound annualization with reverse-validation
//!
//! Everything here is pure and synchronous: slices in, values out. The
//! orchestration layer lives in `factorlab-runner`.

pub mod annualize;
pub mod correlation;
pub mod domain;
pub mod schema;
pub mod stats;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result types shared with the runner are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Observation>();
        require_sync::<domain::Observation>();
        require_send::<schema::FactorTable>();
        require_sync::<schema::FactorTable>();
        require_send::<schema::SchemaError>();
        require_sync::<schema::SchemaError>();

        require_send::<correlation::CorrelationMethod>();
        require_sync::<correlation::CorrelationMethod>();

        require_send::<annualize::AnnualizeError>();
        require_sync::<annualize::AnnualizeError>();

        require_send::<stats::BootstrapConfig>();
        require_sync::<stats::BootstrapConfig>();
        require_send::<stats::BootstrapCi>();
        require_sync::<stats::BootstrapCi>();
        require_send::<stats::MannWhitneyResult>();
        require_sync::<stats::MannWhitneyResult>();
        require_send::<stats::FdrOutcome>();
        require_sync::<stats::FdrOutcome>();
        require_send::<stats::OutlierReport>();
        require_sync::<stats::OutlierReport>();
        require_send::<stats::RollingIcAnalysis>();
        require_sync::<stats::RollingIcAnalysis>();
    }
}
