//! FactorLab Runner — factor analysis orchestration.
//!
//! This crate builds on `factorlab-core` to provide:
//! - Analysis configuration with TOML loading and a deterministic run id
//! - Factor preprocessing (winsorization, standardize/normalize)
//! - Daily IC aggregation with adaptive gating and significance testing
//! - Bucketed group returns with compound annualization
//! - Composite factor scoring, letter ratings, and classification
//! - Structured per-run diagnostics

pub mod buckets;
pub mod config;
pub mod diagnostics;
pub mod ic;
pub mod preprocess;
pub mod runner;
pub mod scoring;

pub use buckets::{
    analyze_characteristics, bucket_sizes, compute_group_returns, BucketStatistics,
    DataCharacteristics, FrequencyClass, GroupReturns,
};
pub use config::{AnalysisConfig, ConfigError, FactorProcessing, RunId};
pub use diagnostics::{FactorDiagnostics, RunDiagnostics, SkipReason};
pub use ic::{
    compute_factor_ic, ExtraStatistics, FactorStatistics, IcComputationPath, IcSample, IcSeries,
    SampleTier,
};
pub use preprocess::{preprocess_factor, winsorize, PreprocessSummary};
pub use runner::{run_analysis, AnalysisError, AnalysisReport, FactorReport};
pub use scoring::{
    classify_factors, score_factor, FactorClassification, FactorDirection, FactorScore,
    RatingBand, SubScores,
};
