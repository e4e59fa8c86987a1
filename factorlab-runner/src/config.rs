//! Serializable analysis configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use factorlab_core::correlation::CorrelationMethod;

/// Unique identifier for an analysis run (content-addressable hash).
pub type RunId = String;

/// Errors from configuration validation or loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no factor columns configured")]
    NoFactorColumns,

    #[error("return column name is empty")]
    EmptyReturnColumn,

    #[error("n_buckets must be at least 2, got {0}")]
    TooFewBuckets(usize),

    #[error("confidence level must be in (0, 1), got {0}")]
    InvalidConfidenceLevel(f64),

    #[error("n_bootstrap must be positive")]
    ZeroBootstrapDraws,

    #[error("winsorize limits ({0}, {1}) must satisfy 0 <= low < high <= 1")]
    InvalidWinsorizeLimits(f64, f64),

    #[error("holding period must be positive, got {0}")]
    InvalidHoldingPeriod(f64),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How factor values are rescaled before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorProcessing {
    /// (x - mean) / std
    Standardize,
    /// (x - min) / (max - min)
    Normalize,
}

/// Configuration for a single analysis run.
///
/// The defaults mirror the full-analysis path: Spearman IC, five buckets,
/// every robustness statistic enabled, raw (unprocessed) factor values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Factor columns to evaluate, in report order.
    pub factor_columns: Vec<String>,

    /// Forward-return column shared by every factor.
    pub return_column: String,

    /// Number of factor-sorted buckets for the group-return analysis.
    pub n_buckets: usize,

    /// Correlation coefficient used for the IC.
    pub correlation_method: CorrelationMethod,

    /// Holding period behind the forward-return column, in days.
    pub holding_period_days: f64,

    // Robustness statistics
    pub enable_kendall: bool,
    pub enable_robust_corr: bool,
    pub enable_nonparam_test: bool,
    pub enable_bootstrap_ci: bool,
    pub n_bootstrap: usize,
    pub confidence_level: f64,
    pub bootstrap_seed: u64,

    /// Significance level for the cross-factor FDR correction.
    pub fdr_alpha: f64,

    /// Rolling-window sizes (unique signal dates per window); empty disables
    /// the rolling analysis.
    pub rolling_windows: Vec<usize>,

    // Factor preprocessing
    pub winsorize: bool,
    pub winsorize_limits: (f64, f64),
    pub factor_processing: Option<FactorProcessing>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            factor_columns: Vec::new(),
            return_column: "forward_return".to_string(),
            n_buckets: 5,
            correlation_method: CorrelationMethod::Spearman,
            holding_period_days: 2.0,
            enable_kendall: true,
            enable_robust_corr: true,
            enable_nonparam_test: true,
            enable_bootstrap_ci: true,
            n_bootstrap: 1000,
            confidence_level: 0.95,
            bootstrap_seed: 42,
            fdr_alpha: 0.05,
            rolling_windows: vec![30, 60],
            winsorize: false,
            winsorize_limits: (0.01, 0.99),
            factor_processing: None,
        }
    }
}

impl AnalysisConfig {
    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, which makes results
    /// reproducible and cacheable by the caller.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("AnalysisConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }

    /// Load a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_toml_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the config for structurally invalid settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factor_columns.is_empty() {
            return Err(ConfigError::NoFactorColumns);
        }
        if self.return_column.is_empty() {
            return Err(ConfigError::EmptyReturnColumn);
        }
        if self.n_buckets < 2 {
            return Err(ConfigError::TooFewBuckets(self.n_buckets));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::InvalidConfidenceLevel(self.confidence_level));
        }
        if !(self.fdr_alpha > 0.0 && self.fdr_alpha < 1.0) {
            return Err(ConfigError::InvalidConfidenceLevel(self.fdr_alpha));
        }
        if self.enable_bootstrap_ci && self.n_bootstrap == 0 {
            return Err(ConfigError::ZeroBootstrapDraws);
        }
        let (low, high) = self.winsorize_limits;
        if !(0.0..1.0).contains(&low) || !(low..=1.0).contains(&high) || low >= high {
            return Err(ConfigError::InvalidWinsorizeLimits(low, high));
        }
        if !(self.holding_period_days > 0.0) {
            return Err(ConfigError::InvalidHoldingPeriod(self.holding_period_days));
        }
        Ok(())
    }
}
