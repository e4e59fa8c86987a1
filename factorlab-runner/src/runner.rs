//! Analysis orchestration — one call per run, one report per factor.
//!
//! The runner walks the configured factor list through the full pipeline:
//! preprocessing → daily IC aggregation → bucketed group returns → optional
//! rolling-window analyses → scoring, merging each component's diagnostics
//! into a per-run accumulator. Only schema and configuration problems abort
//! the run; a factor with no computable signal is emitted with all-NaN
//! statistics so the reporting layer can flag it instead of crashing.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use factorlab_core::schema::{FactorTable, SchemaError};
use factorlab_core::stats::{
    detect_outliers, fdr_correct, rolling_ic_analysis, FdrMethod, FdrOutcome, OutlierMethod,
    RollingIcAnalysis,
};

use crate::buckets::{compute_group_returns, GroupReturns};
use crate::config::{AnalysisConfig, ConfigError, RunId};
use crate::diagnostics::RunDiagnostics;
use crate::ic::{compute_factor_ic, FactorStatistics, IcSeries};
use crate::preprocess::preprocess_factor;
use crate::scoring::{classify_factors, score_factor, FactorClassification, FactorScore};

/// Fatal analysis errors. Everything else degrades to NaN + diagnostics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Everything computed for one factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorReport {
    pub factor_name: String,
    pub statistics: FactorStatistics,
    pub ic_series: IcSeries,
    /// None when the factor had no valid observations.
    pub group_returns: Option<GroupReturns>,
    /// One entry per configured rolling window size.
    pub rolling: Vec<RollingIcAnalysis>,
    pub score: FactorScore,
}

/// Output of a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Deterministic fingerprint of the configuration that produced this.
    pub run_id: RunId,
    /// Per-factor reports, in configuration order.
    pub factors: Vec<FactorReport>,
    /// Factors split by direction and ranked within each class.
    pub classification: FactorClassification,
    /// Benjamini-Hochberg correction over the factor p-values,
    /// position-aligned with `factors`. NaN p-values stay NaN.
    pub fdr: FdrOutcome,
    pub diagnostics: RunDiagnostics,
}

/// Run the full factor analysis over an observation table.
pub fn run_analysis(
    table: &FactorTable,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;

    let mut required: Vec<&str> = vec![config.return_column.as_str()];
    required.extend(config.factor_columns.iter().map(String::as_str));
    table.validate_schema(&required)?;

    let mut working = table.clone();
    let mut diagnostics = RunDiagnostics::new();
    let mut reports = Vec::with_capacity(config.factor_columns.len());

    for factor in &config.factor_columns {
        info!(factor = %factor, "analyzing factor");

        let mut values = working
            .column(factor)
            .ok_or_else(|| SchemaError::MissingColumn {
                name: factor.clone(),
            })?
            .to_vec();
        let preprocess_summary = preprocess_factor(
            factor,
            &mut values,
            config.winsorize,
            config.winsorize_limits,
            config.factor_processing,
        );
        working.set_column(factor, values)?;

        let observations = working.observations(factor, &config.return_column)?;

        let (statistics, ic_series, mut factor_diag) = compute_factor_ic(&observations, config);
        factor_diag.preprocess = Some(preprocess_summary);

        let factor_values: Vec<f64> = observations.iter().map(|o| o.factor_value).collect();
        let outliers = detect_outliers(&factor_values, OutlierMethod::Iqr);
        factor_diag.outlier_count = outliers.outlier_mask.iter().filter(|&&b| b).count();
        factor_diag.extreme_outlier_count = outliers.extreme_mask.iter().filter(|&&b| b).count();

        let (group_returns, annualization_failures) = compute_group_returns(&observations, config);
        factor_diag.annualization_failures = annualization_failures;

        let rolling: Vec<RollingIcAnalysis> = config
            .rolling_windows
            .iter()
            .map(|&window| rolling_ic_analysis(&observations, window))
            .collect();

        let long_short = group_returns
            .as_ref()
            .map(|g| g.long_short_return)
            .unwrap_or(f64::NAN);
        let score = score_factor(factor, &statistics, long_short);

        info!(
            factor = %factor,
            ic_mean = statistics.ic_mean,
            rating = %score.rating,
            "factor analyzed"
        );

        diagnostics.insert(factor.clone(), factor_diag);
        reports.push(FactorReport {
            factor_name: factor.clone(),
            statistics,
            ic_series,
            group_returns,
            rolling,
            score,
        });
    }

    let ic_means: Vec<f64> = reports.iter().map(|r| r.statistics.ic_mean).collect();
    let scores: Vec<FactorScore> = reports.iter().map(|r| r.score.clone()).collect();
    let classification = classify_factors(scores, &ic_means);

    // One hypothesis test per factor: control the false discovery rate
    // across the whole family before anyone reads the p-values.
    let p_values: Vec<f64> = reports.iter().map(|r| r.statistics.p_value).collect();
    let fdr = fdr_correct(&p_values, FdrMethod::BenjaminiHochberg, config.fdr_alpha);

    Ok(AnalysisReport {
        run_id: config.run_id(),
        factors: reports,
        classification,
        fdr,
        diagnostics,
    })
}
