//! Compound annualization with reverse-validation.
//!
//! The primary method is standard compounding: `(1 + r)^(1/Y) - 1`. A
//! log-domain CAGR computation runs alongside it as a drift cross-check —
//! mathematically identical, implemented independently on purpose so that a
//! regression in one path shows up as disagreement between the two. The
//! legacy linear annualization method is gone; its reporting slot is filled
//! with NaN by callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard cap on the observation period. Longer spans are treated as data
/// errors rather than annualized into nonsense.
const MAX_YEARS: f64 = 100.0;

/// Sanity bound on the annualized result: |annual| > 1000% is discarded.
const MAX_ANNUAL_RETURN: f64 = 10.0;

/// Default relative tolerance for reverse-validation.
pub const DEFAULT_REVERSE_TOLERANCE: f64 = 0.01;

/// Reasons an annualization is rejected. Callers degrade the affected bucket
/// to NaN and tally the reason; nothing here aborts a run.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum AnnualizeError {
    #[error("non-finite input (total_return={total_return}, years={years})")]
    NonFinite { total_return: f64, years: f64 },

    #[error("total return {0} is at or below -100%")]
    TotalReturnFloor(f64),

    #[error("observation period {0} years is not positive")]
    NonPositiveYears(f64),

    #[error("observation period {0} years exceeds the supported bound")]
    YearsTooLarge(f64),

    #[error("annualized return {0} is outside the ±1000% sanity bound")]
    ExtremeResult(f64),

    #[error("reverse-validation failed: relative error {relative_error} > {tolerance}")]
    ReverseValidationFailed {
        relative_error: f64,
        tolerance: f64,
    },
}

fn validate_inputs(total_return: f64, years: f64) -> Result<(), AnnualizeError> {
    if !total_return.is_finite() || !years.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return,
            years,
        });
    }
    if total_return <= -1.0 {
        return Err(AnnualizeError::TotalReturnFloor(total_return));
    }
    if years <= 0.0 {
        return Err(AnnualizeError::NonPositiveYears(years));
    }
    if years > MAX_YEARS {
        return Err(AnnualizeError::YearsTooLarge(years));
    }
    Ok(())
}

/// Standard compound annualization: `(1 + r)^(1/Y) - 1`.
pub fn compound_annual_return(total_return: f64, years: f64) -> Result<f64, AnnualizeError> {
    validate_inputs(total_return, years)?;
    let annual = (1.0 + total_return).powf(1.0 / years) - 1.0;
    if !annual.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return,
            years,
        });
    }
    if annual.abs() > MAX_ANNUAL_RETURN {
        return Err(AnnualizeError::ExtremeResult(annual));
    }
    Ok(annual)
}

/// CAGR via the log domain: `exp(ln(1 + r) / Y) - 1`.
///
/// Same mathematics as [`compound_annual_return`], distinct implementation.
/// Kept as a cross-check against drift, not as an alternative method.
pub fn cagr_annual_return(total_return: f64, years: f64) -> Result<f64, AnnualizeError> {
    validate_inputs(total_return, years)?;
    let log_final = (1.0 + total_return).ln();
    if !log_final.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return,
            years,
        });
    }
    let annual = (log_final / years).exp() - 1.0;
    if !annual.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return,
            years,
        });
    }
    if annual.abs() > MAX_ANNUAL_RETURN {
        return Err(AnnualizeError::ExtremeResult(annual));
    }
    Ok(annual)
}

/// Reverse-validate an annualized return: reconstruct `(1+annual)^Y - 1` and
/// require it to match the original total within `tolerance` relative error.
///
/// A near-zero original total is matched on absolute terms — relative error
/// is meaningless against a zero denominator.
pub fn reverse_validate(
    annual_return: f64,
    years: f64,
    original_total_return: f64,
    tolerance: f64,
) -> Result<(), AnnualizeError> {
    if !annual_return.is_finite() || !years.is_finite() || !original_total_return.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return: original_total_return,
            years,
        });
    }
    if years <= 0.0 {
        return Err(AnnualizeError::NonPositiveYears(years));
    }
    if annual_return <= -1.0 {
        return Err(AnnualizeError::TotalReturnFloor(annual_return));
    }

    let reconstructed = (1.0 + annual_return).powf(years) - 1.0;
    if !reconstructed.is_finite() {
        return Err(AnnualizeError::NonFinite {
            total_return: original_total_return,
            years,
        });
    }

    let error = (reconstructed - original_total_return).abs();
    if original_total_return.abs() <= 1e-10 {
        if error <= 1e-10 {
            return Ok(());
        }
        return Err(AnnualizeError::ReverseValidationFailed {
            relative_error: f64::INFINITY,
            tolerance,
        });
    }

    let relative_error = error / original_total_return.abs();
    if relative_error < tolerance {
        Ok(())
    } else {
        Err(AnnualizeError::ReverseValidationFailed {
            relative_error,
            tolerance,
        })
    }
}

/// Annualize and reverse-validate in one step; any failure reason is
/// surfaced so the caller can tally it before degrading to NaN.
pub fn validated_annual_return(
    total_return: f64,
    years: f64,
    tolerance: f64,
) -> Result<f64, AnnualizeError> {
    let annual = compound_annual_return(total_return, years)?;
    reverse_validate(annual, years, total_return, tolerance)?;
    Ok(annual)
}

/// Annualized standard deviation from a per-period standard deviation.
///
/// Scales the holding-period volatility to a daily figure, then to the
/// observation window: `(period_std / holding_days) * sqrt(years * 252 /
/// holding_days)`.
pub fn annualize_std(period_std: f64, holding_period_days: f64, years: f64) -> f64 {
    if !period_std.is_finite() || holding_period_days <= 0.0 || years <= 0.0 {
        return f64::NAN;
    }
    (period_std / holding_period_days) * (years * 252.0 / holding_period_days).sqrt()
}

/// Zero-guarded risk-adjusted ratio: 0 when the denominator is 0 or invalid.
pub fn risk_adjusted_ratio(annual_return: f64, annual_std: f64) -> f64 {
    if !annual_return.is_finite() || !annual_std.is_finite() || annual_std <= 0.0 {
        return 0.0;
    }
    annual_return / annual_std
}
