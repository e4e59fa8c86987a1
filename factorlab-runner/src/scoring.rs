//! Factor scoring and classification.
//!
//! Positive and negative factors are graded on distinct weighted rubrics:
//! a positive factor is judged mostly on raw predictive strength, a negative
//! one on the strength and consistency of its inversion. Each sub-metric
//! passes through a monotonic step function into a bounded score; the
//! weighted sum plus raw IC/IR thresholds resolve to a letter band. Strong
//! raw IC/IR can promote a factor past a middling composite score — the
//! override is intentional.

use serde::{Deserialize, Serialize};

use crate::ic::FactorStatistics;

// ─── Rating bands ────────────────────────────────────────────────────

/// Letter rating, high to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RatingBand {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    D,
}

impl RatingBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::D => "D",
        }
    }

    /// Human-readable usage recommendation for the band.
    pub fn usage_recommendation(&self) -> &'static str {
        match self {
            Self::APlus => "strongly recommended; core portfolio weight 15-25%",
            Self::A | Self::AMinus => "recommended; weight 10-15%",
            Self::BPlus => "worth considering; cap weight at 10% and monitor",
            Self::B => "use with caution; cap weight at 5%, review regularly",
            Self::BMinus => "marginal; cap weight below 5%",
            Self::CPlus => "not recommended; cap weight below 5% if used at all",
            Self::C | Self::CMinus => "not advised; signal too weak to trade",
            Self::D => "avoid; no usable signal",
        }
    }
}

impl std::fmt::Display for RatingBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of the factor's predictive relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorDirection {
    Positive,
    Negative,
}

/// Per-dimension sub-scores behind a composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    /// IC-strength score (positive) or inversion-intensity score (negative).
    pub ic: f64,
    pub significance: f64,
    pub stability: f64,
    pub return_performance: f64,
}

/// Final score card for one factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor_name: String,
    pub direction: FactorDirection,
    pub weighted_score: f64,
    pub rating: RatingBand,
    pub long_short_return: f64,
    pub sub_scores: SubScores,
    pub usage: String,
}

// ─── Step functions ──────────────────────────────────────────────────

fn score_ic_mean(ic_mean: f64) -> f64 {
    let abs_ic = ic_mean.abs();
    if abs_ic >= 0.12 {
        4.0
    } else if abs_ic >= 0.08 {
        3.5
    } else if abs_ic >= 0.05 {
        3.0
    } else if abs_ic >= 0.02 {
        2.0
    } else if abs_ic >= 0.01 {
        1.0
    } else {
        0.5
    }
}

fn score_significance(p_value: f64) -> f64 {
    if p_value.is_nan() {
        return 0.3;
    }
    if p_value < 0.01 {
        1.0
    } else if p_value < 0.05 {
        0.8
    } else if p_value < 0.1 {
        0.6
    } else {
        0.3
    }
}

fn score_ir(ir: f64) -> f64 {
    let abs_ir = ir.abs();
    if abs_ir >= 1.5 {
        2.5
    } else if abs_ir >= 1.0 {
        2.0
    } else if abs_ir >= 0.5 {
        1.5
    } else if abs_ir >= 0.3 {
        1.0
    } else if abs_ir >= 0.15 {
        0.8
    } else {
        0.5
    }
}

fn score_long_short(long_short: f64) -> f64 {
    if long_short.is_nan() {
        return 1.0;
    }
    let abs_ls = long_short.abs();
    if abs_ls >= 0.04 {
        2.0
    } else if abs_ls >= 0.03 {
        1.8
    } else if abs_ls >= 0.02 {
        1.5
    } else if abs_ls >= 0.01 {
        1.0
    } else {
        0.5
    }
}

fn score_negative_intensity(abs_ic_mean: f64) -> f64 {
    if abs_ic_mean >= 0.10 {
        4.0
    } else if abs_ic_mean >= 0.07 {
        3.5
    } else if abs_ic_mean >= 0.05 {
        3.0
    } else if abs_ic_mean >= 0.03 {
        2.0
    } else {
        1.0
    }
}

fn score_negative_stability(ir: f64) -> f64 {
    let abs_ir = ir.abs();
    if abs_ir >= 1.5 {
        2.0
    } else if abs_ir >= 1.0 {
        1.5
    } else if abs_ir >= 0.5 {
        1.0
    } else if abs_ir >= 0.2 {
        0.8
    } else {
        0.5
    }
}

/// A negative factor should see the low-factor buckets outperform, so the
/// spread itself carrying a negative sign is the "correct" direction.
fn score_negative_return(long_short: f64) -> f64 {
    if long_short.is_nan() {
        return 0.5;
    }
    if long_short < -0.02 {
        1.0
    } else if long_short < -0.01 {
        0.8
    } else if long_short < 0.0 {
        0.6
    } else {
        0.3
    }
}

// ─── Composite scoring ───────────────────────────────────────────────

/// Score one factor from its IC statistics and long/short spread.
pub fn score_factor(
    factor_name: &str,
    statistics: &FactorStatistics,
    long_short_return: f64,
) -> FactorScore {
    let ic_mean = statistics.ic_mean;
    let ir = statistics.ir;
    let p_value = statistics.p_value;

    let direction = if ic_mean < 0.0 {
        FactorDirection::Negative
    } else {
        FactorDirection::Positive
    };

    let (sub_scores, weighted_score) = match direction {
        FactorDirection::Positive => {
            let sub = SubScores {
                ic: score_ic_mean(ic_mean),
                significance: score_significance(p_value),
                stability: score_ir(ir),
                return_performance: score_long_short(long_short_return),
            };
            let total = sub.ic * 0.35
                + sub.significance * 0.25
                + sub.stability * 0.20
                + sub.return_performance * 0.20;
            (sub, total)
        }
        FactorDirection::Negative => {
            let sub = SubScores {
                ic: score_negative_intensity(ic_mean.abs()),
                significance: score_significance(p_value),
                stability: score_negative_stability(ir),
                return_performance: score_negative_return(long_short_return),
            };
            let total = sub.ic * 0.40
                + sub.significance * 0.30
                + sub.stability * 0.20
                + sub.return_performance * 0.10;
            (sub, total)
        }
    };

    let rating = match direction {
        FactorDirection::Positive => rate_positive(weighted_score, ic_mean, ir),
        FactorDirection::Negative => rate_negative(ic_mean.abs(), ir.abs()),
    };

    FactorScore {
        factor_name: factor_name.to_string(),
        direction,
        weighted_score,
        rating,
        long_short_return,
        sub_scores,
        usage: rating.usage_recommendation().to_string(),
    }
}

/// Positive rating ladder: raw IC/IR thresholds select the tier, the
/// composite score picks the step within it. NaN inputs fail every
/// comparison and land in D.
fn rate_positive(score: f64, ic_mean: f64, ir: f64) -> RatingBand {
    // Exceptional raw IC with solid IR promotes past the ordinary ladder
    if ic_mean >= 0.12 && ir.abs() >= 0.3 {
        if score >= 3.5 {
            return RatingBand::APlus;
        }
        if score >= 3.0 {
            return RatingBand::A;
        }
    }

    if ic_mean >= 0.08 && ir >= 0.3 {
        if score >= 3.5 {
            RatingBand::APlus
        } else if score >= 3.0 {
            RatingBand::A
        } else {
            RatingBand::AMinus
        }
    } else if ic_mean >= 0.05 && ir >= 0.2 {
        if score >= 2.5 {
            RatingBand::BPlus
        } else if score >= 2.0 {
            RatingBand::B
        } else {
            RatingBand::BMinus
        }
    } else if ic_mean >= 0.02 {
        if score >= 1.5 {
            RatingBand::CPlus
        } else if score >= 1.0 {
            RatingBand::C
        } else {
            RatingBand::CMinus
        }
    } else {
        RatingBand::D
    }
}

/// Negative rating ladder: driven by inversion strength and stability.
fn rate_negative(abs_ic: f64, abs_ir: f64) -> RatingBand {
    if abs_ic >= 0.08 && abs_ir >= 0.3 {
        RatingBand::AMinus
    } else if abs_ic >= 0.05 && abs_ir >= 0.2 {
        RatingBand::BPlus
    } else if abs_ic >= 0.03 {
        RatingBand::B
    } else if abs_ic >= 0.02 {
        RatingBand::CPlus
    } else {
        RatingBand::D
    }
}

// ─── Classification ──────────────────────────────────────────────────

/// Factors split by direction and ranked within each class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorClassification {
    /// Positive factors, strongest ic_mean first.
    pub positive: Vec<FactorScore>,
    /// Negative factors, most negative ic_mean first.
    pub negative: Vec<FactorScore>,
}

/// Split scored factors by direction and rank each class by IC strength.
///
/// `ic_means` supplies each factor's ic_mean for ordering, keyed positionally
/// to `scores`.
pub fn classify_factors(scores: Vec<FactorScore>, ic_means: &[f64]) -> FactorClassification {
    let mut positive: Vec<(f64, FactorScore)> = Vec::new();
    let mut negative: Vec<(f64, FactorScore)> = Vec::new();

    for (score, &ic_mean) in scores.into_iter().zip(ic_means) {
        match score.direction {
            FactorDirection::Positive => positive.push((ic_mean, score)),
            FactorDirection::Negative => negative.push((ic_mean, score)),
        }
    }

    // Strongest signal first in both classes; NaN ic_mean sorts last
    positive.sort_by(|a, b| compare_nan_last(b.0, a.0));
    negative.sort_by(|a, b| compare_nan_last(a.0, b.0));

    FactorClassification {
        positive: positive.into_iter().map(|(_, s)| s).collect(),
        negative: negative.into_iter().map(|(_, s)| s).collect(),
    }
}

fn compare_nan_last(a: f64, b: f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
    }
}
