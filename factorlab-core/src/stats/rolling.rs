//! Rolling-window IC decay and stability analysis.
//!
//! Slides a fixed-size window of consecutive unique signal dates across the
//! observation set and computes one rank IC per window, then derives decay
//! and stability metrics from the resulting window-IC series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::correlation::{pearson, spearman};
use crate::domain::Observation;
use crate::stats::{mean_of, population_std};

/// Decay/stability metrics for one window size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingIcAnalysis {
    /// Window size in unique signal dates.
    pub window_size: usize,
    /// One (window end date, IC) per valid window, in date order.
    pub windows: Vec<(NaiveDate, f64)>,
    pub mean_ic: f64,
    pub ic_std: f64,
    pub mean_abs_ic: f64,
    /// First window ordinal (1-based) where |IC| falls to half the initial
    /// |IC|; None if it never decays that far or the initial IC is zero.
    pub half_life: Option<usize>,
    /// Correlation of window index against IC — a drift/persistence measure.
    pub persistence: f64,
    /// std/|mean| of the window ICs; infinite when the mean is zero.
    pub coefficient_of_variation: f64,
}

/// Run a rolling-window IC analysis for one window size.
///
/// Observations must carry finite values (the table extraction guarantees
/// this). A window contributes an IC only when it holds at least
/// `2 * window_size` observations and the Spearman coefficient is finite.
pub fn rolling_ic_analysis(observations: &[Observation], window_size: usize) -> RollingIcAnalysis {
    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by_key(|obs| obs.date);

    let mut unique_dates: Vec<NaiveDate> = sorted.iter().map(|obs| obs.date).collect();
    unique_dates.dedup();

    let mut windows = Vec::new();
    if window_size > 0 && unique_dates.len() >= window_size {
        for start in 0..=unique_dates.len() - window_size {
            let window_dates = &unique_dates[start..start + window_size];
            let first = window_dates[0];
            let last = window_dates[window_size - 1];

            let rows: Vec<&&Observation> = sorted
                .iter()
                .filter(|obs| obs.date >= first && obs.date <= last)
                .collect();
            if rows.len() < window_size * 2 {
                continue;
            }

            let factors: Vec<f64> = rows.iter().map(|obs| obs.factor_value).collect();
            let returns: Vec<f64> = rows.iter().map(|obs| obs.forward_return).collect();
            let ic = spearman(&factors, &returns);
            if ic.is_finite() {
                windows.push((last, ic));
            }
        }
    }

    let ics: Vec<f64> = windows.iter().map(|&(_, ic)| ic).collect();
    let mean_ic = if ics.is_empty() {
        f64::NAN
    } else {
        mean_of(&ics)
    };
    let ic_std = if ics.is_empty() {
        f64::NAN
    } else {
        population_std(&ics)
    };
    let mean_abs_ic = if ics.is_empty() {
        f64::NAN
    } else {
        mean_of(&ics.iter().map(|v| v.abs()).collect::<Vec<_>>())
    };

    let half_life = half_life_of(&ics);

    let persistence = if ics.len() > 1 {
        let index: Vec<f64> = (0..ics.len()).map(|i| i as f64).collect();
        pearson(&index, &ics)
    } else {
        f64::NAN
    };

    let coefficient_of_variation = if ics.is_empty() || mean_ic.is_nan() {
        f64::NAN
    } else if mean_ic == 0.0 {
        f64::INFINITY
    } else {
        ic_std / mean_ic.abs()
    };

    RollingIcAnalysis {
        window_size,
        windows,
        mean_ic,
        ic_std,
        mean_abs_ic,
        half_life,
        persistence,
        coefficient_of_variation,
    }
}

/// First 1-based window index where |IC| decays to half the initial |IC|.
fn half_life_of(ics: &[f64]) -> Option<usize> {
    let initial = ics.first()?.abs();
    if initial == 0.0 {
        return None;
    }
    ics.iter()
        .position(|ic| ic.abs() <= initial / 2.0 && ic.abs() < initial)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, month, day).unwrap()
    }

    /// `per_day` observations on each of `n_days` dates; factor predicts the
    /// return with strength `signal` and deterministic noise.
    fn synthetic(n_days: u32, per_day: usize, signal: f64) -> Vec<Observation> {
        let mut out = Vec::new();
        for d in 0..n_days {
            let day = date(1 + d / 28, 1 + d % 28);
            for k in 0..per_day {
                let factor = (k as f64) + ((d * 7 + k as u32) as f64 * 0.37).sin();
                let noise = ((d * 13 + k as u32) as f64 * 0.61).cos();
                let ret = signal * factor + 0.3 * noise;
                out.push(Observation::new(
                    format!("E{k}"),
                    format!("Entity {k}"),
                    day,
                    factor,
                    ret,
                ));
            }
        }
        out
    }

    #[test]
    fn windows_cover_all_offsets() {
        let obs = synthetic(20, 4, 1.0);
        let analysis = rolling_ic_analysis(&obs, 5);
        // 20 unique dates, window 5 -> up to 16 windows, all dense enough here
        assert_eq!(analysis.windows.len(), 16);
        assert_eq!(analysis.window_size, 5);
    }

    #[test]
    fn strong_signal_gives_high_mean_ic() {
        let obs = synthetic(24, 5, 2.0);
        let analysis = rolling_ic_analysis(&obs, 6);
        assert!(analysis.mean_ic > 0.5, "mean IC {}", analysis.mean_ic);
        assert!(analysis.mean_abs_ic >= analysis.mean_ic.abs());
        assert!(analysis.half_life.is_none());
    }

    #[test]
    fn windows_in_date_order() {
        let obs = synthetic(15, 4, 1.0);
        let analysis = rolling_ic_analysis(&obs, 4);
        for w in analysis.windows.windows(2) {
            assert!(w[0].0 < w[1].0);
        }
    }

    #[test]
    fn too_few_dates_yields_empty_analysis() {
        let obs = synthetic(3, 4, 1.0);
        let analysis = rolling_ic_analysis(&obs, 10);
        assert!(analysis.windows.is_empty());
        assert!(analysis.mean_ic.is_nan());
        assert!(analysis.half_life.is_none());
        assert!(analysis.persistence.is_nan());
    }

    #[test]
    fn sparse_windows_skipped() {
        // One observation per day: a window of w dates holds w rows,
        // below the 2w density requirement
        let obs = synthetic(20, 1, 1.0);
        let analysis = rolling_ic_analysis(&obs, 5);
        assert!(analysis.windows.is_empty());
    }

    // ── Half-life ──

    #[test]
    fn half_life_detects_decay() {
        let ics = [0.4, 0.35, 0.3, 0.19, 0.1];
        // First |IC| <= 0.2 is at index 3 -> window ordinal 4
        assert_eq!(half_life_of(&ics), Some(4));
    }

    #[test]
    fn half_life_none_without_decay() {
        assert_eq!(half_life_of(&[0.4, 0.38, 0.41, 0.39]), None);
        assert_eq!(half_life_of(&[]), None);
        assert_eq!(half_life_of(&[0.0, 0.0]), None);
    }
}
