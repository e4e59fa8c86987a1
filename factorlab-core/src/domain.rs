//! Domain types shared across the analysis pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single cleaned observation: one entity, one signal date, one factor
/// exposure, and the realized forward return.
///
/// Observations are produced by [`crate::schema::FactorTable::observations`]
/// and are guaranteed to carry only finite values. They are immutable for the
/// lifetime of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub entity_name: String,
    pub date: NaiveDate,
    pub factor_value: f64,
    pub forward_return: f64,
}

impl Observation {
    pub fn new(
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
        date: NaiveDate,
        factor_value: f64,
        forward_return: f64,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            date,
            factor_value,
            forward_return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_construction() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let obs = Observation::new("600519", "Kweichow Moutai", date, 0.5, 0.012);
        assert_eq!(obs.entity_id, "600519");
        assert_eq!(obs.date, date);
        assert!((obs.factor_value - 0.5).abs() < 1e-12);
    }
}
