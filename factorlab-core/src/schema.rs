//! Observation table and schema contract — the boundary between the external
//! ingestion collaborator and the analysis engine.
//!
//! The table is column-major: entity ids/names and signal dates are parallel
//! row vectors, factor and return columns are named `f64` vectors with NaN as
//! the missing-value sentinel. Ingestion (percentage-string parsing, date
//! coercion) happens upstream; by the time a `FactorTable` exists, every cell
//! is either a finite number or NaN.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Observation;

/// Fatal schema violations. Per-cell problems (NaN, infinities) are handled
/// row-by-row downstream; these abort the run.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column '{name}'")]
    MissingColumn { name: String },

    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("table has no rows")]
    EmptyTable,
}

/// In-memory observation table for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorTable {
    entity_ids: Vec<String>,
    entity_names: Vec<String>,
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl FactorTable {
    /// Build a table from parallel row vectors and named value columns.
    ///
    /// Every column must match the row count of the id/name/date vectors.
    pub fn new(
        entity_ids: Vec<String>,
        entity_names: Vec<String>,
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, SchemaError> {
        let rows = entity_ids.len();
        if rows == 0 {
            return Err(SchemaError::EmptyTable);
        }
        for (name, actual) in [
            ("entity_name", entity_names.len()),
            ("date", dates.len()),
        ] {
            if actual != rows {
                return Err(SchemaError::LengthMismatch {
                    name: name.to_string(),
                    expected: rows,
                    actual,
                });
            }
        }
        for (name, values) in &columns {
            if values.len() != rows {
                return Err(SchemaError::LengthMismatch {
                    name: name.clone(),
                    expected: rows,
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            entity_ids,
            entity_names,
            dates,
            columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.entity_ids.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Replace a column's values in place (used by factor preprocessing).
    ///
    /// Returns a `SchemaError` if the column is absent or the length differs.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), SchemaError> {
        if values.len() != self.row_count() {
            return Err(SchemaError::LengthMismatch {
                name: name.to_string(),
                expected: self.row_count(),
                actual: values.len(),
            });
        }
        match self.columns.get_mut(name) {
            Some(col) => {
                *col = values;
                Ok(())
            }
            None => Err(SchemaError::MissingColumn {
                name: name.to_string(),
            }),
        }
    }

    /// Check that every required column is present.
    pub fn validate_schema(&self, required: &[&str]) -> Result<(), SchemaError> {
        for &name in required {
            if !self.columns.contains_key(name) {
                return Err(SchemaError::MissingColumn {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Extract the finite-valued observations for one factor/return pair.
    ///
    /// Rows where either the factor or the return is NaN/∞ are dropped — the
    /// per-factor equivalent of the original dataset's dropna step.
    pub fn observations(
        &self,
        factor_col: &str,
        return_col: &str,
    ) -> Result<Vec<Observation>, SchemaError> {
        let factor = self
            .column(factor_col)
            .ok_or_else(|| SchemaError::MissingColumn {
                name: factor_col.to_string(),
            })?;
        let returns = self
            .column(return_col)
            .ok_or_else(|| SchemaError::MissingColumn {
                name: return_col.to_string(),
            })?;

        let mut out = Vec::with_capacity(self.row_count());
        for i in 0..self.row_count() {
            let f = factor[i];
            let r = returns[i];
            if f.is_finite() && r.is_finite() {
                out.push(Observation {
                    entity_id: self.entity_ids[i].clone(),
                    entity_name: self.entity_names[i].clone(),
                    date: self.dates[i],
                    factor_value: f,
                    forward_return: r,
                });
            }
        }
        Ok(out)
    }
}
