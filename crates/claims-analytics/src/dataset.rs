//! In-memory dataset with an explicit column schema.
//!
//! The schema is derived once from the parsed dtypes and can be adjusted
//! with [`Dataset::declare_kind`]. Every numeric operation consults the
//! schema rather than the live dtype, so the outlier summary and the clipper
//! always agree on which columns are numeric.

use crate::error::{AnalyticsError, Result};
use crate::utils::{is_categorical_dtype, is_numeric_dtype, series_to_f64, series_to_f64_raw};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point measurements.
    Numeric,
    /// A small set of labels (booleans, categoricals, declared codes).
    Categorical,
    /// Free text and anything else.
    Textual,
}

impl ColumnKind {
    /// Classify a polars dtype.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            ColumnKind::Numeric
        } else if is_categorical_dtype(dtype) {
            ColumnKind::Categorical
        } else {
            ColumnKind::Textual
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Textual => "textual",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Schema entry for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
    /// Storage dtype as rendered by polars (e.g. "i64", "f64", "str").
    pub dtype: String,
}

/// Rows x named columns, plus the declared kind of every column.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: Vec<ColumnSchema>,
}

impl Dataset {
    /// Wrap a DataFrame, inferring each column's kind from its dtype.
    pub fn new(frame: DataFrame) -> Self {
        let schema = frame
            .get_columns()
            .iter()
            .map(|col| ColumnSchema {
                name: col.name().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
                dtype: col.dtype().to_string(),
            })
            .collect();

        Self { frame, schema }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_schema(&self, name: &str) -> Result<&ColumnSchema> {
        self.schema
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AnalyticsError::ColumnNotFound(name.to_string()))
    }

    pub fn kind_of(&self, name: &str) -> Result<ColumnKind> {
        Ok(self.column_schema(name)?.kind)
    }

    /// Override the declared kind of a column.
    ///
    /// Declaring a column numeric requires a numeric dtype.
    pub fn declare_kind(&mut self, name: &str, kind: ColumnKind) -> Result<()> {
        let entry = self
            .schema
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| AnalyticsError::ColumnNotFound(name.to_string()))?;

        if kind == ColumnKind::Numeric
            && !is_numeric_dtype(&dtype_of(&self.frame, name)?)
        {
            return Err(AnalyticsError::NotNumeric {
                column: name.to_string(),
                kind: entry.kind.to_string(),
            });
        }

        entry.kind = kind;
        Ok(())
    }

    /// Names of the columns declared numeric, in column order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.schema
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Borrow a column as a Series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.column_schema(name)?;
        Ok(self.frame.column(name)?.as_materialized_series())
    }

    /// Values of a numeric column as `f64`; nulls and NaN become `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(series_to_f64(self.numeric_series(name)?)?)
    }

    /// Values of a numeric column as `f64` with NaN kept as NaN.
    pub(crate) fn raw_numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(series_to_f64_raw(self.numeric_series(name)?)?)
    }

    fn numeric_series(&self, name: &str) -> Result<&Series> {
        let kind = self.kind_of(name)?;
        if kind != ColumnKind::Numeric {
            return Err(AnalyticsError::NotNumeric {
                column: name.to_string(),
                kind: kind.to_string(),
            });
        }
        self.series(name)
    }

    /// Replace a numeric column with new `f64` values of the same length.
    pub(crate) fn replace_numeric(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        let series = Series::new(name.into(), values);
        let dtype = series.dtype().to_string();
        self.frame.replace(name, series)?;

        if let Some(entry) = self.schema.iter_mut().find(|c| c.name == name) {
            entry.dtype = dtype;
        }
        Ok(())
    }
}

impl From<DataFrame> for Dataset {
    fn from(frame: DataFrame) -> Self {
        Dataset::new(frame)
    }
}

fn dtype_of(frame: &DataFrame, name: &str) -> Result<DataType> {
    Ok(frame.column(name)?.dtype().clone())
}
