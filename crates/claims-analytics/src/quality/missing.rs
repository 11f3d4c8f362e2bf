//! Missing-value summary.

use crate::dataset::{ColumnKind, Dataset};
use crate::utils::round1;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// One column with at least one missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValueEntry {
    pub column: String,
    pub missing_count: usize,
    /// Share of rows that are missing, in percent, rounded to one decimal.
    pub missing_percentage: f64,
    pub kind: ColumnKind,
    pub dtype: String,
}

/// Columns with missing values, most incomplete first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValueReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub entries: Vec<MissingValueEntry>,
}

impl MissingValueReport {
    /// Number of columns that have missing values.
    pub fn columns_with_missing(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&MissingValueEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "From {} columns selected, there are {} columns with missing values.",
            self.total_columns,
            self.columns_with_missing()
        )
    }
}

/// Count and rank missing values per column.
///
/// Only columns with a non-zero share of missing values are reported, sorted
/// by that share (descending, ties in column order). A dataset with no rows
/// has nothing missing and yields an empty report.
pub fn find_missing_values(dataset: &Dataset) -> MissingValueReport {
    let total_rows = dataset.height();

    let mut ranked: Vec<(f64, MissingValueEntry)> = dataset
        .frame()
        .get_columns()
        .iter()
        .zip(dataset.schema())
        .filter_map(|(col, schema)| {
            let missing_count = missing_count(col.as_materialized_series());
            let percentage = if total_rows == 0 {
                0.0
            } else {
                100.0 * missing_count as f64 / total_rows as f64
            };
            debug!("{}: {} missing ({:.3}%)", schema.name, missing_count, percentage);

            (percentage != 0.0).then(|| {
                (
                    percentage,
                    MissingValueEntry {
                        column: schema.name.clone(),
                        missing_count,
                        missing_percentage: round1(percentage),
                        kind: schema.kind,
                        dtype: schema.dtype.clone(),
                    },
                )
            })
        })
        .collect();

    ranked.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let report = MissingValueReport {
        total_rows,
        total_columns: dataset.width(),
        entries: ranked.into_iter().map(|(_, entry)| entry).collect(),
    };
    info!("{}", report.summary_line());
    report
}

/// Nulls, plus NaN in float columns.
fn missing_count(series: &Series) -> usize {
    let nan_count = match series.dtype() {
        DataType::Float32 | DataType::Float64 => series
            .is_nan()
            .map(|mask| mask.into_iter().filter(|v| *v == Some(true)).count())
            .unwrap_or(0),
        _ => 0,
    };
    series.null_count() + nan_count
}
