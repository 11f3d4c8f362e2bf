//! IQR outlier detection and winsorization.
//!
//! Both the summary and the clipper derive their bounds from
//! [`iqr_fence_with`], computed fresh from the column as it is at call time.

use crate::config::QuantileMethod;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::utils::{quantile_sorted_with, sorted_copy};
use serde::Serialize;
use tracing::{debug, info};

/// Fence half-width in multiples of the IQR.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Quartiles of a column and the bounds derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFence {
    pub fn from_quartiles(q1: f64, q3: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        }
    }

    /// Whether `value` lies inside `[lower, upper]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Strictly below `lower` or strictly above `upper`.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower
        } else if value > self.upper {
            self.upper
        } else {
            value
        }
    }
}

/// Fence of the observed values using the default quartile rule.
pub fn iqr_fence(values: &[f64]) -> Option<IqrFence> {
    iqr_fence_with(values, QuantileMethod::default())
}

/// Fence of the observed values; NaN entries are ignored.
///
/// Returns `None` when nothing is observed. A constant column (or a single
/// value) produces a zero-width fence at that value.
pub fn iqr_fence_with(values: &[f64], method: QuantileMethod) -> Option<IqrFence> {
    let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }
    let sorted = sorted_copy(&observed);
    Some(IqrFence::from_quartiles(
        quantile_sorted_with(&sorted, 0.25, method),
        quantile_sorted_with(&sorted, 0.75, method),
    ))
}

/// Outlier count for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierEntry {
    pub column: String,
    pub outlier_count: usize,
    pub below: usize,
    pub above: usize,
    /// `None` when the column has no observed values.
    pub fence: Option<IqrFence>,
}

/// One entry per numeric column, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub numeric_columns: usize,
    pub entries: Vec<OutlierEntry>,
}

impl OutlierReport {
    pub fn columns_with_outliers(&self) -> usize {
        self.entries.iter().filter(|e| e.outlier_count > 0).count()
    }

    pub fn get(&self, column: &str) -> Option<&OutlierEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    pub fn total_outliers(&self) -> usize {
        self.entries.iter().map(|e| e.outlier_count).sum()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "From {} selected numerical columns, there are {} columns with outlier values.",
            self.numeric_columns,
            self.columns_with_outliers()
        )
    }
}

/// Count IQR outliers in every numeric column.
pub fn get_outlier_summary(dataset: &Dataset) -> Result<OutlierReport> {
    get_outlier_summary_with(dataset, QuantileMethod::default())
}

/// Count IQR outliers in every numeric column with an explicit quartile rule.
pub fn get_outlier_summary_with(dataset: &Dataset, method: QuantileMethod) -> Result<OutlierReport> {
    let numeric = dataset.numeric_columns();
    let mut entries = Vec::with_capacity(numeric.len());

    for name in &numeric {
        let observed: Vec<f64> = dataset.numeric_values(name)?.into_iter().flatten().collect();
        let fence = iqr_fence_with(&observed, method);

        let (below, above) = match fence {
            Some(f) => (
                observed.iter().filter(|&&v| v < f.lower).count(),
                observed.iter().filter(|&&v| v > f.upper).count(),
            ),
            None => (0, 0),
        };

        debug!(
            "{}: {} below / {} above fence {:?}",
            name, below, above, fence
        );

        entries.push(OutlierEntry {
            column: name.to_string(),
            outlier_count: below + above,
            below,
            above,
            fence,
        });
    }

    let report = OutlierReport {
        numeric_columns: numeric.len(),
        entries,
    };
    info!("{}", report.summary_line());
    Ok(report)
}

/// What the clipper did to one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipEntry {
    pub column: String,
    /// Bounds computed from the column before clipping.
    pub fence: Option<IqrFence>,
    pub clipped_low: usize,
    pub clipped_high: usize,
}

impl ClipEntry {
    pub fn clipped(&self) -> usize {
        self.clipped_low + self.clipped_high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinsorizationReport {
    pub entries: Vec<ClipEntry>,
}

impl WinsorizationReport {
    pub fn total_clipped(&self) -> usize {
        self.entries.iter().map(ClipEntry::clipped).sum()
    }
}

/// Clamp every numeric column into its own IQR fence.
///
/// Returns the clipped dataset; non-numeric columns, row order and row count
/// are untouched.
pub fn remove_outliers_winsorization(dataset: Dataset) -> Result<Dataset> {
    remove_outliers_winsorization_with(dataset, QuantileMethod::default())
}

pub fn remove_outliers_winsorization_with(
    mut dataset: Dataset,
    method: QuantileMethod,
) -> Result<Dataset> {
    winsorize_in_place(&mut dataset, method)?;
    Ok(dataset)
}

/// Clamp numeric columns in place and report what changed.
///
/// Each fence is computed once from the column's pre-clipping values.
/// Clipped columns are stored as `f64`; nulls stay null and NaN stays NaN.
/// Columns without observed values are left as they are.
pub fn winsorize_in_place(dataset: &mut Dataset, method: QuantileMethod) -> Result<WinsorizationReport> {
    let numeric: Vec<String> = dataset
        .numeric_columns()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut entries = Vec::with_capacity(numeric.len());

    for name in numeric {
        let values = dataset.raw_numeric_values(&name)?;
        let observed: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|x| !x.is_nan())
            .collect();

        let Some(fence) = iqr_fence_with(&observed, method) else {
            debug!("{}: no observed values, left unchanged", name);
            entries.push(ClipEntry {
                column: name,
                fence: None,
                clipped_low: 0,
                clipped_high: 0,
            });
            continue;
        };

        let clipped_low = observed.iter().filter(|&&v| v < fence.lower).count();
        let clipped_high = observed.iter().filter(|&&v| v > fence.upper).count();
        let clamped: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.map(|x| fence.clamp(x)))
            .collect();

        dataset.replace_numeric(&name, clamped)?;
        debug!(
            "{}: clipped {} low / {} high into [{}, {}]",
            name, clipped_low, clipped_high, fence.lower, fence.upper
        );

        entries.push(ClipEntry {
            column: name,
            fence: Some(fence),
            clipped_low,
            clipped_high,
        });
    }

    let report = WinsorizationReport { entries };
    info!(
        "Winsorized {} values across {} numeric columns",
        report.total_clipped(),
        report.entries.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuantileMethod;
    use crate::dataset::ColumnKind;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn age_dataset() -> Dataset {
        Dataset::new(
            df![
                "Age" => [20i64, 21, 22, 23, 24, 200],
                "Gender" => ["F", "M", "F", "M", "F", "M"],
            ]
            .unwrap(),
        )
    }

    fn f64_column(ds: &Dataset, name: &str) -> Vec<Option<f64>> {
        ds.numeric_values(name).unwrap()
    }

    // ==================== iqr_fence tests ====================

    #[test]
    fn test_fence_for_age_example() {
        let fence = iqr_fence(&[20.0, 21.0, 22.0, 23.0, 24.0, 200.0]).unwrap();
        assert_eq!(fence.q1, 21.0);
        assert_eq!(fence.q3, 23.0);
        assert_eq!(fence.iqr, 2.0);
        assert_eq!(fence.lower, 18.0);
        assert_eq!(fence.upper, 26.0);
    }

    #[test]
    fn test_fence_linear_method() {
        let fence =
            iqr_fence_with(&[20.0, 21.0, 22.0, 23.0, 24.0, 200.0], QuantileMethod::Linear).unwrap();
        assert_eq!(fence.q1, 21.25);
        assert_eq!(fence.q3, 23.75);
        assert_eq!(fence.lower, 17.5);
        assert_eq!(fence.upper, 27.5);
    }

    #[test]
    fn test_fence_ignores_order_and_nan() {
        let fence = iqr_fence(&[200.0, f64::NAN, 24.0, 20.0, 23.0, 21.0, 22.0]).unwrap();
        assert_eq!(fence.lower, 18.0);
        assert_eq!(fence.upper, 26.0);
    }

    #[test]
    fn test_fence_empty_is_none() {
        assert!(iqr_fence(&[]).is_none());
        assert!(iqr_fence(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_degenerate_fence_collapses_to_value() {
        let fence = iqr_fence(&[5.0, 5.0, 5.0, 5.0, 9.0]).unwrap();
        assert_eq!(fence.iqr, 0.0);
        assert_eq!(fence.lower, 5.0);
        assert_eq!(fence.upper, 5.0);
        assert!(fence.is_outlier(9.0));
        assert!(!fence.is_outlier(5.0));
    }

    #[test]
    fn test_single_value_fence() {
        let fence = iqr_fence(&[3.0]).unwrap();
        assert_eq!((fence.lower, fence.upper), (3.0, 3.0));
    }

    #[test]
    fn test_fence_clamp_and_contains() {
        let fence = IqrFence::from_quartiles(21.0, 23.0);
        assert_eq!(fence.clamp(200.0), 26.0);
        assert_eq!(fence.clamp(-4.0), 18.0);
        assert_eq!(fence.clamp(22.5), 22.5);
        assert!(fence.contains(18.0));
        assert!(fence.contains(26.0));
        assert!(!fence.contains(26.5));
    }

    // ==================== get_outlier_summary tests ====================

    #[test]
    fn test_summary_counts_age_outlier() {
        let report = get_outlier_summary(&age_dataset()).unwrap();
        assert_eq!(report.numeric_columns, 1);
        let entry = report.get("Age").unwrap();
        assert_eq!(entry.outlier_count, 1);
        assert_eq!(entry.below, 0);
        assert_eq!(entry.above, 1);
        assert!(report.get("Gender").is_none());
    }

    #[test]
    fn test_summary_keeps_zero_outlier_columns_in_order() {
        let ds = Dataset::new(
            df![
                "label" => ["a", "b", "c", "d", "e"],
                "flat" => [1.0, 2.0, 3.0, 4.0, 5.0],
                "spiky" => [1.0, 2.0, 3.0, 4.0, 500.0],
            ]
            .unwrap(),
        );

        let report = get_outlier_summary(&ds).unwrap();
        let rows: Vec<(&str, usize)> = report
            .entries
            .iter()
            .map(|e| (e.column.as_str(), e.outlier_count))
            .collect();
        assert_eq!(rows, vec![("flat", 0), ("spiky", 1)]);
        assert_eq!(report.columns_with_outliers(), 1);
        assert_eq!(
            report.summary_line(),
            "From 2 selected numerical columns, there are 1 columns with outlier values."
        );
    }

    #[test]
    fn test_summary_skips_nulls_and_all_null_columns() {
        let ds = Dataset::new(
            df![
                "x" => [Some(20.0), None, Some(21.0), Some(22.0), Some(23.0), Some(24.0), Some(200.0)],
                "empty" => [None::<f64>, None, None, None, None, None, None],
            ]
            .unwrap(),
        );

        let report = get_outlier_summary(&ds).unwrap();
        assert_eq!(report.get("x").unwrap().outlier_count, 1);
        let empty = report.get("empty").unwrap();
        assert_eq!(empty.outlier_count, 0);
        assert!(empty.fence.is_none());
    }

    #[test]
    fn test_summary_respects_declared_kind() {
        let mut ds = age_dataset();
        ds.declare_kind("Age", ColumnKind::Categorical).unwrap();
        let report = get_outlier_summary(&ds).unwrap();
        assert_eq!(report.numeric_columns, 0);
        assert!(report.entries.is_empty());
    }

    // ==================== winsorization tests ====================

    #[test]
    fn test_winsorize_age_example() {
        let clipped = remove_outliers_winsorization(age_dataset()).unwrap();
        assert_eq!(
            f64_column(&clipped, "Age"),
            vec![Some(20.0), Some(21.0), Some(22.0), Some(23.0), Some(24.0), Some(26.0)]
        );
    }

    #[test]
    fn test_winsorize_preserves_rows_and_text() {
        let original = age_dataset();
        let before = original.series("Gender").unwrap().clone();
        let clipped = remove_outliers_winsorization(original).unwrap();

        assert_eq!(clipped.height(), 6);
        assert!(clipped.series("Gender").unwrap().equals_missing(&before));
    }

    #[test]
    fn test_winsorize_report_and_nulls() {
        let mut ds = Dataset::new(
            df![
                "x" => [Some(-500.0), Some(20.0), None, Some(21.0), Some(22.0), Some(23.0), Some(24.0), Some(200.0)],
            ]
            .unwrap(),
        );

        let report = winsorize_in_place(&mut ds, QuantileMethod::Lower).unwrap();
        let entry = &report.entries[0];
        assert_eq!(entry.clipped_low, 1);
        assert_eq!(entry.clipped_high, 1);
        assert_eq!(report.total_clipped(), 2);

        let fence = entry.fence.unwrap();
        let values = f64_column(&ds, "x");
        assert_eq!(values[2], None);
        for v in values.into_iter().flatten() {
            assert!(fence.contains(v), "{v} outside [{}, {}]", fence.lower, fence.upper);
        }
    }

    #[test]
    fn test_winsorize_keeps_nan_cells() {
        let mut ds = Dataset::new(
            df![
                "x" => [Some(1.0), Some(f64::NAN), Some(2.0), Some(3.0), None, Some(100.0)],
            ]
            .unwrap(),
        );

        let report = winsorize_in_place(&mut ds, QuantileMethod::Lower).unwrap();
        assert_eq!(report.entries[0].clipped_high, 1);

        let x = ds.series("x").unwrap();
        assert_eq!(x.null_count(), 1);
        let x = x.f64().unwrap();
        assert!(x.get(1).is_some_and(f64::is_nan));
        assert_eq!(x.get(4), None);
        assert_eq!(x.get(5), Some(report.entries[0].fence.unwrap().upper));
    }

    #[test]
    fn test_winsorize_uses_pre_clip_fence() {
        let mut ds = age_dataset();
        let before = get_outlier_summary(&ds).unwrap();
        let report = winsorize_in_place(&mut ds, QuantileMethod::default()).unwrap();
        assert_eq!(report.entries[0].fence, before.entries[0].fence);
    }

    #[test]
    fn test_winsorize_integer_column_becomes_float() {
        let clipped = remove_outliers_winsorization(age_dataset()).unwrap();
        assert_eq!(clipped.column_schema("Age").unwrap().dtype, "f64");
        assert_eq!(clipped.kind_of("Age").unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_winsorize_all_null_column_untouched() {
        let mut ds = Dataset::new(
            df![
                "empty" => [None::<i64>, None, None],
            ]
            .unwrap(),
        );

        let report = winsorize_in_place(&mut ds, QuantileMethod::default()).unwrap();
        assert!(report.entries[0].fence.is_none());
        assert_eq!(ds.column_schema("empty").unwrap().dtype, "i64");
    }
}
