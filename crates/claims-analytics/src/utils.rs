//! Shared helpers for dtype classification and descriptive statistics.

use crate::config::QuantileMethod;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType holds a small set of labels.
///
/// Booleans count as labels, not numbers.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean | DataType::Categorical(_, _))
}

/// Read a Series as `f64`, keeping nulls as `None` and NaN as NaN.
pub fn series_to_f64_raw(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Read a Series as `f64`, keeping nulls as `None`.
///
/// NaN is folded into `None` so quantiles and tests see it as missing.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    Ok(series_to_f64_raw(series)?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

// =============================================================================
// Descriptive Statistics
// =============================================================================

/// Sort a copy of `values` ascending.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Quantile of already sorted values at rank position `q * (n - 1)`,
/// resolved between neighbouring ranks by `method`.
///
/// Returns NaN for an empty slice.
pub fn quantile_sorted_with(values: &[f64], quantile: f64, method: QuantileMethod) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let weight = pos - lower as f64;
    match method {
        QuantileMethod::Linear => values[lower] + (values[upper] - values[lower]) * weight,
        QuantileMethod::Lower => values[lower],
        QuantileMethod::Higher => values[upper],
        QuantileMethod::Midpoint => (values[lower] + values[upper]) / 2.0,
        // ties go to the even rank
        QuantileMethod::Nearest => {
            let idx = if weight < 0.5 {
                lower
            } else if weight > 0.5 {
                upper
            } else if lower % 2 == 0 {
                lower
            } else {
                upper
            };
            values[idx]
        }
    }
}

/// Arithmetic mean, NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator), NaN with fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n as f64 - 1.0)
}

/// Whether every value equals the first one, compared exactly.
///
/// Empty slices are not constant.
pub fn is_constant(values: &[f64]) -> bool {
    values.first().is_some_and(|&first| values.iter().all(|&x| x == first))
}

/// Round to one decimal place.
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// Tests
// =============================================================================
