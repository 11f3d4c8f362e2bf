//! Claims Analytics Library
//!
//! Data-quality checks and hypothesis tests for delimited insurance claims
//! datasets, built on Polars.
//!
//! # Overview
//!
//! - **Loading**: pipe-delimited text files read into a [`Dataset`] with a
//!   per-column [`ColumnKind`] (numeric, categorical, textual)
//! - **Missing values**: per-column missing counts ranked by percentage
//! - **Outliers**: 1.5 × IQR fences, per-column outlier counts and
//!   winsorization (clipping to the fence)
//! - **Hypothesis tests**: one-way ANOVA across every group of a column and
//!   Welch's t-test between two chosen groups, at a fixed 5% level
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use claims_analytics::{
//!     ab_hypothesis_testing, find_missing_values, get_outlier_summary,
//!     hypothesis_test_difference_between_columns, load_data, remove_outliers_winsorization,
//! };
//!
//! // Reads docs/MachineLearningRating_v3.txt
//! let data = load_data("MachineLearningRating_v3.txt")?;
//!
//! let missing = find_missing_values(&data);
//! println!("{}", missing.summary_line());
//!
//! let outliers = get_outlier_summary(&data)?;
//! println!("{}", outliers.summary_line());
//!
//! let clipped = remove_outliers_winsorization(data)?;
//!
//! let anova = hypothesis_test_difference_between_columns(&clipped, "TotalClaims", "Province")?;
//! println!("{anova}");
//!
//! let ab = ab_hypothesis_testing(&clipped, "Gender", "Male", "Female", "TotalPremium")?;
//! if ab.reject_null() {
//!     println!("Premiums differ by gender");
//! }
//! ```
//!
//! # Configuration
//!
//! [`load_data`] uses the defaults of [`AnalysisConfig`]. Anything else
//! (data directory, delimiter, null markers, categorical overrides, quartile
//! rule) goes through the builder:
//!
//! ```rust,ignore
//! use claims_analytics::{AnalysisConfig, QuantileMethod, load_data_with_config};
//!
//! let config = AnalysisConfig::builder()
//!     .data_dir("data/raw")
//!     .separator(b',')
//!     .categorical_column("PostalCode")
//!     .quantile_method(QuantileMethod::Linear)
//!     .build()?;
//!
//! let data = load_data_with_config("claims.csv", &config)?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod hypothesis;
pub mod loader;
pub mod quality;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, DEFAULT_DATA_DIR,
    DEFAULT_NULL_VALUES, DEFAULT_SEPARATOR, QuantileMethod,
};
pub use dataset::{ColumnKind, ColumnSchema, Dataset};
pub use error::{AnalyticsError, Result as AnalyticsResult, ResultExt};
pub use hypothesis::{
    Decision, GroupSummary, HypothesisTestResult, SIGNIFICANCE_LEVEL, TestKind,
    ab_hypothesis_testing, hypothesis_test_difference_between_columns,
};
pub use loader::{load_data, load_data_with_config, read_delimited};
pub use quality::{
    ClipEntry, IqrFence, MissingValueEntry, MissingValueReport, OutlierEntry, OutlierReport,
    WinsorizationReport, find_missing_values, get_outlier_summary, get_outlier_summary_with,
    iqr_fence, iqr_fence_with, remove_outliers_winsorization, remove_outliers_winsorization_with,
    winsorize_in_place,
};
