//! Data quality analysis module.
//!
//! Missing-value ranking and IQR-based outlier handling for the columns
//! of a [`Dataset`](crate::Dataset).

mod missing;
mod outliers;

pub use missing::{MissingValueEntry, MissingValueReport, find_missing_values};
pub use outliers::{
    ClipEntry, IQR_MULTIPLIER, IqrFence, OutlierEntry, OutlierReport, WinsorizationReport,
    get_outlier_summary, get_outlier_summary_with, iqr_fence, iqr_fence_with,
    remove_outliers_winsorization, remove_outliers_winsorization_with, winsorize_in_place,
};
