//! Reading delimited claims files into a [`Dataset`].

use crate::config::AnalysisConfig;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::{AnalyticsError, Result, ResultExt};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Load `filename` from the default documents directory.
///
/// Equivalent to [`load_data_with_config`] with [`AnalysisConfig::default()`]:
/// pipe-delimited, header row, `"` quoting.
pub fn load_data(filename: impl AsRef<Path>) -> Result<Dataset> {
    load_data_with_config(filename, &AnalysisConfig::default())
}

/// Load `filename` relative to `config.data_dir`.
pub fn load_data_with_config(filename: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Dataset> {
    config.validate()?;
    let path = config.resolve(filename);
    read_delimited(&path, config)
}

/// Read a delimited file at an explicit path.
///
/// Declared categorical columns from the configuration are applied to the
/// schema before the dataset is returned.
pub fn read_delimited(path: &Path, config: &AnalysisConfig) -> Result<Dataset> {
    if !path.exists() {
        return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
    }

    info!("Loading dataset from: {}", path.display());

    let null_values = NullValues::AllColumns(
        config
            .null_values
            .iter()
            .map(|v| PlSmallStr::from(v.as_str()))
            .collect(),
    );

    let parse_options = CsvParseOptions::default()
        .with_separator(config.separator)
        .with_quote_char(config.quote_char)
        .with_null_values(Some(null_values));

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_length)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    let mut dataset = Dataset::new(frame);
    for column in &config.categorical_columns {
        dataset
            .declare_kind(column, ColumnKind::Categorical)
            .context("Applying categorical_columns")?;
        debug!("Declared '{}' categorical", column);
    }

    info!(
        "Dataset loaded successfully: {} rows x {} columns",
        dataset.height(),
        dataset.width()
    );
    Ok(dataset)
}
