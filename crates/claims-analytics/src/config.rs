//! Configuration for loading claims datasets.
//!
//! The input layer and the quartile rule are configurable. The IQR
//! multiplier and the significance level of the hypothesis tests are
//! fixed constants.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory that bare file names are resolved against.
pub const DEFAULT_DATA_DIR: &str = "docs";

/// Field separator of the claims text files.
pub const DEFAULT_SEPARATOR: u8 = b'|';

/// Markers read as missing values in addition to empty fields.
pub const DEFAULT_NULL_VALUES: [&str; 10] = [
    "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Rank rule used to turn a sorted column into quartiles.
///
/// Position `q * (n - 1)` rarely lands on an element; the method decides
/// which value stands in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantileMethod {
    /// Take the element at the floor of the position.
    #[default]
    Lower,
    /// Take the element at the ceiling of the position.
    Higher,
    /// Interpolate linearly between the two neighbouring elements.
    Linear,
    /// Take the closer element; exact halves go to the even rank.
    Nearest,
    /// Average the two neighbouring elements.
    Midpoint,
}

/// Settings for reading and analysing a delimited dataset.
///
/// Use [`AnalysisConfig::builder()`] for a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use claims_analytics::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .data_dir("data/raw")
///     .categorical_column("PostalCode")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory the input file name is resolved against.
    /// Default: "docs"
    pub data_dir: PathBuf,

    /// Field separator byte.
    /// Default: b'|'
    pub separator: u8,

    /// Quote character, or `None` to disable quoting.
    /// Default: Some(b'"')
    pub quote_char: Option<u8>,

    /// Field values read as missing.
    pub null_values: Vec<String>,

    /// Number of rows used to infer column types; `None` scans the whole file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Columns declared categorical regardless of their parsed dtype.
    /// Default: empty
    pub categorical_columns: Vec<String>,

    /// Quartile rule for IQR fences.
    /// Default: Lower
    pub quantile_method: QuantileMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            separator: DEFAULT_SEPARATOR,
            quote_char: Some(b'"'),
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
            infer_schema_length: None,
            categorical_columns: Vec::new(),
            quantile_method: QuantileMethod::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Read a configuration from a JSON file and validate it.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve a file name against the data directory.
    pub fn resolve(&self, filename: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(filename)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if matches!(self.separator, b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidByte {
                field: "separator".to_string(),
                value: self.separator,
            });
        }

        if let Some(quote) = self.quote_char {
            if matches!(quote, b'\n' | b'\r') {
                return Err(ConfigValidationError::InvalidByte {
                    field: "quote_char".to_string(),
                    value: quote,
                });
            }
            if quote == self.separator {
                return Err(ConfigValidationError::SeparatorIsQuote(quote));
            }
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::ZeroInferSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid byte for '{field}': {value:#04x} (line terminators are not allowed)")]
    InvalidByte { field: String, value: u8 },

    #[error("Separator and quote character are both {0:#04x}")]
    SeparatorIsQuote(u8),

    #[error("infer_schema_length must be at least 1 (use None to scan the whole file)")]
    ZeroInferSchemaLength,
}

impl From<ConfigValidationError> for AnalyticsError {
    fn from(err: ConfigValidationError) -> Self {
        AnalyticsError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    data_dir: Option<PathBuf>,
    separator: Option<u8>,
    quote_char: Option<Option<u8>>,
    null_values: Option<Vec<String>>,
    infer_schema_length: Option<usize>,
    categorical_columns: Vec<String>,
    quantile_method: Option<QuantileMethod>,
}

impl AnalysisConfigBuilder {
    /// Set the directory input files are resolved against.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set the field separator.
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the quote character; `None` disables quote handling.
    pub fn quote_char(mut self, quote: Option<u8>) -> Self {
        self.quote_char = Some(quote);
        self
    }

    /// Replace the list of missing-value markers.
    pub fn null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Limit type inference to the first `rows` rows.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Declare a column categorical even if it parses as numbers.
    pub fn categorical_column(mut self, column: impl Into<String>) -> Self {
        self.categorical_columns.push(column.into());
        self
    }

    /// Set the quartile rule used for IQR fences.
    pub fn quantile_method(mut self, method: QuantileMethod) -> Self {
        self.quantile_method = Some(method);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            separator: self.separator.unwrap_or(defaults.separator),
            quote_char: self.quote_char.unwrap_or(defaults.quote_char),
            null_values: self.null_values.unwrap_or(defaults.null_values),
            infer_schema_length: self.infer_schema_length,
            categorical_columns: self.categorical_columns,
            quantile_method: self.quantile_method.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("docs"));
        assert_eq!(config.separator, b'|');
        assert_eq!(config.quote_char, Some(b'"'));
        assert!(config.null_values.iter().any(|v| v == "NA"));
        assert!(config.infer_schema_length.is_none());
        assert!(config.categorical_columns.is_empty());
        assert_eq!(config.quantile_method, QuantileMethod::Lower);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = AnalysisConfig::builder().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .data_dir("data/raw")
            .separator(b';')
            .quote_char(None)
            .null_values(["", "?"])
            .infer_schema_length(500)
            .categorical_column("PostalCode")
            .quantile_method(QuantileMethod::Linear)
            .build()
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data/raw"));
        assert_eq!(config.separator, b';');
        assert_eq!(config.quote_char, None);
        assert_eq!(config.null_values, vec!["".to_string(), "?".to_string()]);
        assert_eq!(config.infer_schema_length, Some(500));
        assert_eq!(config.categorical_columns, vec!["PostalCode".to_string()]);
        assert_eq!(config.quantile_method, QuantileMethod::Linear);
    }

    #[test]
    fn test_resolve_joins_data_dir() {
        let config = AnalysisConfig::default();
        assert_eq!(
            config.resolve("MachineLearningRating_v3.txt"),
            PathBuf::from("docs/MachineLearningRating_v3.txt")
        );
    }

    #[test]
    fn test_validation_separator_equals_quote() {
        let result = AnalysisConfig::builder().separator(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::SeparatorIsQuote(b'"')
        ));
    }

    #[test]
    fn test_validation_newline_separator() {
        let result = AnalysisConfig::builder().separator(b'\n').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidByte { .. }
        ));
    }

    #[test]
    fn test_validation_zero_infer_length() {
        let result = AnalysisConfig::builder().infer_schema_length(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroInferSchemaLength
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "data_dir": "input",
            "categorical_columns": ["PostalCode", "RegistrationYear"],
            "quantile_method": "linear"
        }"#;

        let config: AnalysisConfig = serde_json::from_str(json).expect("partial JSON");
        assert_eq!(config.data_dir, PathBuf::from("input"));
        assert_eq!(config.separator, b'|');
        assert_eq!(config.categorical_columns.len(), 2);
        assert_eq!(config.quantile_method, QuantileMethod::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = AnalysisConfig::from_json_file("does/not/exist.json").unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
