//! Configuration of a multi-source read.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tributary_core::{ConfigError, load_yaml_file, parse_yaml};

use crate::spec::{DEFAULT_MAX_POSSIBLE_VALUES, SpecMergeMode};
use crate::transform::ColumnFilterMode;

fn default_progress_interval() -> u64 {
    1000
}

fn default_max_possible_values() -> usize {
    DEFAULT_MAX_POSSIBLE_VALUES
}

fn default_row_key_prefix() -> String {
    "Row".to_string()
}

fn default_keep_unknown_columns() -> bool {
    true
}

/// Settings that decide how the sources of a group are combined and read.
///
/// # Example
///
/// ```yaml
/// column_filter_mode: intersection
/// enforce_types: true
/// skip_empty_columns: true
/// progress_interval: ${PROGRESS_INTERVAL:-500}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadConfig {
    /// Which half of the raw spec counts as the known columns.
    #[serde(default)]
    pub column_filter_mode: ColumnFilterMode,
    /// Fail reconciliation when a known column changes to a type that cannot
    /// reach its previous output type.
    #[serde(default)]
    pub enforce_types: bool,
    /// Leave out columns that no source could type.
    #[serde(default)]
    pub skip_empty_columns: bool,
    /// Merge mode of older configurations. Overrides `column_filter_mode`.
    #[serde(default)]
    pub spec_merge_mode: Option<SpecMergeMode>,
    /// Rows between cancellation checks and progress reports.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Cap on merged possible-value sets.
    #[serde(default = "default_max_possible_values")]
    pub max_possible_values: usize,
    /// Prefix of generated string row keys.
    #[serde(default = "default_row_key_prefix")]
    pub row_key_prefix: String,
    /// Whether columns discovered after a transformation was stored are output.
    #[serde(default = "default_keep_unknown_columns")]
    pub keep_unknown_columns: bool,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            column_filter_mode: ColumnFilterMode::default(),
            enforce_types: false,
            skip_empty_columns: false,
            spec_merge_mode: None,
            progress_interval: default_progress_interval(),
            max_possible_values: default_max_possible_values(),
            row_key_prefix: default_row_key_prefix(),
            keep_unknown_columns: default_keep_unknown_columns(),
        }
    }
}

impl ReadConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_yaml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = parse_yaml(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "progress_interval".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// The filter mode in effect, taking a legacy merge mode into account.
    pub fn effective_filter_mode(&self) -> ColumnFilterMode {
        self.spec_merge_mode
            .map(SpecMergeMode::column_filter_mode)
            .unwrap_or(self.column_filter_mode)
    }
}
