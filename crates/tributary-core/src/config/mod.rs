//! YAML configuration loading.
//!
//! Every config file passes through environment variable interpolation
//! before it is handed to `serde_yaml`.

mod vars;

pub use vars::{InterpolationResult, interpolate, interpolate_with};

use std::path::Path;

use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::error::{ConfigError, ReadFileSnafu, YamlParseSnafu};

/// Interpolate environment variables in `contents` and parse the result as YAML.
pub fn parse_yaml<T: DeserializeOwned>(contents: &str) -> Result<T, ConfigError> {
    let result = interpolate(contents);
    if !result.is_ok() {
        return Err(ConfigError::EnvInterpolation {
            message: result.errors.join("\n"),
        });
    }

    serde_yaml::from_str(&result.text).context(YamlParseSnafu)
}

/// Read a YAML file from disk and parse it with [`parse_yaml`].
pub fn load_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    parse_yaml(&contents)
}
