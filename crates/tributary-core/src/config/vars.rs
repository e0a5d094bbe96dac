//! Environment variable interpolation for config files.
//!
//! Supported syntax:
//! - `$VAR` or `${VAR}` - substitute the value, error if unset
//! - `${VAR:-default}` - use default if VAR is unset OR empty
//! - `${VAR-default}` - use default only if VAR is unset
//! - `$$` - literal `$`

use regex::{Captures, Regex};
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$
        |
        \$\{ ([A-Za-z_][A-Za-z0-9_]*) (?: (:?-) ([^}]*) )? \}
        |
        \$([A-Za-z_][A-Za-z0-9_]*)
        ",
    )
    .expect("variable pattern is valid")
});

/// Result of environment variable interpolation.
#[derive(Debug)]
pub struct InterpolationResult {
    /// The interpolated text.
    pub text: String,
    /// Every problem found, so all missing variables are reported at once.
    pub errors: Vec<String>,
}

impl InterpolationResult {
    /// Returns true if there were no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Interpolate process environment variables in `input`.
pub fn interpolate(input: &str) -> InterpolationResult {
    interpolate_with(input, |name| std::env::var(name).ok())
}

/// Interpolate variables in `input`, resolving names through `lookup`.
pub fn interpolate_with<F>(input: &str, lookup: F) -> InterpolationResult
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    let text = VARIABLE
        .replace_all(input, |caps: &Captures| substitute(caps, &lookup, &mut errors))
        .into_owned();

    InterpolationResult { text, errors }
}

fn substitute<F>(caps: &Captures, lookup: &F, errors: &mut Vec<String>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let matched = &caps[0];
    if matched == "$$" {
        return "$".to_string();
    }

    let name = caps
        .get(1)
        .or_else(|| caps.get(4))
        .map_or("", |m| m.as_str());
    let operator = caps.get(2).map(|m| m.as_str());
    let default = caps.get(3).map(|m| m.as_str());

    match (lookup(name), default) {
        (Some(value), _) if value.contains(['\n', '\r']) => {
            errors.push(format!(
                "environment variable '{name}' contains newlines, which is not allowed"
            ));
            matched.to_string()
        }
        (Some(value), Some(default)) if value.is_empty() && operator == Some(":-") => {
            default.to_string()
        }
        (Some(value), _) => value,
        (None, Some(default)) => default.to_string(),
        (None, None) => {
            errors.push(format!("environment variable '{name}' is not set"));
            matched.to_string()
        }
    }
}
