//! Cell values of rows typed by Arrow data types.

use std::fmt;

use arrow_schema::TimeUnit;
use serde::{Deserialize, Serialize};

/// One present cell. Missing cells are `None` in a row.
///
/// Integers of every width share one variant per signedness; the output
/// type decides the width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Utf8(String),
    /// Days since the epoch.
    Date32(i32),
    /// Milliseconds since the epoch.
    Date64(i64),
    Timestamp { value: i64, unit: TimeUnit },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Utf8(v) => f.write_str(v),
            Value::Date32(v) => write!(f, "{v}"),
            Value::Date64(v) => write!(f, "{v}"),
            Value::Timestamp { value, .. } => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}
