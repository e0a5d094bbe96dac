//! Production paths and value conversion for Arrow-typed sources.

use arrow_schema::{DataType, TimeUnit};

use crate::error::{BoxError, ConversionError};
use crate::transform::{ProductionPath, ProductionPathProvider, ValueConverter};

use super::resolver::widen;
use super::value::Value;

/// Converter name of paths that keep the type.
pub const IDENTITY: &str = "identity";
/// Converter name of paths along the widening lattice.
pub const WIDEN: &str = "widen";
/// Converter name of paths that render a value as text.
pub const FORMAT: &str = "format";
/// Converter name of paths that parse text.
pub const PARSE: &str = "parse";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Offers identity, widening, formatting and parsing paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowPathProvider;

impl ArrowPathProvider {
    fn widening_targets(source: &DataType) -> Vec<DataType> {
        let mut targets = vec![
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::Float32,
            DataType::Float64,
            DataType::Date64,
        ];
        if let DataType::Timestamp(_, tz) = source {
            for unit in [TimeUnit::Millisecond, TimeUnit::Microsecond, TimeUnit::Nanosecond] {
                targets.push(DataType::Timestamp(unit, tz.clone()));
            }
        }
        targets
            .into_iter()
            .filter(|target| target != source && widen(source, target) == *target)
            .collect()
    }
}

impl ProductionPathProvider<DataType> for ArrowPathProvider {
    fn default_path(&self, source: &DataType) -> ProductionPath<DataType> {
        ProductionPath::new(source.clone(), source.clone(), IDENTITY)
    }

    fn available_paths(&self, source: &DataType) -> Vec<ProductionPath<DataType>> {
        let mut paths = vec![self.default_path(source)];

        if source == &DataType::Null {
            return paths;
        }

        paths.extend(
            Self::widening_targets(source)
                .into_iter()
                .map(|target| ProductionPath::new(source.clone(), target, WIDEN)),
        );

        if source == &DataType::Utf8 {
            for target in [DataType::Int64, DataType::Float64, DataType::Boolean] {
                paths.push(ProductionPath::new(DataType::Utf8, target, PARSE));
            }
        } else {
            paths.push(ProductionPath::new(source.clone(), DataType::Utf8, FORMAT));
        }

        paths
    }
}

/// Converts [`Value`]s to the destination type of a path.
///
/// The value is coerced by the destination alone, so a source whose own type
/// is narrower than the column's resolved type converts the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowValueConverter;

impl ValueConverter<DataType> for ArrowValueConverter {
    type Value = Value;

    fn convert(&self, path: &ProductionPath<DataType>, value: Value) -> Result<Value, BoxError> {
        Ok(cast(value, &path.destination)?)
    }
}

/// Convert `value` to a value of `destination`.
pub fn cast(value: Value, destination: &DataType) -> Result<Value, ConversionError> {
    let unsupported = |value: &Value| ConversionError::Unsupported {
        value: format!("{value:?}"),
        destination: destination.to_string(),
    };

    match destination {
        DataType::Boolean => match value {
            Value::Boolean(_) => Ok(value),
            Value::Utf8(ref text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(parse_error(text, destination)),
            },
            other => Err(unsupported(&other)),
        },
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let v = match value {
                Value::Int(v) => v,
                Value::UInt(v) => i64::try_from(v).map_err(|_| out_of_range(&v, destination))?,
                Value::Float(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
                    v as i64
                }
                Value::Float(v) => return Err(out_of_range(&v, destination)),
                Value::Utf8(ref text) => text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| parse_error(text, destination))?,
                other => return Err(unsupported(&other)),
            };
            check_signed(v, destination).map(Value::Int)
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let v = match value {
                Value::UInt(v) => v,
                Value::Int(v) => u64::try_from(v).map_err(|_| out_of_range(&v, destination))?,
                Value::Float(v) if v.fract() == 0.0 && v >= 0.0 && v < u64::MAX as f64 => v as u64,
                Value::Float(v) => return Err(out_of_range(&v, destination)),
                Value::Utf8(ref text) => text
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| parse_error(text, destination))?,
                other => return Err(unsupported(&other)),
            };
            check_unsigned(v, destination).map(Value::UInt)
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => match value {
            Value::Float(_) => Ok(value),
            Value::Int(v) => Ok(Value::Float(v as f64)),
            Value::UInt(v) => Ok(Value::Float(v as f64)),
            Value::Utf8(ref text) => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| parse_error(text, destination)),
            other => Err(unsupported(&other)),
        },
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => match value {
            Value::Utf8(_) => Ok(value),
            other => Ok(Value::Utf8(other.to_string())),
        },
        DataType::Date32 => match value {
            Value::Date32(_) => Ok(value),
            Value::Date64(ms) => i32::try_from(ms.div_euclid(MILLIS_PER_DAY))
                .map(Value::Date32)
                .map_err(|_| out_of_range(&ms, destination)),
            other => Err(unsupported(&other)),
        },
        DataType::Date64 => match value {
            Value::Date64(_) => Ok(value),
            Value::Date32(days) => Ok(Value::Date64(i64::from(days) * MILLIS_PER_DAY)),
            other => Err(unsupported(&other)),
        },
        DataType::Timestamp(unit, _) => {
            let (v, from) = match value {
                Value::Timestamp { value, unit } => (value, unit),
                Value::Int(v) => (v, *unit),
                Value::Date32(days) => (i64::from(days) * MILLIS_PER_DAY, TimeUnit::Millisecond),
                Value::Date64(ms) => (ms, TimeUnit::Millisecond),
                other => return Err(unsupported(&other)),
            };
            rescale(v, from, *unit)
                .map(|value| Value::Timestamp { value, unit: *unit })
                .ok_or_else(|| out_of_range(&v, destination))
        }
        _ => Err(unsupported(&value)),
    }
}

fn check_signed(v: i64, destination: &DataType) -> Result<i64, ConversionError> {
    let fits = match destination {
        DataType::Int8 => i8::try_from(v).is_ok(),
        DataType::Int16 => i16::try_from(v).is_ok(),
        DataType::Int32 => i32::try_from(v).is_ok(),
        _ => true,
    };
    if fits {
        Ok(v)
    } else {
        Err(out_of_range(&v, destination))
    }
}

fn check_unsigned(v: u64, destination: &DataType) -> Result<u64, ConversionError> {
    let fits = match destination {
        DataType::UInt8 => u8::try_from(v).is_ok(),
        DataType::UInt16 => u16::try_from(v).is_ok(),
        DataType::UInt32 => u32::try_from(v).is_ok(),
        _ => true,
    };
    if fits {
        Ok(v)
    } else {
        Err(out_of_range(&v, destination))
    }
}

fn units_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    }
}

/// Rescale `value` from one unit to another; coarser targets truncate
/// toward negative infinity.
fn rescale(value: i64, from: TimeUnit, to: TimeUnit) -> Option<i64> {
    let (from, to) = (units_per_second(from), units_per_second(to));
    if to >= from {
        value.checked_mul(to / from)
    } else {
        Some(value.div_euclid(from / to))
    }
}

fn parse_error(text: &str, destination: &DataType) -> ConversionError {
    ConversionError::Parse {
        value: text.to_string(),
        destination: destination.to_string(),
    }
}

fn out_of_range(value: &dyn std::fmt::Display, destination: &DataType) -> ConversionError {
    ConversionError::OutOfRange {
        value: value.to_string(),
        destination: destination.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(source: DataType, destination: DataType) -> ProductionPath<DataType> {
        ProductionPath::new(source, destination, IDENTITY)
    }

    #[test]
    fn test_default_path_is_identity() {
        let default = ArrowPathProvider.default_path(&DataType::Int32);
        assert_eq!(default.destination, DataType::Int32);
        assert_eq!(default.converter, IDENTITY);
    }

    #[test]
    fn test_available_paths_include_widenings_and_text() {
        let paths = ArrowPathProvider.available_paths(&DataType::Int32);
        let destinations: Vec<_> = paths.iter().map(|p| p.destination.clone()).collect();

        assert!(destinations.contains(&DataType::Int64));
        assert!(destinations.contains(&DataType::Float64));
        assert!(destinations.contains(&DataType::Utf8));
        assert!(!destinations.contains(&DataType::Int16));
        assert!(!destinations.contains(&DataType::Date64));
    }

    #[test]
    fn test_utf8_can_be_parsed() {
        let paths = ArrowPathProvider.paths_to(&DataType::Utf8, &DataType::Int64);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].converter, PARSE);

        assert!(ArrowPathProvider.paths_to(&DataType::Utf8, &DataType::Date32).is_empty());
    }

    #[test]
    fn test_timestamp_paths_keep_timezone() {
        let source = DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()));
        let nanos = DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()));

        assert_eq!(ArrowPathProvider.paths_to(&source, &nanos).len(), 1);
        assert!(
            ArrowPathProvider
                .paths_to(&source, &DataType::Timestamp(TimeUnit::Nanosecond, None))
                .is_empty()
        );
    }

    #[test]
    fn test_cast_numbers() {
        assert_eq!(cast(Value::Int(7), &DataType::Float64).unwrap(), Value::Float(7.0));
        assert_eq!(cast(Value::UInt(7), &DataType::Int32).unwrap(), Value::Int(7));
        assert_eq!(cast(Value::Float(3.0), &DataType::Int64).unwrap(), Value::Int(3));

        assert!(matches!(
            cast(Value::Int(300), &DataType::Int8),
            Err(ConversionError::OutOfRange { .. })
        ));
        assert!(matches!(
            cast(Value::Int(-1), &DataType::UInt32),
            Err(ConversionError::OutOfRange { .. })
        ));
        assert!(matches!(
            cast(Value::Float(1.5), &DataType::Int64),
            Err(ConversionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_cast_float_at_integer_limits() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert!(matches!(
            cast(Value::Float(two_pow_63), &DataType::Int64),
            Err(ConversionError::OutOfRange { .. })
        ));
        assert_eq!(
            cast(Value::Float(-two_pow_63), &DataType::Int64).unwrap(),
            Value::Int(i64::MIN)
        );
        assert_eq!(
            cast(Value::Float(two_pow_63), &DataType::UInt64).unwrap(),
            Value::UInt(1 << 63)
        );
        assert!(matches!(
            cast(Value::Float(two_pow_63 * 2.0), &DataType::UInt64),
            Err(ConversionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_cast_text() {
        assert_eq!(cast(Value::Int(-4), &DataType::Utf8).unwrap(), Value::Utf8("-4".into()));
        assert_eq!(
            cast(Value::Utf8(" 12 ".into()), &DataType::Int64).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            cast(Value::Utf8("TRUE".into()), &DataType::Boolean).unwrap(),
            Value::Boolean(true)
        );

        match cast(Value::Utf8("abc".into()), &DataType::Float64) {
            Err(ConversionError::Parse { value, .. }) => assert_eq!(value, "abc"),
            other => panic!("Expected Parse error, got: {other:?}"),
        }
    }

    #[test]
    fn test_cast_temporal() {
        assert_eq!(
            cast(Value::Date32(2), &DataType::Date64).unwrap(),
            Value::Date64(2 * MILLIS_PER_DAY)
        );
        assert_eq!(
            cast(Value::Date64(-1), &DataType::Date32).unwrap(),
            Value::Date32(-1)
        );
        assert_eq!(
            cast(
                Value::Timestamp {
                    value: 1_500,
                    unit: TimeUnit::Millisecond
                },
                &DataType::Timestamp(TimeUnit::Microsecond, None)
            )
            .unwrap(),
            Value::Timestamp {
                value: 1_500_000,
                unit: TimeUnit::Microsecond
            }
        );
        assert_eq!(
            cast(
                Value::Timestamp {
                    value: 1_999,
                    unit: TimeUnit::Millisecond
                },
                &DataType::Timestamp(TimeUnit::Second, None)
            )
            .unwrap(),
            Value::Timestamp {
                value: 1,
                unit: TimeUnit::Second
            }
        );
    }

    #[test]
    fn test_cast_unsupported() {
        assert!(matches!(
            cast(Value::Boolean(true), &DataType::Date32),
            Err(ConversionError::Unsupported { .. })
        ));
        assert!(matches!(
            cast(Value::Int(1), &DataType::Null),
            Err(ConversionError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_converter_boxes_errors() {
        let converter = ArrowValueConverter;

        let ok = converter.convert(&path(DataType::Int32, DataType::Int64), Value::Int(5));
        assert_eq!(ok.unwrap(), Value::Int(5));

        let err = converter
            .convert(&path(DataType::Utf8, DataType::Int64), Value::Utf8("x".into()))
            .unwrap_err();
        assert!(err.to_string().contains("Cannot parse 'x'"));
    }
}
