//! Type widening over Arrow data types.
//!
//! The lattice:
//! - `Null` is the identity element
//! - signed integers widen Int8 -> Int16 -> Int32 -> Int64
//! - unsigned integers widen UInt8 -> UInt16 -> UInt32 -> UInt64
//! - a signed and an unsigned integer widen to the smallest signed integer
//!   holding both, UInt64 excepted
//! - floats widen Float16 -> Float32 -> Float64
//! - an integer and a float widen to Float64
//! - Date32 widens to Date64
//! - timestamps with the same timezone widen to the finer unit
//! - every other disagreement widens to Utf8

use arrow_schema::{DataType, TimeUnit};

use crate::spec::{TypeHierarchy, TypeResolver};

fn signed_rank(ty: &DataType) -> Option<u8> {
    match ty {
        DataType::Int8 => Some(0),
        DataType::Int16 => Some(1),
        DataType::Int32 => Some(2),
        DataType::Int64 => Some(3),
        _ => None,
    }
}

fn unsigned_rank(ty: &DataType) -> Option<u8> {
    match ty {
        DataType::UInt8 => Some(0),
        DataType::UInt16 => Some(1),
        DataType::UInt32 => Some(2),
        DataType::UInt64 => Some(3),
        _ => None,
    }
}

fn float_rank(ty: &DataType) -> Option<u8> {
    match ty {
        DataType::Float16 => Some(0),
        DataType::Float32 => Some(1),
        DataType::Float64 => Some(2),
        _ => None,
    }
}

fn signed_of_rank(rank: u8) -> DataType {
    match rank {
        0 => DataType::Int8,
        1 => DataType::Int16,
        2 => DataType::Int32,
        _ => DataType::Int64,
    }
}

fn unit_rank(unit: &TimeUnit) -> u8 {
    match unit {
        TimeUnit::Second => 0,
        TimeUnit::Millisecond => 1,
        TimeUnit::Microsecond => 2,
        TimeUnit::Nanosecond => 3,
    }
}

pub(crate) fn is_integer(ty: &DataType) -> bool {
    signed_rank(ty).is_some() || unsigned_rank(ty).is_some()
}

pub(crate) fn is_float(ty: &DataType) -> bool {
    float_rank(ty).is_some()
}

/// The narrowest type both `a` and `b` widen to.
pub fn widen(a: &DataType, b: &DataType) -> DataType {
    if a == b {
        return a.clone();
    }

    match (a, b) {
        (DataType::Null, other) | (other, DataType::Null) => return other.clone(),
        (DataType::Date32, DataType::Date64) | (DataType::Date64, DataType::Date32) => {
            return DataType::Date64;
        }
        (DataType::Timestamp(unit_a, tz_a), DataType::Timestamp(unit_b, tz_b)) if tz_a == tz_b => {
            let unit = if unit_rank(unit_a) >= unit_rank(unit_b) {
                unit_a
            } else {
                unit_b
            };
            return DataType::Timestamp(*unit, tz_a.clone());
        }
        _ => {}
    }

    if let (Some(x), Some(y)) = (signed_rank(a), signed_rank(b)) {
        return signed_of_rank(x.max(y));
    }
    if let (Some(x), Some(y)) = (unsigned_rank(a), unsigned_rank(b)) {
        return if x >= y { a.clone() } else { b.clone() };
    }
    if let Some(x) = float_rank(a).zip(float_rank(b)).map(|(x, y)| x.max(y)) {
        return [DataType::Float16, DataType::Float32, DataType::Float64][usize::from(x)].clone();
    }

    let mixed_sign = signed_rank(a)
        .zip(unsigned_rank(b))
        .or_else(|| signed_rank(b).zip(unsigned_rank(a)));
    if let Some((signed, unsigned)) = mixed_sign {
        // UInt64 has no signed counterpart.
        return if unsigned == 3 {
            DataType::Utf8
        } else {
            signed_of_rank(signed.max(unsigned + 1))
        };
    }

    if (is_integer(a) && is_float(b)) || (is_float(a) && is_integer(b)) {
        return DataType::Float64;
    }

    DataType::Utf8
}

/// Folds Arrow types along the widening lattice.
///
/// Resolves to the fallback type, if any, when nothing was accepted.
#[derive(Debug, Clone, Default)]
pub struct WideningTypeResolver {
    current: Option<DataType>,
    fallback: Option<DataType>,
}

impl WideningTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: DataType) -> Self {
        Self {
            current: None,
            fallback: Some(fallback),
        }
    }
}

impl TypeResolver<DataType> for WideningTypeResolver {
    fn accept(&mut self, ty: &DataType) {
        self.current = Some(match self.current.take() {
            Some(current) => widen(&current, ty),
            None => ty.clone(),
        });
    }

    fn resolve(self) -> Option<DataType> {
        self.current.or(self.fallback)
    }
}

/// Creates [`WideningTypeResolver`]s.
///
/// Without a fallback, a column no source could type fails raw spec
/// creation. With one, such a column gets the fallback type and stays
/// marked as untyped.
#[derive(Debug, Clone, Default)]
pub struct ArrowTypeHierarchy {
    fallback: Option<DataType>,
}

impl ArrowTypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: DataType) -> Self {
        Self {
            fallback: Some(fallback),
        }
    }
}

impl TypeHierarchy<DataType> for ArrowTypeHierarchy {
    type Resolver = WideningTypeResolver;

    fn create_resolver(&self) -> WideningTypeResolver {
        WideningTypeResolver {
            current: None,
            fallback: self.fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(types: &[DataType]) -> Option<DataType> {
        let mut resolver = WideningTypeResolver::new();
        for ty in types {
            resolver.accept(ty);
        }
        resolver.resolve()
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(widen(&DataType::Int8, &DataType::Int32), DataType::Int32);
        assert_eq!(widen(&DataType::Int64, &DataType::Int16), DataType::Int64);
        assert_eq!(widen(&DataType::UInt8, &DataType::UInt64), DataType::UInt64);
    }

    #[test]
    fn test_mixed_sign_widening() {
        assert_eq!(widen(&DataType::Int8, &DataType::UInt8), DataType::Int16);
        assert_eq!(widen(&DataType::UInt32, &DataType::Int16), DataType::Int64);
        assert_eq!(widen(&DataType::Int64, &DataType::UInt64), DataType::Utf8);
    }

    #[test]
    fn test_float_widening() {
        assert_eq!(widen(&DataType::Float32, &DataType::Float64), DataType::Float64);
        assert_eq!(widen(&DataType::Int32, &DataType::Float32), DataType::Float64);
        assert_eq!(widen(&DataType::Float16, &DataType::UInt8), DataType::Float64);
    }

    #[test]
    fn test_temporal_widening() {
        assert_eq!(widen(&DataType::Date32, &DataType::Date64), DataType::Date64);

        let millis = DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()));
        let nanos = DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()));
        assert_eq!(widen(&millis, &nanos), nanos);

        let local = DataType::Timestamp(TimeUnit::Nanosecond, None);
        assert_eq!(widen(&millis, &local), DataType::Utf8);
    }

    #[test]
    fn test_null_is_identity() {
        assert_eq!(widen(&DataType::Null, &DataType::Boolean), DataType::Boolean);
        assert_eq!(widen(&DataType::Date32, &DataType::Null), DataType::Date32);
    }

    #[test]
    fn test_disagreement_widens_to_utf8() {
        assert_eq!(widen(&DataType::Boolean, &DataType::Int32), DataType::Utf8);
        assert_eq!(widen(&DataType::Date32, &DataType::Int32), DataType::Utf8);
    }

    #[test]
    fn test_resolver_folds_in_order() {
        assert_eq!(
            resolve(&[DataType::Int8, DataType::Int32, DataType::Float32]),
            Some(DataType::Float64)
        );
        assert_eq!(resolve(&[]), None);
    }

    #[test]
    fn test_hierarchy_fallback() {
        let hierarchy = ArrowTypeHierarchy::with_fallback(DataType::Utf8);
        assert_eq!(hierarchy.create_resolver().resolve(), Some(DataType::Utf8));

        let mut resolver = hierarchy.create_resolver();
        resolver.accept(&DataType::Int32);
        assert_eq!(resolver.resolve(), Some(DataType::Int32));

        assert_eq!(ArrowTypeHierarchy::new().create_resolver().resolve(), None);
    }
}
