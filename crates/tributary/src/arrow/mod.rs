//! Arrow data types as type tokens.
//!
//! - `resolver` - the widening lattice and its [`TypeHierarchy`](crate::spec::TypeHierarchy)
//! - `convert` - production paths and the value converter
//! - `value` - cell values

pub mod convert;
pub mod resolver;
pub mod value;

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, SchemaRef};

use crate::spec::{TypedColumnSpec, TypedTableSpec};
use crate::transform::OutputSpec;

pub use convert::{ArrowPathProvider, ArrowValueConverter, cast};
pub use resolver::{ArrowTypeHierarchy, WideningTypeResolver, widen};
pub use value::Value;

impl OutputSpec<DataType> {
    /// The Arrow schema rows are produced in. Every field is nullable.
    pub fn to_arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns()
            .iter()
            .map(|column| Field::new(&column.name, column.ty.clone(), true))
            .collect();
        Arc::new(Schema::new(fields))
    }
}

/// A `Null` field is a column the source holds no type for.
impl From<&Schema> for TypedTableSpec<DataType> {
    fn from(schema: &Schema) -> Self {
        schema
            .fields()
            .iter()
            .map(|field| {
                let ty = field.data_type().clone();
                let has_type = ty != DataType::Null;
                TypedColumnSpec::new(field.name().clone(), ty, has_type)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RawSpecFactory;

    #[test]
    fn test_schema_to_spec() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("note", DataType::Null, true),
        ]);

        let spec = TypedTableSpec::from(&schema);

        assert_eq!(spec.column_names().collect::<Vec<_>>(), vec!["id", "note"]);
        assert!(spec.get("id").unwrap().has_type());
        assert!(!spec.get("note").unwrap().has_type());
    }

    #[test]
    fn test_untyped_column_resolves_from_other_source() {
        let first = TypedTableSpec::from(&Schema::new(vec![Field::new("a", DataType::Null, true)]));
        let second = TypedTableSpec::from(&Schema::new(vec![Field::new("a", DataType::Int32, true)]));

        let raw = RawSpecFactory::new(ArrowTypeHierarchy::new())
            .create(&[first, second])
            .unwrap();

        let column = raw.union().get("a").unwrap();
        assert_eq!(column.ty(), &DataType::Int32);
        assert!(column.has_type());
    }

    #[test]
    fn test_output_spec_to_arrow_schema() {
        let spec: OutputSpec<DataType> = [
            crate::transform::OutputColumn {
                name: "id".to_string(),
                ty: DataType::Int64,
            },
            crate::transform::OutputColumn {
                name: "label".to_string(),
                ty: DataType::Utf8,
            },
        ]
        .into_iter()
        .collect();

        let schema = spec.to_arrow_schema();

        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
    }
}
