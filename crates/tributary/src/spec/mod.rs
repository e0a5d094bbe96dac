//! Typed table specs and their reconciliation across sources.
//!
//! A source reader describes each source as a [`TypedTableSpec`]. The
//! [`RawSpecFactory`] folds the per-source specs of one source group into a
//! [`RawSpec`], the union and intersection of all columns with widened types.
//! Column identity across sources is the column name.

pub mod legacy;
pub mod merge;
pub mod raw;
pub mod resolver;

pub use legacy::SpecMergeMode;
pub use merge::{
    ColumnDomain, ColumnSpecMerger, DEFAULT_MAX_POSSIBLE_VALUES, DomainColumnSpec,
    DomainTableSpec, TableSpecMerger,
};
pub use raw::RawSpecFactory;
pub use resolver::{TypeHierarchy, TypeResolver};

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Bounds every type token has to satisfy.
///
/// Type tokens are opaque to this crate: they are compared, cloned and
/// printed in error messages, nothing else.
pub trait TypeToken: Clone + PartialEq + Debug {}

impl<T: Clone + PartialEq + Debug> TypeToken for T {}

/// A column as described by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedColumnSpec<T> {
    name: Option<String>,
    #[serde(rename = "type")]
    ty: T,
    has_type: bool,
}

impl<T> TypedColumnSpec<T> {
    /// Create a named column.
    pub fn new(name: impl Into<String>, ty: T, has_type: bool) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            has_type,
        }
    }

    /// Create a named column whose type was inferred from data.
    pub fn typed(name: impl Into<String>, ty: T) -> Self {
        Self::new(name, ty, true)
    }

    /// Create a column without a name.
    ///
    /// It is named `Column<i>` once it becomes part of a [`TypedTableSpec`].
    pub fn unnamed(ty: T, has_type: bool) -> Self {
        Self {
            name: None,
            ty,
            has_type,
        }
    }

    /// The column name, empty for a column that was never named.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn ty(&self) -> &T {
        &self.ty
    }

    /// False if the source had no data to infer the type from.
    pub fn has_type(&self) -> bool {
        self.has_type
    }
}

/// The ordered columns of one source, in the source's native order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTableSpec<T>")]
pub struct TypedTableSpec<T> {
    columns: Vec<TypedColumnSpec<T>>,
}

/// Deserialized form of [`TypedTableSpec`], named through [`TypedTableSpec::new`].
#[derive(Deserialize)]
struct StoredTableSpec<T> {
    columns: Vec<TypedColumnSpec<T>>,
}

impl<T> From<StoredTableSpec<T>> for TypedTableSpec<T> {
    fn from(stored: StoredTableSpec<T>) -> Self {
        Self::new(stored.columns)
    }
}

impl<T> TypedTableSpec<T> {
    /// Create a spec, naming unnamed columns after their index.
    pub fn new(columns: Vec<TypedColumnSpec<T>>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(idx, mut column)| {
                if column.name.is_none() {
                    column.name = Some(format!("Column{idx}"));
                }
                column
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[TypedColumnSpec<T>] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypedColumnSpec<T>> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the first column called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// The first column called `name`.
    pub fn get(&self, name: &str) -> Option<&TypedColumnSpec<T>> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(TypedColumnSpec::name)
    }
}

impl<T> FromIterator<TypedColumnSpec<T>> for TypedTableSpec<T> {
    fn from_iter<I: IntoIterator<Item = TypedColumnSpec<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a TypedTableSpec<T> {
    type Item = &'a TypedColumnSpec<T>;
    type IntoIter = std::slice::Iter<'a, TypedColumnSpec<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Union and intersection of the specs of one source group.
///
/// Every intersection column is also a union column. Both halves list their
/// columns in the order they were first seen across the input specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpec<T> {
    union: TypedTableSpec<T>,
    intersection: TypedTableSpec<T>,
}

impl<T> RawSpec<T> {
    pub(crate) fn new(union: TypedTableSpec<T>, intersection: TypedTableSpec<T>) -> Self {
        Self {
            union,
            intersection,
        }
    }

    pub fn union(&self) -> &TypedTableSpec<T> {
        &self.union
    }

    pub fn intersection(&self) -> &TypedTableSpec<T> {
        &self.intersection
    }
}
