//! The mapping from raw-spec columns to output columns.
//!
//! A [`TableTransformation`] is computed once per staging and may be
//! persisted by the caller; the shapes here derive `Serialize` and
//! `Deserialize` and leave the encoding to them. A deserialized
//! transformation should be checked with [`TableTransformation::validate`]
//! before use, which binding does.

pub mod factory;
pub mod path;

pub use factory::TableTransformationFactory;
pub use path::{ProductionPath, ProductionPathProvider, ValueConverter};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::TransformationError;
use crate::spec::{RawSpec, TypeToken, TypedColumnSpec, TypedTableSpec};

/// Which half of a [`RawSpec`] holds the known columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFilterMode {
    /// Columns present in any source.
    #[default]
    Union,
    /// Columns present in every source.
    Intersection,
}

impl ColumnFilterMode {
    pub fn relevant_spec<T>(self, raw: &RawSpec<T>) -> &TypedTableSpec<T> {
        match self {
            ColumnFilterMode::Union => raw.union(),
            ColumnFilterMode::Intersection => raw.intersection(),
        }
    }
}

/// How one raw column appears in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformation<T> {
    /// Name of the raw-spec column this applies to.
    pub column: String,
    pub output_name: String,
    pub path: ProductionPath<T>,
    pub position: usize,
    pub keep: bool,
}

impl<T> ColumnTransformation<T> {
    pub fn destination_type(&self) -> &T {
        &self.path.destination
    }
}

/// Placement of columns that appear after a transformation was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownColumnsTransformation {
    /// Slot new columns are inserted at.
    pub position: usize,
    /// Whether new columns are output.
    pub keep: bool,
}

/// The resolved mapping from the columns of a [`RawSpec`] to output columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableTransformation<T> {
    raw_spec: RawSpec<T>,
    column_filter_mode: ColumnFilterMode,
    enforce_types: bool,
    skip_empty_columns: bool,
    columns: Vec<ColumnTransformation<T>>,
    unknown_columns: UnknownColumnsTransformation,
}

impl<T: TypeToken> TableTransformation<T> {
    /// Create a transformation and check its invariants.
    ///
    /// # Errors
    ///
    /// See [`TableTransformation::validate`].
    pub fn new(
        raw_spec: RawSpec<T>,
        column_filter_mode: ColumnFilterMode,
        enforce_types: bool,
        skip_empty_columns: bool,
        columns: Vec<ColumnTransformation<T>>,
        unknown_columns: UnknownColumnsTransformation,
    ) -> Result<Self, TransformationError> {
        let transformation = Self {
            raw_spec,
            column_filter_mode,
            enforce_types,
            skip_empty_columns,
            columns,
            unknown_columns,
        };
        transformation.validate()?;
        Ok(transformation)
    }

    /// Check that every column transformation refers to a distinct union
    /// column and that positions form the sequence `0..N`.
    pub fn validate(&self) -> Result<(), TransformationError> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !self.raw_spec.union().contains(&column.column) {
                return Err(TransformationError::UnknownColumn {
                    column: column.column.clone(),
                });
            }
            if !seen.insert(column.column.as_str()) {
                return Err(TransformationError::DuplicateColumn {
                    column: column.column.clone(),
                });
            }
        }

        let mut positions: Vec<usize> = self.columns.iter().map(|c| c.position).collect();
        positions.sort_unstable();
        if positions.iter().enumerate().any(|(idx, &pos)| idx != pos) {
            return Err(TransformationError::NonDensePositions { positions });
        }
        Ok(())
    }

    pub fn raw_spec(&self) -> &RawSpec<T> {
        &self.raw_spec
    }

    pub fn column_filter_mode(&self) -> ColumnFilterMode {
        self.column_filter_mode
    }

    pub fn enforce_types(&self) -> bool {
        self.enforce_types
    }

    pub fn skip_empty_columns(&self) -> bool {
        self.skip_empty_columns
    }

    pub fn unknown_columns(&self) -> UnknownColumnsTransformation {
        self.unknown_columns
    }

    /// Column transformations in raw-spec union order.
    pub fn columns(&self) -> &[ColumnTransformation<T>] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&ColumnTransformation<T>> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Whether `column` passes the filter mode and the empty-column rule.
    pub fn is_included(&self, column: &TypedColumnSpec<T>) -> bool {
        if self.skip_empty_columns && !column.has_type() {
            return false;
        }
        self.column_filter_mode
            .relevant_spec(&self.raw_spec)
            .contains(column.name())
    }

    /// The transformations that produce an output column, by position.
    pub fn output_columns(&self) -> Vec<&ColumnTransformation<T>> {
        let union = self.raw_spec.union();
        let mut output: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.keep)
            .filter(|c| union.get(&c.column).is_some_and(|spec| self.is_included(spec)))
            .collect();
        output.sort_by_key(|c| c.position);
        output
    }

    /// The ordered names and types of the output.
    pub fn output_spec(&self) -> OutputSpec<T> {
        self.output_columns()
            .into_iter()
            .map(|c| OutputColumn {
                name: c.output_name.clone(),
                ty: c.path.destination.clone(),
            })
            .collect()
    }

    /// Rename the output column produced from `column`.
    pub fn rename(&mut self, column: &str, output_name: impl Into<String>) -> Result<(), TransformationError> {
        self.column_mut(column)?.output_name = output_name.into();
        Ok(())
    }

    /// Set whether `column` is output.
    pub fn set_keep(&mut self, column: &str, keep: bool) -> Result<(), TransformationError> {
        self.column_mut(column)?.keep = keep;
        Ok(())
    }

    /// Replace the conversion used for `column`.
    pub fn set_path(&mut self, column: &str, path: ProductionPath<T>) -> Result<(), TransformationError> {
        self.column_mut(column)?.path = path;
        Ok(())
    }

    pub fn set_unknown_columns(&mut self, unknown_columns: UnknownColumnsTransformation) {
        self.unknown_columns = unknown_columns;
    }

    fn column_mut(&mut self, column: &str) -> Result<&mut ColumnTransformation<T>, TransformationError> {
        self.columns
            .iter_mut()
            .find(|c| c.column == column)
            .ok_or_else(|| TransformationError::UnknownColumn {
                column: column.to_string(),
            })
    }
}

/// One column of an [`OutputSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn<T> {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: T,
}

/// The ordered columns rows are produced in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec<T> {
    columns: Vec<OutputColumn<T>>,
}

impl<T> OutputSpec<T> {
    pub fn columns(&self) -> &[OutputColumn<T>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl<T> FromIterator<OutputColumn<T>> for OutputSpec<T> {
    fn from_iter<I: IntoIterator<Item = OutputColumn<T>>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
