//! Translation from output column indices to a source's native indices.

use crate::spec::TypedTableSpec;

use super::source::Row;

/// Maps each output column to the index of the same column in one source.
///
/// Output columns the source lacks have no mapping and read as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapper {
    mapping: Vec<Option<usize>>,
}

impl IndexMapper {
    /// Map the raw column names of the output, in output order, onto `source`.
    pub fn new<'a, T>(columns: impl IntoIterator<Item = &'a str>, source: &TypedTableSpec<T>) -> Self {
        Self {
            mapping: columns.into_iter().map(|name| source.index_of(name)).collect(),
        }
    }

    pub fn from_mapping(mapping: Vec<Option<usize>>) -> Self {
        Self { mapping }
    }

    pub fn has_mapping(&self, output_index: usize) -> bool {
        self.source_index(output_index).is_some()
    }

    pub fn source_index(&self, output_index: usize) -> Option<usize> {
        self.mapping.get(output_index).copied().flatten()
    }

    /// Number of output columns.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// One past the largest source index referenced; source rows never need
    /// to be longer than this.
    pub fn upper_bound(&self) -> usize {
        self.mapping
            .iter()
            .flatten()
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Rearrange a source row into output order.
    ///
    /// Cells past the end of a short row read as missing.
    pub fn adapt<V>(&self, mut raw: Row<V>) -> Row<V> {
        self.mapping
            .iter()
            .map(|index| index.and_then(|i| raw.get_mut(i).and_then(Option::take)))
            .collect()
    }
}
