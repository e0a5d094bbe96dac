//! The source side of a read: groups of items and the reader that opens them.

use crate::error::BoxError;
use crate::spec::TypedTableSpec;

/// One row in a source's native column order. `None` is a missing cell.
pub type Row<V> = Vec<Option<V>>;

/// An identified, ordered list of sources read as one table.
///
/// Items are whatever the [`SourceReader`] knows how to open: paths, URLs
/// or table handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup<I> {
    id: String,
    items: Vec<I>,
}

impl<I> SourceGroup<I> {
    pub fn new(id: impl Into<String>, items: Vec<I>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pull-based access to the rows of one opened source.
///
/// Dropping the stream releases the underlying handle.
pub trait RowStream {
    type Value;
    type Error: Into<BoxError>;

    /// The next row, or `None` at the end of the source.
    fn next_row(&mut self) -> Result<Option<Row<Self::Value>>, Self::Error>;

    /// Number of rows the source holds, if known up front.
    fn max_rows(&self) -> Option<u64> {
        None
    }
}

/// Describes and opens the items of a [`SourceGroup`].
pub trait SourceReader<I> {
    /// Type token of the columns.
    type Type;
    /// Cell value.
    type Value;
    type Error: Into<BoxError>;
    type Stream: RowStream<Value = Self::Value, Error = Self::Error>;

    /// The columns of `item` in its native order.
    fn read_spec(&self, item: &I) -> Result<TypedTableSpec<Self::Type>, Self::Error>;

    /// Open a row stream over `item`.
    fn open(&self, item: &I) -> Result<Self::Stream, Self::Error>;
}
