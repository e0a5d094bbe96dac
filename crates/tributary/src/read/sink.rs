//! Destinations of a push-based read.

use std::convert::Infallible;

use crate::error::BoxError;

use super::source::Row;

/// Receives keyed output rows in read order.
pub trait RowSink<K, V> {
    type Error: Into<BoxError>;

    fn push(&mut self, key: K, row: Row<V>) -> Result<(), Self::Error>;
}

impl<K, V> RowSink<K, V> for Vec<(K, Row<V>)> {
    type Error = Infallible;

    fn push(&mut self, key: K, row: Row<V>) -> Result<(), Infallible> {
        Vec::push(self, (key, row));
        Ok(())
    }
}
