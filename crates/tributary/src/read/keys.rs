//! Row key generators.
//!
//! A generator is called once per row, in group order, across all sources of
//! a read, so keys keep increasing from one source to the next.

use crate::config::ReadConfig;

/// Produces the key of each row.
pub trait RowKeyGenerator<V> {
    type Key;

    /// The key of the next row. `row` is the row as the source produced it.
    fn next_key(&mut self, row: &[Option<V>]) -> Self::Key;
}

/// Keys `0, 1, 2, ...`.
#[derive(Debug, Clone, Default)]
pub struct SequentialRowKeys {
    next: u64,
}

impl SequentialRowKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue a numbering that already handed out `start` keys.
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }
}

impl<V> RowKeyGenerator<V> for SequentialRowKeys {
    type Key = u64;

    fn next_key(&mut self, _row: &[Option<V>]) -> u64 {
        let key = self.next;
        self.next += 1;
        key
    }
}

/// Keys `Row0, Row1, ...` with a configurable prefix.
#[derive(Debug, Clone)]
pub struct PrefixedRowKeys {
    prefix: String,
    next: u64,
}

impl PrefixedRowKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn from_config(config: &ReadConfig) -> Self {
        Self::new(config.row_key_prefix.clone())
    }
}

impl<V> RowKeyGenerator<V> for PrefixedRowKeys {
    type Key = String;

    fn next_key(&mut self, _row: &[Option<V>]) -> String {
        let key = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        key
    }
}
