//! Pull-based access to the rows of a bound source group.

use std::fmt::Debug;
use std::iter::FusedIterator;

use crate::error::ReadError;
use crate::transform::ValueConverter;

use super::keys::RowKeyGenerator;
use super::multi::MultiTableRead;
use super::source::{Row, SourceReader};

struct OpenSource<S> {
    index: usize,
    stream: S,
    rows: u64,
}

/// Iterates over the rows of a [`MultiTableRead`] without a sink.
///
/// Streams are opened lazily, one source at a time. [`close`] or dropping
/// the iterator releases the open stream, whether or not iteration started.
/// After an error the iterator is closed and yields nothing more.
///
/// [`close`]: PreviewIterator::close
pub struct PreviewIterator<'a, I, R: SourceReader<I>, C, G> {
    read: &'a MultiTableRead<I, R, C>,
    keys: G,
    next_source: usize,
    current: Option<OpenSource<R::Stream>>,
    closed: bool,
}

impl<'a, I, R, C, G> PreviewIterator<'a, I, R, C, G>
where
    I: Debug,
    R: SourceReader<I>,
    C: ValueConverter<R::Type, Value = R::Value>,
    G: RowKeyGenerator<R::Value>,
{
    pub(crate) fn new(read: &'a MultiTableRead<I, R, C>, keys: G) -> Self {
        Self {
            read,
            keys,
            next_source: 0,
            current: None,
            closed: false,
        }
    }

    /// Release the open stream, if any, and end the iteration.
    pub fn close(&mut self) {
        self.current = None;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn fail(&mut self, error: ReadError) -> Option<Result<(G::Key, Row<R::Value>), ReadError>> {
        self.close();
        Some(Err(error))
    }
}

impl<I, R, C, G> Iterator for PreviewIterator<'_, I, R, C, G>
where
    I: Debug,
    R: SourceReader<I>,
    C: ValueConverter<R::Type, Value = R::Value>,
    G: RowKeyGenerator<R::Value>,
{
    type Item = Result<(G::Key, Row<R::Value>), ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let read = self.read;
        while !self.closed {
            if self.current.is_none() {
                let index = self.next_source;
                let Some(item) = read.group().items().get(index) else {
                    self.close();
                    return None;
                };
                self.next_source += 1;
                match read.open(item) {
                    Ok(stream) => {
                        self.current = Some(OpenSource {
                            index,
                            stream,
                            rows: 0,
                        })
                    }
                    Err(e) => return self.fail(e),
                }
            }

            let Some(current) = self.current.as_mut() else {
                continue;
            };
            let index = current.index;
            let Some(item) = read.group().items().get(index) else {
                self.close();
                return None;
            };
            match read.next_row(&mut current.stream, item, current.rows) {
                Ok(Some(raw)) => {
                    current.rows += 1;
                    let key = self.keys.next_key(&raw);
                    return match read.transform_row(index, raw) {
                        Ok(row) => Some(Ok((key, row))),
                        Err(e) => self.fail(e),
                    };
                }
                Ok(None) => self.current = None,
                Err(e) => return self.fail(e),
            }
        }
        None
    }
}

impl<I, R, C, G> FusedIterator for PreviewIterator<'_, I, R, C, G>
where
    I: Debug,
    R: SourceReader<I>,
    C: ValueConverter<R::Type, Value = R::Value>,
    G: RowKeyGenerator<R::Value>,
{
}
