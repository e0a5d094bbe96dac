//! Streaming the rows of a bound source group.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use tributary_core::emit;

use crate::error::ReadError;
use crate::metrics::events::{ReadCanceled, ReadCompleted, RowsRead, SourceOpened};
use crate::transform::{OutputSpec, ProductionPath, TableTransformation, ValueConverter};

use super::keys::{RowKeyGenerator, SequentialRowKeys};
use super::mapper::IndexMapper;
use super::monitor::ReadMonitor;
use super::preview::PreviewIterator;
use super::sink::RowSink;
use super::source::{Row, RowStream, SourceGroup, SourceReader};

/// Row counts of a completed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Rows read per source, in group order.
    pub rows_per_source: Vec<u64>,
    pub total_rows: u64,
}

/// A source group bound to a transformation.
///
/// Sources are read one after the other in group order. Each source's
/// stream is opened when its turn starts and dropped when it ends.
pub struct MultiTableRead<I, R: SourceReader<I>, C> {
    group: SourceGroup<I>,
    reader: Arc<R>,
    converter: Arc<C>,
    transformation: Arc<TableTransformation<R::Type>>,
    output_spec: OutputSpec<R::Type>,
    paths: Vec<ProductionPath<R::Type>>,
    mappers: Vec<IndexMapper>,
    progress_interval: u64,
}

impl<I, R, C> MultiTableRead<I, R, C>
where
    I: Debug,
    R: SourceReader<I>,
    C: ValueConverter<R::Type, Value = R::Value>,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        group: SourceGroup<I>,
        reader: Arc<R>,
        converter: Arc<C>,
        transformation: Arc<TableTransformation<R::Type>>,
        output_spec: OutputSpec<R::Type>,
        paths: Vec<ProductionPath<R::Type>>,
        mappers: Vec<IndexMapper>,
        progress_interval: u64,
    ) -> Self {
        Self {
            group,
            reader,
            converter,
            transformation,
            output_spec,
            paths,
            mappers,
            progress_interval: progress_interval.max(1),
        }
    }

    pub fn group(&self) -> &SourceGroup<I> {
        &self.group
    }

    pub fn transformation(&self) -> &Arc<TableTransformation<R::Type>> {
        &self.transformation
    }

    /// The columns every produced row has, in order.
    pub fn output_spec(&self) -> &OutputSpec<R::Type> {
        &self.output_spec
    }

    /// One mapper per source, in group order.
    pub fn mappers(&self) -> &[IndexMapper] {
        &self.mappers
    }

    /// Read every source and push its rows to `sink`.
    ///
    /// `keys` is called once per row across the whole group. The monitor is
    /// polled before each source and every `progress_interval` rows; a
    /// canceled monitor stops the read with [`ReadError::Canceled`]. Rows
    /// pushed before a failure stay in the sink.
    ///
    /// Progress is `(sources done + fraction of the current source) / sources`.
    /// Streams open one at a time, so row counts of later sources are not
    /// known up front; each source counts equally.
    pub fn fill_row_output<S, M, G>(
        &self,
        sink: &mut S,
        monitor: &M,
        keys: &mut G,
    ) -> Result<ReadSummary, ReadError>
    where
        S: RowSink<G::Key, R::Value>,
        M: ReadMonitor,
        G: RowKeyGenerator<R::Value>,
    {
        let start = Instant::now();
        let sources = self.group.len();
        let mut summary = ReadSummary::default();

        for (index, item) in self.group.items().iter().enumerate() {
            self.check_canceled(monitor)?;

            let mut stream = self.open(item)?;
            let max_rows = stream.max_rows();
            let mut rows = 0u64;

            while let Some(raw) = self.next_row(&mut stream, item, rows)? {
                let key = keys.next_key(&raw);
                let row = self.transform_row(index, raw)?;
                sink.push(key, row)
                    .map_err(|e| ReadError::Sink { source: e.into() })?;
                rows += 1;

                if rows % self.progress_interval == 0 {
                    self.check_canceled(monitor)?;
                    if let Some(max_rows) = max_rows.filter(|&max| max > 0) {
                        let within = (rows as f64 / max_rows as f64).min(1.0);
                        monitor.set_progress(
                            (index as f64 + within) / sources as f64,
                            &format!("Reading source {} of {sources}", index + 1),
                        );
                    }
                }
            }
            drop(stream);

            debug!(group = %self.group.id(), item = ?item, rows, "Finished source");
            emit!(RowsRead {
                count: rows,
                group: self.group.id().to_string(),
            });
            monitor.set_progress(
                (index + 1) as f64 / sources as f64,
                &format!("Read source {} of {sources}", index + 1),
            );

            summary.total_rows += rows;
            summary.rows_per_source.push(rows);
        }

        info!(
            group = %self.group.id(),
            sources,
            rows = summary.total_rows,
            "Read source group"
        );
        emit!(ReadCompleted {
            duration: start.elapsed(),
            group: self.group.id().to_string(),
        });

        Ok(summary)
    }

    /// A pull-based iterator over the same rows, keyed `0, 1, 2, ...`.
    pub fn create_preview_iterator(&self) -> PreviewIterator<'_, I, R, C, SequentialRowKeys> {
        self.create_preview_iterator_with(SequentialRowKeys::new())
    }

    /// A pull-based iterator over the same rows with custom keys.
    pub fn create_preview_iterator_with<G>(&self, keys: G) -> PreviewIterator<'_, I, R, C, G>
    where
        G: RowKeyGenerator<R::Value>,
    {
        PreviewIterator::new(self, keys)
    }

    pub(crate) fn open(&self, item: &I) -> Result<R::Stream, ReadError> {
        let stream = self.reader.open(item).map_err(|e| ReadError::OpenSource {
            item: format!("{item:?}"),
            source: e.into(),
        })?;
        emit!(SourceOpened {
            group: self.group.id().to_string(),
        });
        Ok(stream)
    }

    pub(crate) fn next_row(
        &self,
        stream: &mut R::Stream,
        item: &I,
        row: u64,
    ) -> Result<Option<Row<R::Value>>, ReadError> {
        stream.next_row().map_err(|e| ReadError::NextRow {
            item: format!("{item:?}"),
            row,
            source: e.into(),
        })
    }

    /// Rearrange a raw row of source `index` into output order and convert
    /// every present cell along its column's path.
    pub(crate) fn transform_row(
        &self,
        index: usize,
        raw: Row<R::Value>,
    ) -> Result<Row<R::Value>, ReadError> {
        let Some(mapper) = self.mappers.get(index) else {
            return Ok(std::iter::repeat_with(|| None).take(self.paths.len()).collect());
        };

        mapper
            .adapt(raw)
            .into_iter()
            .zip(&self.paths)
            .zip(self.output_spec.columns())
            .map(|((cell, path), column)| {
                cell.map(|value| self.converter.convert(path, value))
                    .transpose()
                    .map_err(|source| ReadError::Conversion {
                        column: column.name.clone(),
                        source,
                    })
            })
            .collect()
    }

    fn check_canceled<M: ReadMonitor>(&self, monitor: &M) -> Result<(), ReadError> {
        if monitor.is_canceled() {
            info!(group = %self.group.id(), "Read canceled");
            emit!(ReadCanceled {
                group: self.group.id().to_string(),
            });
            return Err(ReadError::Canceled);
        }
        Ok(())
    }
}
