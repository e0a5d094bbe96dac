//! Staging and reading of source groups.
//!
//! ```ignore
//! let factory = MultiTableReadFactory::new(reader, hierarchy, provider, converter, config);
//! let staged = factory.stage(&group)?;
//! let read = staged.without_transformation(&group)?;
//!
//! let mut rows = Vec::new();
//! read.fill_row_output(&mut rows, &NoopMonitor, &mut SequentialRowKeys::new())?;
//! ```

pub mod keys;
pub mod mapper;
pub mod monitor;
pub mod multi;
pub mod preview;
pub mod sink;
pub mod source;
pub mod staged;

pub use keys::{PrefixedRowKeys, RowKeyGenerator, SequentialRowKeys};
pub use mapper::IndexMapper;
pub use monitor::{CancellationMonitor, NoopMonitor, ReadMonitor};
pub use multi::{MultiTableRead, ReadSummary};
pub use preview::PreviewIterator;
pub use sink::RowSink;
pub use source::{Row, RowStream, SourceGroup, SourceReader};
pub use staged::{MultiTableReadFactory, StagedMultiTableRead};
