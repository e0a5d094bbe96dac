//! Tributary: reads many tabular sources as one table.
//!
//! This crate handles:
//! - Resolving the column types of a source group into a union and an intersection spec
//! - Turning that spec into a table transformation that names, orders and casts every column
//! - Reconciling a stored transformation with a source group whose schema drifted
//! - Streaming the rows of every source through the transformation, into a sink or an iterator
//! - Merging value domains (bounds and possible values) of table specs
//! - An Arrow type system for all of the above

pub mod arrow;
pub mod config;
pub mod error;
pub mod metrics;
pub mod read;
pub mod spec;
pub mod transform;

// Re-export commonly used items
pub use config::ReadConfig;
pub use error::{ConversionError, ReadError, SpecError, TransformationError};
pub use read::{
    MultiTableRead, MultiTableReadFactory, PreviewIterator, ReadMonitor, RowSink,
    SourceGroup, SourceReader, StagedMultiTableRead,
};
pub use spec::{RawSpec, RawSpecFactory, TypedColumnSpec, TypedTableSpec};
pub use transform::{
    ColumnFilterMode, OutputSpec, TableTransformation, TableTransformationFactory,
};

// Re-export from tributary-core
pub use tributary_core::{ConfigError, init_tracing};
