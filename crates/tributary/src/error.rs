//! Error types for schema reconciliation and multi-source reads.

use snafu::prelude::*;

pub use tributary_core::ConfigError;

/// Boxed error produced by an external collaborator (source reader,
/// value converter or row sink).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while combining per-source table specs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SpecError {
    /// No specs were supplied.
    #[snafu(display("Cannot merge specs: no elements"))]
    NoSpecs,

    /// A column never received a type in any source.
    #[snafu(display("Column '{column}' has no type in any source"))]
    UntypedColumn { column: String },

    /// The intersection of all specs has no columns.
    #[snafu(display("The intersection of all source specs is empty"))]
    EmptyIntersection,

    /// Specs disagree on their column names while identical specs are required.
    #[snafu(display(
        "Spec {index} differs from the first spec: expected columns {expected:?}, found {found:?}"
    ))]
    DifferingSpecs {
        index: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A merger was materialized before anything was merged into it.
    #[snafu(display("No spec has been merged into the {merger} merger"))]
    NothingMerged { merger: &'static str },

    /// Same-named columns with different types were merged.
    #[snafu(display("Column '{column}' has conflicting types {first} and {other}"))]
    ColumnTypeConflict {
        column: String,
        first: String,
        other: String,
    },
}

/// Errors raised while building or reconciling a table transformation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransformationError {
    /// Type enforcement found no conversion reaching the stored destination.
    #[snafu(display(
        "Column '{column}' changed its type to {found_type}, which has no conversion to {destination}"
    ))]
    NoCompatiblePath {
        column: String,
        found_type: String,
        destination: String,
    },

    /// A column transformation refers to a column the raw spec does not contain.
    #[snafu(display("Transformation refers to unknown column '{column}'"))]
    UnknownColumn { column: String },

    /// Two column transformations refer to the same column.
    #[snafu(display("Column '{column}' has more than one transformation"))]
    DuplicateColumn { column: String },

    /// Positions do not form the sequence 0..N-1.
    #[snafu(display("Transformation positions must be dense, got {positions:?}"))]
    NonDensePositions { positions: Vec<usize> },
}

/// Errors raised while staging a source group or streaming its rows.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReadError {
    /// A source group without members was staged.
    #[snafu(display("Cannot stage a read without sources"))]
    NoSources,

    /// A staged read was bound to a group it was not staged for.
    #[snafu(display("Staged read is not valid for source group '{group}'"))]
    StaleStaging { group: String },

    /// Spec computation failed.
    #[snafu(display("Spec error: {source}"))]
    Spec { source: SpecError },

    /// Transformation building or reconciliation failed.
    #[snafu(display("Transformation error: {source}"))]
    Transformation { source: TransformationError },

    /// The source reader could not produce a spec.
    #[snafu(display("Failed to read spec of {item}: {source}"))]
    ReadSpec { item: String, source: BoxError },

    /// The source reader could not open a row stream.
    #[snafu(display("Failed to open {item}: {source}"))]
    OpenSource { item: String, source: BoxError },

    /// The row stream failed mid-read.
    #[snafu(display("Failed to read row {row} of {item}: {source}"))]
    NextRow {
        item: String,
        row: u64,
        source: BoxError,
    },

    /// A cell could not be converted along its production path.
    #[snafu(display("Failed to convert column '{column}': {source}"))]
    Conversion { column: String, source: BoxError },

    /// The sink rejected a row.
    #[snafu(display("Failed to push row to sink: {source}"))]
    Sink { source: BoxError },

    /// The read was canceled through the monitor.
    #[snafu(display("Read canceled"))]
    Canceled,
}

impl ReadError {
    /// Check if this error is a cancellation rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ReadError::Canceled)
    }
}

impl From<SpecError> for ReadError {
    fn from(source: SpecError) -> Self {
        ReadError::Spec { source }
    }
}

impl From<TransformationError> for ReadError {
    fn from(source: TransformationError) -> Self {
        ReadError::Transformation { source }
    }
}

/// Errors raised while converting a cell value to an Arrow output type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConversionError {
    /// No conversion exists between the value and the destination type.
    #[snafu(display("Cannot convert {value} to {destination}"))]
    Unsupported { value: String, destination: String },

    /// A string value does not parse as the destination type.
    #[snafu(display("Cannot parse '{value}' as {destination}"))]
    Parse { value: String, destination: String },

    /// A numeric value does not fit the destination type.
    #[snafu(display("Value {value} is out of range for {destination}"))]
    OutOfRange { value: String, destination: String },
}
