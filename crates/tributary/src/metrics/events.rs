//! Internal events for tributary metrics emission.
//!
//! Every event carries a `group` label naming the source group it belongs
//! to, so reads of several groups in one process stay distinguishable.

use std::time::Duration;

use metrics::{counter, histogram};
use tracing::trace;
use tributary_core::InternalEvent;

/// Event emitted when rows of one source have been pushed to the sink.
pub struct RowsRead {
    pub count: u64,
    pub group: String,
}

impl InternalEvent for RowsRead {
    fn emit(self) {
        trace!(count = self.count, group = %self.group, "Rows read");
        counter!("tributary_rows_read_total", "group" => self.group).increment(self.count);
    }
}

/// Event emitted when a source row stream is opened.
pub struct SourceOpened {
    pub group: String,
}

impl InternalEvent for SourceOpened {
    fn emit(self) {
        trace!(group = %self.group, "Source opened");
        counter!("tributary_sources_opened_total", "group" => self.group).increment(1);
    }
}

/// Event emitted when a full read of a source group finished.
pub struct ReadCompleted {
    pub duration: Duration,
    pub group: String,
}

impl InternalEvent for ReadCompleted {
    fn emit(self) {
        trace!(duration_ms = self.duration.as_millis() as u64, group = %self.group, "Read completed");
        histogram!("tributary_read_duration_seconds", "group" => self.group)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a read stopped because the monitor was canceled.
pub struct ReadCanceled {
    pub group: String,
}

impl InternalEvent for ReadCanceled {
    fn emit(self) {
        trace!(group = %self.group, "Read canceled");
        counter!("tributary_reads_canceled_total", "group" => self.group).increment(1);
    }
}

/// Event emitted when reconciling a transformation discovered new columns.
pub struct SchemaDrift {
    pub new_columns: u64,
    pub group: String,
}

impl InternalEvent for SchemaDrift {
    fn emit(self) {
        trace!(new_columns = self.new_columns, group = %self.group, "Schema drift");
        counter!("tributary_new_columns_total", "group" => self.group).increment(self.new_columns);
    }
}
