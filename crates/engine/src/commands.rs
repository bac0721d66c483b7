//! Outbound commands and inbound outcomes.
//!
//! The session never performs I/O. Mutations queue a `RemoteCommand`; the
//! host drains the queue, executes each command against the table API, and
//! reports back with the matching `RemoteOutcome` variant. Every command
//! that increments the structural in-flight counter has exactly one
//! success and one failure outcome that decrements it.

use gridbase_model::{CellAddr, CellValue, ColumnType, RecordId};
use gridbase_protocol::{ColumnRecord, RowRecord};

/// A remote operation the session wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    CreateRow {
        provisional: RecordId,
        order: i64,
    },
    DeleteRow {
        row_id: RecordId,
    },
    CreateColumn {
        provisional: RecordId,
        label: String,
        column_type: ColumnType,
        order: i64,
    },
    DeleteColumn {
        column_id: RecordId,
    },
    RenameColumn {
        column_id: RecordId,
        new_label: String,
    },
    /// One debounced flush: the entire pending queue, coalesced.
    UpsertCells {
        writes: Vec<(CellAddr, CellValue)>,
    },
}

/// The result of an executed [`RemoteCommand`].
///
/// Failure variants carry a display string rather than a transport error
/// type: by the time an outcome reaches the session, the only thing left
/// to do with a failure is log it (create failures additionally roll the
/// optimistic record back out).
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    RowCreated {
        provisional: RecordId,
        row: RowRecord,
    },
    RowCreateFailed {
        provisional: RecordId,
        error: String,
    },
    RowDeleted {
        row_id: RecordId,
    },
    RowDeleteFailed {
        row_id: RecordId,
        error: String,
    },
    ColumnCreated {
        provisional: RecordId,
        column: ColumnRecord,
    },
    ColumnCreateFailed {
        provisional: RecordId,
        error: String,
    },
    ColumnDeleted {
        column_id: RecordId,
    },
    ColumnDeleteFailed {
        column_id: RecordId,
        error: String,
    },
    ColumnRenamed {
        column_id: RecordId,
        column: ColumnRecord,
    },
    ColumnRenameFailed {
        column_id: RecordId,
        error: String,
    },
    CellsUpserted {
        updated_count: i64,
    },
    CellsUpsertFailed {
        error: String,
    },
}
