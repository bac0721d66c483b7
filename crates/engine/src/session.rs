//! The table session: one owned state container for the whole grid.
//!
//! Every mutation entry point follows the same optimistic shape:
//!
//! ```text
//! Idle -> Optimistic -> { Confirmed | RolledBack }
//! ```
//!
//! The local change applies synchronously (provisional id minted for
//! creates, records removed for deletes), a [`RemoteCommand`] is queued,
//! and the structural in-flight counter goes up. When the host reports the
//! outcome, creates reconcile or roll back, deletes confirm or log, and
//! the counter comes back down. Cell-write flushes are gated on that
//! counter so a batched upsert can never interleave with a structural
//! mutation that would invalidate a foreign key the batch refers to.
//!
//! Remote failures never propagate out of `apply_outcome` — they are
//! logged and (for creates) rolled back. Staleness is preferred over a
//! broken grid.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use gridbase_model::{
    CellAddr, CellStore, CellValue, Column, ColumnType, RecordId, Row, DEFAULT_COLUMN_WIDTH,
};
use gridbase_protocol::TableSnapshot;

use crate::batcher::{WriteBatcher, DEFAULT_FLUSH_DEBOUNCE};
use crate::commands::{RemoteCommand, RemoteOutcome};
use crate::view::{derive, TableView};

/// Tunables the host wires in from settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity window before queued cell writes flush.
    pub flush_debounce: Duration,
    /// Width assigned to locally created columns.
    pub default_column_width: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_debounce: DEFAULT_FLUSH_DEBOUNCE,
            default_column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

pub struct TableSession {
    table_id: String,
    pub(crate) rows: Vec<Row>,
    pub(crate) columns: Vec<Column>,
    pub(crate) cells: CellStore,
    pub(crate) active_cell: Option<CellAddr>,
    search: String,
    pub(crate) batcher: WriteBatcher,
    /// Count of structural mutations awaiting an outcome. Flush is
    /// permitted only at zero; the counter nests across concurrent
    /// mutations.
    structural_in_flight: u32,
    outbox: VecDeque<RemoteCommand>,
    default_column_width: f32,
}

impl TableSession {
    /// Create an empty session (no rows, no columns).
    pub fn new(table_id: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            table_id: table_id.into(),
            rows: Vec::new(),
            columns: Vec::new(),
            cells: CellStore::new(),
            active_cell: None,
            search: String::new(),
            batcher: WriteBatcher::new(config.flush_debounce),
            structural_in_flight: 0,
            outbox: VecDeque::new(),
            default_column_width: config.default_column_width,
        }
    }

    /// Seed a session from an initial server read. Everything in the
    /// snapshot is canonical; cells that fail type coercion (bad server
    /// data) are skipped with a warning rather than poisoning the load.
    pub fn from_snapshot(
        table_id: impl Into<String>,
        snapshot: &TableSnapshot,
        config: SessionConfig,
    ) -> Self {
        let mut session = Self::new(table_id, config);

        for row in &snapshot.rows {
            session.rows.push(Row {
                id: RecordId::canonical(&row.id),
                order: row.order,
            });
        }

        for column in &snapshot.columns {
            session.columns.push(Column {
                id: RecordId::canonical(&column.id),
                label: column.name.clone(),
                order: column.order,
                column_type: column.column_type,
                width: column.width.unwrap_or(session.default_column_width),
            });
        }

        for cell in &snapshot.cells {
            let column_type = match session
                .columns
                .iter()
                .find(|c| c.id.as_str() == cell.column_id)
            {
                Some(c) => c.column_type,
                None => {
                    log::warn!(
                        "Snapshot cell {}:{} references unknown column; skipped",
                        cell.row_id,
                        cell.column_id
                    );
                    continue;
                }
            };
            match CellValue::coerce(&cell.value, column_type) {
                Some(value) if !value.is_empty() => {
                    session.cells.set(
                        CellAddr::new(
                            RecordId::canonical(&cell.row_id),
                            RecordId::canonical(&cell.column_id),
                        ),
                        value,
                    );
                }
                Some(_) => {} // empty cells need no entry
                None => {
                    log::warn!(
                        "Snapshot cell {}:{} value {:?} fails type coercion; skipped",
                        cell.row_id,
                        cell.column_id,
                        cell.value
                    );
                }
            }
        }

        session
    }

    // ── Read accessors ──────────────────────────────────────────────

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    /// Resolved cell value (missing entries read as `Empty`).
    pub fn cell_value(&self, addr: &CellAddr) -> CellValue {
        self.cells.value(addr)
    }

    pub fn active_cell(&self) -> Option<&CellAddr> {
        self.active_cell.as_ref()
    }

    pub fn set_active_cell(&mut self, addr: Option<CellAddr>) {
        self.active_cell = addr;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// The display-ready projection: rows sorted and filtered, columns
    /// ordered, every cell resolved. Recomputed from scratch on each call.
    pub fn view(&self) -> TableView {
        derive(&self.rows, &self.columns, &self.cells, &self.search)
    }

    /// Conventional order value for the next appended row.
    pub fn next_row_order(&self) -> i64 {
        self.rows.len() as i64 + 1
    }

    /// Conventional order value for the next appended column.
    pub fn next_column_order(&self) -> i64 {
        self.columns.len() as i64 + 1
    }

    pub fn structural_in_flight(&self) -> u32 {
        self.structural_in_flight
    }

    pub fn pending_writes(&self) -> usize {
        self.batcher.len()
    }

    // ── Cell writes ─────────────────────────────────────────────────

    /// Apply a cell edit: coerce against the column type, store the value
    /// optimistically, and queue it for the next debounced flush.
    ///
    /// Returns false (a full no-op — neither the store nor the queue is
    /// touched) when the row or column does not exist, or when a Number
    /// column rejects the input.
    pub fn write_cell(
        &mut self,
        row_id: &RecordId,
        column_id: &RecordId,
        input: &str,
        now: Instant,
    ) -> bool {
        if !self.rows.iter().any(|r| &r.id == row_id) {
            return false;
        }
        let Some(column) = self.columns.iter().find(|c| &c.id == column_id) else {
            return false;
        };
        let Some(value) = CellValue::coerce(input, column.column_type) else {
            return false;
        };

        let addr = CellAddr::new(row_id.clone(), column_id.clone());
        self.cells.set(addr.clone(), value.clone());
        self.batcher.enqueue(addr, value, now);
        true
    }

    // ── Structural mutations ────────────────────────────────────────

    /// Optimistically append a row and queue its remote create.
    pub fn add_row(&mut self, order: i64) -> RecordId {
        let id = RecordId::mint_provisional();
        self.rows.push(Row {
            id: id.clone(),
            order,
        });
        self.begin_structural();
        self.outbox.push_back(RemoteCommand::CreateRow {
            provisional: id.clone(),
            order,
        });
        id
    }

    /// Optimistically remove a row, its cells, and its queued writes.
    ///
    /// Rows whose create is still in flight cannot be deleted — the remote
    /// store does not know the provisional id yet. Logged no-op.
    pub fn delete_row(&mut self, row_id: &RecordId) -> bool {
        let Some(index) = self.rows.iter().position(|r| &r.id == row_id) else {
            return false;
        };
        if self.rows[index].is_provisional() {
            log::warn!("Ignoring delete of row {} while its create is in flight", row_id);
            return false;
        }

        self.rows.remove(index);
        self.cells.remove_where(|addr| &addr.row == row_id);
        self.batcher.cancel_where(|addr| &addr.row == row_id);
        if self.active_cell.as_ref().is_some_and(|a| &a.row == row_id) {
            self.active_cell = None;
        }

        self.begin_structural();
        self.outbox.push_back(RemoteCommand::DeleteRow {
            row_id: row_id.clone(),
        });
        true
    }

    /// Optimistically append a column and queue its remote create.
    pub fn add_column(&mut self, label: &str, column_type: ColumnType, order: i64) -> RecordId {
        let id = RecordId::mint_provisional();
        self.columns.push(Column {
            id: id.clone(),
            label: label.to_string(),
            order,
            column_type,
            width: self.default_column_width,
        });
        self.begin_structural();
        self.outbox.push_back(RemoteCommand::CreateColumn {
            provisional: id.clone(),
            label: label.to_string(),
            column_type,
            order,
        });
        id
    }

    /// Optimistically remove a column, its cells, and its queued writes.
    /// Same provisional guard as [`delete_row`](Self::delete_row).
    pub fn delete_column(&mut self, column_id: &RecordId) -> bool {
        let Some(index) = self.columns.iter().position(|c| &c.id == column_id) else {
            return false;
        };
        if self.columns[index].is_provisional() {
            log::warn!(
                "Ignoring delete of column {} while its create is in flight",
                column_id
            );
            return false;
        }

        self.columns.remove(index);
        self.cells.remove_where(|addr| &addr.column == column_id);
        self.batcher.cancel_where(|addr| &addr.column == column_id);
        if self
            .active_cell
            .as_ref()
            .is_some_and(|a| &a.column == column_id)
        {
            self.active_cell = None;
        }

        self.begin_structural();
        self.outbox.push_back(RemoteCommand::DeleteColumn {
            column_id: column_id.clone(),
        });
        true
    }

    /// Optimistically relabel a column. Rename never changes identity, so
    /// it bypasses reconciliation entirely; a failure keeps the local
    /// label and is logged only.
    pub fn rename_column(&mut self, column_id: &RecordId, new_label: &str) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| &c.id == column_id) else {
            return false;
        };
        if column.is_provisional() {
            log::warn!(
                "Ignoring rename of column {} while its create is in flight",
                column_id
            );
            return false;
        }

        column.label = new_label.to_string();
        self.begin_structural();
        self.outbox.push_back(RemoteCommand::RenameColumn {
            column_id: column_id.clone(),
            new_label: new_label.to_string(),
        });
        true
    }

    // ── Command pump ────────────────────────────────────────────────

    /// Drain everything ready to send: queued structural commands always,
    /// plus one batched `UpsertCells` if the debounce deadline has passed
    /// and no structural mutation is in flight. While the counter is
    /// non-zero the flush stays deferred; a later poll picks it up once
    /// the counter returns to zero.
    pub fn poll(&mut self, now: Instant) -> Vec<RemoteCommand> {
        let mut out: Vec<RemoteCommand> = self.outbox.drain(..).collect();

        if self.structural_in_flight == 0 && self.batcher.is_due(now) {
            out.push(RemoteCommand::UpsertCells {
                writes: self.batcher.take_batch(),
            });
        }

        out
    }

    /// Teardown path: drain the queue immediately, debounce and gating
    /// ignored. Best-effort fire-and-forget — writes still addressed to a
    /// provisional id are silently skipped server-side.
    pub fn flush_on_teardown(&mut self) -> Option<RemoteCommand> {
        if self.batcher.is_empty() {
            return None;
        }
        Some(RemoteCommand::UpsertCells {
            writes: self.batcher.take_batch(),
        })
    }

    /// Feed back the result of an executed command.
    ///
    /// All remote failures are absorbed here: creates roll back, the rest
    /// log and keep local state (delete failures leave local state
    /// diverged from remote — a known, accepted gap). Nothing propagates
    /// to the caller.
    pub fn apply_outcome(&mut self, outcome: RemoteOutcome) {
        match outcome {
            RemoteOutcome::RowCreated { provisional, row } => {
                self.reconcile_row(&provisional, &row);
                self.end_structural();
            }
            RemoteOutcome::RowCreateFailed { provisional, error } => {
                log::error!("Row create failed ({}); rolling back {}", error, provisional);
                self.rollback_row(&provisional);
                self.end_structural();
            }
            RemoteOutcome::RowDeleted { .. } => {
                // Already removed optimistically.
                self.end_structural();
            }
            RemoteOutcome::RowDeleteFailed { row_id, error } => {
                log::error!(
                    "Row delete failed for {} ({}); local state now diverges from remote",
                    row_id,
                    error
                );
                self.end_structural();
            }
            RemoteOutcome::ColumnCreated {
                provisional,
                column,
            } => {
                self.reconcile_column(&provisional, &column);
                self.end_structural();
            }
            RemoteOutcome::ColumnCreateFailed { provisional, error } => {
                log::error!(
                    "Column create failed ({}); rolling back {}",
                    error,
                    provisional
                );
                self.rollback_column(&provisional);
                self.end_structural();
            }
            RemoteOutcome::ColumnDeleted { .. } => {
                self.end_structural();
            }
            RemoteOutcome::ColumnDeleteFailed { column_id, error } => {
                log::error!(
                    "Column delete failed for {} ({}); local state now diverges from remote",
                    column_id,
                    error
                );
                self.end_structural();
            }
            RemoteOutcome::ColumnRenamed { column_id, column } => {
                // Echo the canonical label in case the server normalized it.
                if let Some(local) = self.columns.iter_mut().find(|c| c.id == column_id) {
                    local.label = column.name;
                }
                self.end_structural();
            }
            RemoteOutcome::ColumnRenameFailed { column_id, error } => {
                log::error!(
                    "Column rename failed for {} ({}); keeping optimistic label",
                    column_id,
                    error
                );
                self.end_structural();
            }
            RemoteOutcome::CellsUpserted { updated_count } => {
                log::debug!("Flushed {} cell writes", updated_count);
            }
            RemoteOutcome::CellsUpsertFailed { error } => {
                // Local values stay: the user already typed them, and
                // re-prompting is worse than staleness.
                log::error!("Cell flush failed ({}); local values retained", error);
            }
        }
    }

    fn begin_structural(&mut self) {
        self.structural_in_flight += 1;
    }

    fn end_structural(&mut self) {
        debug_assert!(self.structural_in_flight > 0, "in-flight counter underflow");
        self.structural_in_flight = self.structural_in_flight.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_columns() -> (TableSession, RecordId, RecordId) {
        let mut session = TableSession::new("tbl_1", SessionConfig::default());
        let text_col = RecordId::canonical("c_text");
        let num_col = RecordId::canonical("c_num");
        session.columns.push(Column {
            id: text_col.clone(),
            label: "Name".into(),
            order: 1,
            column_type: ColumnType::Text,
            width: DEFAULT_COLUMN_WIDTH,
        });
        session.columns.push(Column {
            id: num_col.clone(),
            label: "Age".into(),
            order: 2,
            column_type: ColumnType::Number,
            width: DEFAULT_COLUMN_WIDTH,
        });
        session.rows.push(Row {
            id: RecordId::canonical("r1"),
            order: 1,
        });
        (session, text_col, num_col)
    }

    #[test]
    fn test_write_cell_applies_optimistically() {
        let (mut session, text_col, _) = session_with_columns();
        let row = RecordId::canonical("r1");
        let now = Instant::now();

        assert!(session.write_cell(&row, &text_col, "Alice", now));

        let addr = CellAddr::new(row, text_col);
        assert_eq!(session.cell_value(&addr), CellValue::Text("Alice".into()));
        assert_eq!(session.pending_writes(), 1);
    }

    #[test]
    fn test_write_cell_unknown_row_or_column_is_noop() {
        let (mut session, text_col, _) = session_with_columns();
        let now = Instant::now();

        assert!(!session.write_cell(
            &RecordId::canonical("ghost"),
            &text_col,
            "x",
            now
        ));
        assert!(!session.write_cell(
            &RecordId::canonical("r1"),
            &RecordId::canonical("ghost"),
            "x",
            now
        ));
        assert_eq!(session.pending_writes(), 0);
    }

    #[test]
    fn test_add_row_mints_provisional_and_queues_create() {
        let (mut session, _, _) = session_with_columns();
        let order = session.next_row_order();

        let id = session.add_row(order);

        assert!(id.is_provisional());
        assert_eq!(session.structural_in_flight(), 1);
        let commands = session.poll(Instant::now());
        assert_eq!(
            commands,
            vec![RemoteCommand::CreateRow {
                provisional: id,
                order
            }]
        );
    }

    #[test]
    fn test_delete_provisional_row_is_refused() {
        let (mut session, _, _) = session_with_columns();
        let id = session.add_row(2);

        assert!(!session.delete_row(&id));
        // The optimistic row is still there.
        assert!(session.rows().iter().any(|r| r.id == id));
    }

    #[test]
    fn test_delete_row_clears_active_cell() {
        let (mut session, text_col, _) = session_with_columns();
        let row = RecordId::canonical("r1");
        session.set_active_cell(Some(CellAddr::new(row.clone(), text_col)));

        assert!(session.delete_row(&row));
        assert!(session.active_cell().is_none());
    }

    #[test]
    fn test_rename_column_applies_label_before_confirmation() {
        let (mut session, text_col, _) = session_with_columns();

        assert!(session.rename_column(&text_col, "Full name"));
        assert_eq!(session.columns()[0].label, "Full name");
        assert_eq!(session.structural_in_flight(), 1);
    }

    #[test]
    fn test_snapshot_seeds_canonical_state() {
        let snapshot: gridbase_protocol::TableSnapshot = serde_json::from_value(serde_json::json!({
            "rows": [{ "id": "r1", "order": 1 }, { "id": "r2", "order": 2 }],
            "columns": [
                { "id": "c1", "name": "Name", "columnType": "text", "order": 1 },
                { "id": "c2", "name": "Age", "columnType": "number", "order": 2 }
            ],
            "cells": [
                { "rowId": "r1", "columnId": "c1", "value": "Alice" },
                { "rowId": "r1", "columnId": "c2", "value": "42" },
                { "rowId": "r2", "columnId": "c2", "value": "not-a-number" }
            ]
        }))
        .unwrap();

        let session = TableSession::from_snapshot("tbl_1", &snapshot, SessionConfig::default());

        assert_eq!(session.rows().len(), 2);
        assert!(session.rows().iter().all(|r| !r.is_provisional()));
        assert_eq!(
            session.cell_value(&CellAddr::new(
                RecordId::canonical("r1"),
                RecordId::canonical("c2")
            )),
            CellValue::Number(42.0)
        );
        // The uncoercible number cell was skipped, not loaded as text.
        assert_eq!(
            session.cell_value(&CellAddr::new(
                RecordId::canonical("r2"),
                RecordId::canonical("c2")
            )),
            CellValue::Empty
        );
    }
}
