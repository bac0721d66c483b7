//! Identifier reconciliation and create rollback.
//!
//! When a create confirms, the canonical id has to replace the provisional
//! one in every structure that keyed on it: the record itself, the sparse
//! cell store, the pending write queue, and the active-cell marker. When a
//! create fails, the same set of structures sheds every trace of the
//! provisional record. Both paths leave the session with zero dangling
//! references to the provisional id.

use gridbase_model::RecordId;
use gridbase_protocol::{ColumnRecord, RowRecord};

use crate::session::TableSession;

impl TableSession {
    /// Swap a provisional row id for the canonical one the server minted.
    /// Returns false (and logs) if the provisional row is no longer
    /// present, which indicates a session-logic bug rather than a remote
    /// condition.
    pub(crate) fn reconcile_row(&mut self, provisional: &RecordId, record: &RowRecord) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| &r.id == provisional) else {
            log::error!(
                "Row create confirmed for {} but no matching provisional row exists",
                provisional
            );
            return false;
        };

        let canonical = RecordId::canonical(&record.id);
        row.id = canonical.clone();
        row.order = record.order;

        self.cells.rekey_row(provisional, &canonical);
        self.batcher.retarget_row(provisional, &canonical);
        if let Some(active) = self.active_cell.as_mut() {
            if &active.row == provisional {
                active.row = canonical;
            }
        }
        true
    }

    /// Column counterpart of [`reconcile_row`](Self::reconcile_row). Also
    /// adopts the server's copy of the label in case it was normalized.
    pub(crate) fn reconcile_column(
        &mut self,
        provisional: &RecordId,
        record: &ColumnRecord,
    ) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| &c.id == provisional) else {
            log::error!(
                "Column create confirmed for {} but no matching provisional column exists",
                provisional
            );
            return false;
        };

        let canonical = RecordId::canonical(&record.id);
        column.id = canonical.clone();
        column.label = record.name.clone();
        column.order = record.order;

        self.cells.rekey_column(provisional, &canonical);
        self.batcher.retarget_column(provisional, &canonical);
        if let Some(active) = self.active_cell.as_mut() {
            if &active.column == provisional {
                active.column = canonical;
            }
        }
        true
    }

    /// Remove a failed optimistic row along with its cells and any queued
    /// writes addressed to it.
    pub(crate) fn rollback_row(&mut self, provisional: &RecordId) {
        self.rows.retain(|r| &r.id != provisional);
        self.cells.remove_where(|addr| &addr.row == provisional);
        self.batcher.cancel_where(|addr| &addr.row == provisional);
        if self
            .active_cell
            .as_ref()
            .is_some_and(|a| &a.row == provisional)
        {
            self.active_cell = None;
        }
    }

    /// Row counterpart — see [`rollback_row`](Self::rollback_row).
    pub(crate) fn rollback_column(&mut self, provisional: &RecordId) {
        self.columns.retain(|c| &c.id != provisional);
        self.cells.remove_where(|addr| &addr.column == provisional);
        self.batcher
            .cancel_where(|addr| &addr.column == provisional);
        if self
            .active_cell
            .as_ref()
            .is_some_and(|a| &a.column == provisional)
        {
            self.active_cell = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use gridbase_model::{CellAddr, CellValue, ColumnType, RecordId};
    use gridbase_protocol::{ColumnRecord, RowRecord};

    use crate::commands::RemoteOutcome;
    use crate::session::{SessionConfig, TableSession};

    fn seeded_session() -> (TableSession, RecordId) {
        let mut session = TableSession::new("tbl_1", SessionConfig::default());
        let column = session.add_column("Name", ColumnType::Text, 1);
        session.apply_outcome(RemoteOutcome::ColumnCreated {
            provisional: column.clone(),
            column: ColumnRecord {
                id: "c1".into(),
                name: "Name".into(),
                column_type: ColumnType::Text,
                order: 1,
                width: None,
            },
        });
        (session, RecordId::canonical("c1"))
    }

    #[test]
    fn test_row_reconciliation_rekeys_cells_and_pending_writes() {
        let (mut session, column) = seeded_session();
        let provisional = session.add_row(1);
        let now = Instant::now();

        session.write_cell(&provisional, &column, "Alice", now);
        session.set_active_cell(Some(CellAddr::new(provisional.clone(), column.clone())));

        session.apply_outcome(RemoteOutcome::RowCreated {
            provisional: provisional.clone(),
            row: RowRecord {
                id: "row_42".into(),
                order: 1,
            },
        });

        let canonical = RecordId::canonical("row_42");
        let addr = CellAddr::new(canonical.clone(), column.clone());

        // No structure still references the provisional id.
        assert!(session.rows().iter().all(|r| r.id != provisional));
        assert_eq!(session.cell_value(&addr), CellValue::Text("Alice".into()));
        assert_eq!(session.active_cell(), Some(&addr));
        assert_eq!(session.pending_writes(), 1);
        assert_eq!(session.structural_in_flight(), 0);
    }

    #[test]
    fn test_row_rollback_restores_prior_state() {
        let (mut session, column) = seeded_session();
        let now = Instant::now();

        let provisional = session.add_row(1);
        session.write_cell(&provisional, &column, "doomed", now);
        session.set_active_cell(Some(CellAddr::new(provisional.clone(), column.clone())));

        session.apply_outcome(RemoteOutcome::RowCreateFailed {
            provisional: provisional.clone(),
            error: "boom".into(),
        });

        assert!(session.rows().is_empty());
        assert_eq!(session.pending_writes(), 0);
        assert!(session.active_cell().is_none());
        assert_eq!(session.structural_in_flight(), 0);
        assert!(session.cells().is_empty());
    }

    #[test]
    fn test_column_reconciliation_adopts_server_label() {
        let mut session = TableSession::new("tbl_1", SessionConfig::default());
        let provisional = session.add_column("  Name  ", ColumnType::Text, 1);

        session.apply_outcome(RemoteOutcome::ColumnCreated {
            provisional,
            column: ColumnRecord {
                id: "c9".into(),
                name: "Name".into(),
                column_type: ColumnType::Text,
                order: 1,
                width: None,
            },
        });

        assert_eq!(session.columns().len(), 1);
        assert_eq!(session.columns()[0].label, "Name");
        assert!(!session.columns()[0].is_provisional());
    }

    #[test]
    fn test_column_rollback_drops_cells_under_it() {
        let (mut session, canonical_col) = seeded_session();
        let row = session.add_row(1);
        session.apply_outcome(RemoteOutcome::RowCreated {
            provisional: row,
            row: RowRecord {
                id: "r1".into(),
                order: 1,
            },
        });
        let row = RecordId::canonical("r1");
        let now = Instant::now();

        let doomed = session.add_column("Extra", ColumnType::Text, 2);
        session.write_cell(&row, &doomed, "lost", now);
        session.write_cell(&row, &canonical_col, "kept", now);

        session.apply_outcome(RemoteOutcome::ColumnCreateFailed {
            provisional: doomed,
            error: "boom".into(),
        });

        assert_eq!(session.columns().len(), 1);
        assert_eq!(session.pending_writes(), 1);
        assert_eq!(
            session.cell_value(&CellAddr::new(row, canonical_col)),
            CellValue::Text("kept".into())
        );
    }
}
