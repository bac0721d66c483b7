//! Background sync worker.
//!
//! The session is sans-io; this module is the host side of the contract.
//! A worker thread holds the shared session behind one exclusive lock and
//! loops: drain commands with `poll(now)`, execute each over HTTP, feed
//! the outcome back with `apply_outcome`. Commands execute outside the
//! lock so the grid never blocks on the network.
//!
//! Every transport failure becomes a failure outcome, never a panic or a
//! propagated error: the session decides what to do with it (roll back,
//! log, keep local state).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use gridbase_config::Settings;
use gridbase_engine::{RemoteCommand, RemoteOutcome, SessionConfig, TableSession};
use gridbase_model::{CellAddr, CellValue};
use gridbase_protocol::{CellRecord, UpsertCellsRequest};

use crate::client::TableClient;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Build the session tunables from user settings.
pub fn session_config(settings: &Settings) -> SessionConfig {
    SessionConfig {
        flush_debounce: settings.flush_debounce(),
        default_column_width: settings.default_column_width,
    }
}

/// Execute one command against the table API and fold the result into the
/// outcome the session expects. Infallible by construction: errors become
/// failure outcomes.
pub fn execute(client: &TableClient, table_id: &str, command: RemoteCommand) -> RemoteOutcome {
    match command {
        RemoteCommand::CreateRow { provisional, order } => {
            match client.create_row(table_id, order) {
                Ok(row) => RemoteOutcome::RowCreated { provisional, row },
                Err(e) => RemoteOutcome::RowCreateFailed {
                    provisional,
                    error: e.to_string(),
                },
            }
        }
        RemoteCommand::DeleteRow { row_id } => {
            match client.delete_row(table_id, row_id.as_str()) {
                Ok(()) => RemoteOutcome::RowDeleted { row_id },
                Err(e) => RemoteOutcome::RowDeleteFailed {
                    row_id,
                    error: e.to_string(),
                },
            }
        }
        RemoteCommand::CreateColumn {
            provisional,
            label,
            column_type,
            order,
        } => match client.create_column(table_id, &label, column_type, order) {
            Ok(column) => RemoteOutcome::ColumnCreated {
                provisional,
                column,
            },
            Err(e) => RemoteOutcome::ColumnCreateFailed {
                provisional,
                error: e.to_string(),
            },
        },
        RemoteCommand::DeleteColumn { column_id } => {
            match client.delete_column(table_id, column_id.as_str()) {
                Ok(()) => RemoteOutcome::ColumnDeleted { column_id },
                Err(e) => RemoteOutcome::ColumnDeleteFailed {
                    column_id,
                    error: e.to_string(),
                },
            }
        }
        RemoteCommand::RenameColumn {
            column_id,
            new_label,
        } => match client.rename_column(table_id, column_id.as_str(), &new_label) {
            Ok(column) => RemoteOutcome::ColumnRenamed { column_id, column },
            Err(e) => RemoteOutcome::ColumnRenameFailed {
                column_id,
                error: e.to_string(),
            },
        },
        RemoteCommand::UpsertCells { writes } => {
            let request = UpsertCellsRequest {
                writes: writes.iter().map(to_cell_record).collect(),
            };
            match client.upsert_cells(table_id, &request) {
                Ok(response) => RemoteOutcome::CellsUpserted {
                    updated_count: response.updated_count,
                },
                Err(e) => RemoteOutcome::CellsUpsertFailed {
                    error: e.to_string(),
                },
            }
        }
    }
}

/// Cells go over the wire as strings in display form; the server stores
/// them verbatim and the next snapshot re-coerces against the column type.
fn to_cell_record((addr, value): &(CellAddr, CellValue)) -> CellRecord {
    CellRecord {
        row_id: addr.row.as_str().to_string(),
        column_id: addr.column.as_str().to_string(),
        value: value.display(),
    }
}

/// Owns the polling loop over a shared session.
pub struct SyncWorker {
    session: Arc<Mutex<TableSession>>,
    client: TableClient,
    poll_interval: Duration,
}

/// Handle to a spawned worker thread. `shutdown` flushes pending writes
/// before the thread exits.
pub struct SyncHandle {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl SyncHandle {
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.thread.join().is_err() {
            log::error!("Sync worker thread panicked during shutdown");
        }
    }
}

impl SyncWorker {
    pub fn new(session: Arc<Mutex<TableSession>>, client: TableClient) -> Self {
        Self {
            session,
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// One worker iteration: drain ready commands, execute them, apply the
    /// outcomes. Returns the number of commands executed. The lock is not
    /// held across network calls.
    pub fn pump(&self) -> usize {
        let (table_id, commands) = {
            let mut session = self.lock_session();
            (session.table_id().to_string(), session.poll(Instant::now()))
        };

        let executed = commands.len();
        for command in commands {
            let outcome = execute(&self.client, &table_id, command);
            self.lock_session().apply_outcome(outcome);
        }
        executed
    }

    /// Drain any still-queued writes, debounce ignored. Best effort: a
    /// failure here is logged by the session and dropped.
    pub fn flush(&self) {
        let (table_id, command) = {
            let mut session = self.lock_session();
            (session.table_id().to_string(), session.flush_on_teardown())
        };

        if let Some(command) = command {
            let outcome = execute(&self.client, &table_id, command);
            self.lock_session().apply_outcome(outcome);
        }
    }

    /// Run the pump loop on a background thread until the handle is shut
    /// down. Teardown performs one final unconditional flush.
    pub fn spawn(self) -> SyncHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::spawn(move || {
            log::debug!("Sync worker started");
            while !stop_flag.load(Ordering::Relaxed) {
                if self.pump() == 0 {
                    thread::sleep(self.poll_interval);
                }
            }
            self.pump();
            self.flush();
            log::debug!("Sync worker stopped");
        });

        SyncHandle { stop, thread }
    }

    // A poisoned lock only means another thread panicked mid-mutation;
    // the session itself has no invariants that survive only on the
    // happy path, so keep going with the inner value.
    fn lock_session(&self) -> MutexGuard<'_, TableSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
