//! Optimistic mutation core for a remote-backed table.
//!
//! The [`TableSession`](session::TableSession) owns all grid state (rows,
//! columns, sparse cells, pending writes) and applies every edit locally
//! the moment the user makes it. Persistence is sans-io: mutation entry
//! points queue [`RemoteCommand`](commands::RemoteCommand)s, the host
//! drains them with `poll(now)`, runs them over whatever transport it has,
//! and feeds [`RemoteOutcome`](commands::RemoteOutcome)s back through
//! `apply_outcome`. Confirmation swaps provisional ids for canonical ones;
//! failure rolls the optimistic create back out.
//!
//! The session is single-threaded by design. A multi-threaded host wraps
//! it in one exclusive lock; no finer-grained locking exists or is needed.

pub mod batcher;
pub mod commands;
pub mod reconcile;
pub mod session;
pub mod view;

pub use batcher::WriteBatcher;
pub use commands::{RemoteCommand, RemoteOutcome};
pub use session::{SessionConfig, TableSession};
pub use view::{derive, TableView, ViewRow};
