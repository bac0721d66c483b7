//! Transport for the optimistic session: a blocking HTTP client for the
//! table API plus the background worker that pumps commands between a
//! shared [`TableSession`](gridbase_engine::TableSession) and the server.

pub mod client;
pub mod sync;

pub use client::{ApiError, TableClient};
pub use sync::{execute, session_config, SyncWorker};
