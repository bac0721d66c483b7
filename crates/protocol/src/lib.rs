//! Gridbase Table API — wire types.
//!
//! This crate defines the request/response shapes for the remote table
//! store. The wire format is JSON with camelCase field names, matching the
//! hub's API exactly; every type here round-trips through serde without
//! loss. Keep this crate free of behavior — it is shapes only.
//!
//! Endpoints served with these shapes:
//!
//! | Operation      | Route                                            |
//! |----------------|--------------------------------------------------|
//! | snapshot       | `GET    /api/tables/{tableId}`                   |
//! | create row     | `POST   /api/tables/{tableId}/rows`              |
//! | delete row     | `DELETE /api/tables/{tableId}/rows/{rowId}`      |
//! | create column  | `POST   /api/tables/{tableId}/columns`           |
//! | delete column  | `DELETE /api/tables/{tableId}/columns/{colId}`   |
//! | rename column  | `PATCH  /api/tables/{tableId}/columns/{colId}`   |
//! | upsert cells   | `POST   /api/tables/{tableId}/cells`             |

use serde::{Deserialize, Serialize};

use gridbase_model::ColumnType;

// =============================================================================
// Canonical records (server → client)
// =============================================================================

/// A row as the remote store knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub id: String,
    pub order: i64,
}

/// A column as the remote store knows it. The server calls the label
/// `name`; the client maps it onto `Column::label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub id: String,
    pub name: String,
    pub column_type: ColumnType,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

/// One stored cell. Values travel as strings; Number columns are coerced
/// client-side before they get here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub row_id: String,
    pub column_id: String,
    pub value: String,
}

/// Initial table read: rows ordered by `order`, columns ordered by
/// `order`, plus every non-empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub rows: Vec<RowRecord>,
    pub columns: Vec<ColumnRecord>,
    pub cells: Vec<CellRecord>,
}

// =============================================================================
// Request bodies (client → server)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRowRequest {
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnRequest {
    pub label: String,
    pub column_type: ColumnType,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameColumnRequest {
    pub new_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCellsRequest {
    pub writes: Vec<CellRecord>,
}

/// Batched upsert result. Entries referencing a nonexistent row or column
/// are silently skipped server-side, so `updated_count` may be less than
/// the number of writes sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCellsResponse {
    pub updated_count: i64,
}
