use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::value::ColumnType;

/// Fallback width when neither the server record nor settings supply one.
pub const DEFAULT_COLUMN_WIDTH: f32 = 150.0;

/// A table row. `order` defines display order; values need not be
/// contiguous and gaps left by deletes are never renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RecordId,
    pub order: i64,
}

impl Row {
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// A table column. `column_type` is immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: RecordId,
    pub label: String,
    pub order: i64,
    pub column_type: ColumnType,
    pub width: f32,
}

impl Column {
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}
