use serde::{Deserialize, Serialize};

/// Column value typing. Fixed at column creation; there is no migration
/// operation, so a column's type never changes after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Coerce raw user input against the column's type.
    ///
    /// Returns `None` when a Number column receives something that does not
    /// parse — the caller treats that as a rejected write (full no-op).
    /// Blank input is always valid and maps to `Empty`.
    pub fn coerce(input: &str, column_type: ColumnType) -> Option<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Some(CellValue::Empty);
        }

        match column_type {
            ColumnType::Number => trimmed.parse::<f64>().ok().map(CellValue::Number),
            ColumnType::Text => Some(CellValue::Text(trimmed.to_string())),
        }
    }

    /// Display text. Empty renders as "" — indistinguishable from an
    /// absent cell. Integral numbers render without a fraction.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}
