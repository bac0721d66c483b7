use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// The (row, column) pair identifying one cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: RecordId,
    pub column: RecordId,
}

impl CellAddr {
    pub fn new(row: RecordId, column: RecordId) -> Self {
        Self { row, column }
    }

    /// Composite `"rowId:columnId"` key, used on the wire and in
    /// diagnostics. Ids are uuid/cuid tokens and never contain `:`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.row.as_str(), self.column.as_str())
    }

    /// Parse a composite key back into an address. Only canonical ids
    /// travel in encoded form, so both halves come back `Canonical`.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split(':');
        let row = parts.next()?;
        let column = parts.next()?;
        if row.is_empty() || column.is_empty() || parts.next().is_some() {
            return None;
        }
        Some(Self::new(RecordId::canonical(row), RecordId::canonical(column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parse_roundtrip() {
        let addr = CellAddr::new(RecordId::canonical("r1"), RecordId::canonical("c1"));
        assert_eq!(addr.encode(), "r1:c1");
        assert_eq!(CellAddr::parse("r1:c1"), Some(addr));
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert_eq!(CellAddr::parse("r1"), None);
        assert_eq!(CellAddr::parse("r1:c1:extra"), None);
        assert_eq!(CellAddr::parse(":c1"), None);
        assert_eq!(CellAddr::parse("r1:"), None);
    }
}
