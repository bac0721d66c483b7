use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a row or column.
///
/// A record created locally carries a `Provisional` token until the remote
/// store confirms the create and assigns the authoritative id. The
/// provisional → canonical transition happens exactly once, during
/// reconciliation; nothing ever goes the other way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordId {
    /// Locally minted placeholder, unknown to the remote store.
    Provisional(String),
    /// Authoritative id assigned by the remote store.
    Canonical(String),
}

impl RecordId {
    /// Mint a fresh provisional id for an optimistic create.
    pub fn mint_provisional() -> Self {
        RecordId::Provisional(Uuid::new_v4().to_string())
    }

    /// Wrap an id the remote store already knows about.
    pub fn canonical(id: impl Into<String>) -> Self {
        RecordId::Canonical(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, RecordId::Provisional(_))
    }

    /// The raw id string, whichever side minted it.
    pub fn as_str(&self) -> &str {
        match self {
            RecordId::Provisional(s) | RecordId::Canonical(s) => s,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
