use rustc_hash::FxHashMap;

use crate::address::CellAddr;
use crate::id::RecordId;
use crate::value::CellValue;

/// Sparse cell storage keyed by address.
///
/// Absence and `Empty` are both valid "no value" states and render
/// identically; callers must not rely on an entry existing. The store does
/// no type validation — coercion happens before values get here.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: FxHashMap<CellAddr, CellValue>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, addr: &CellAddr) -> Option<&CellValue> {
        self.cells.get(addr)
    }

    /// Resolved value: missing entries read as `Empty`.
    pub fn value(&self, addr: &CellAddr) -> CellValue {
        self.cells.get(addr).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, addr: CellAddr, value: CellValue) {
        self.cells.insert(addr, value);
    }

    pub fn remove(&mut self, addr: &CellAddr) -> Option<CellValue> {
        self.cells.remove(addr)
    }

    /// Remove every cell whose address matches the predicate. Used for
    /// cascading row/column deletes and provisional-id rollback.
    pub fn remove_where<F>(&mut self, mut pred: F)
    where
        F: FnMut(&CellAddr) -> bool,
    {
        self.cells.retain(|addr, _| !pred(addr));
    }

    /// Rewrite every address whose row id equals `from` to use `to`,
    /// preserving values. Part of the atomic reconciliation step.
    pub fn rekey_row(&mut self, from: &RecordId, to: &RecordId) {
        let affected: Vec<CellAddr> = self
            .cells
            .keys()
            .filter(|addr| &addr.row == from)
            .cloned()
            .collect();

        for addr in affected {
            if let Some(value) = self.cells.remove(&addr) {
                self.cells
                    .insert(CellAddr::new(to.clone(), addr.column), value);
            }
        }
    }

    /// Column-side counterpart of [`rekey_row`](Self::rekey_row).
    pub fn rekey_column(&mut self, from: &RecordId, to: &RecordId) {
        let affected: Vec<CellAddr> = self
            .cells
            .keys()
            .filter(|addr| &addr.column == from)
            .cloned()
            .collect();

        for addr in affected {
            if let Some(value) = self.cells.remove(&addr) {
                self.cells.insert(CellAddr::new(addr.row, to.clone()), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellAddr, &CellValue)> {
        self.cells.iter()
    }
}
