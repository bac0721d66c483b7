//! Write batching - coalesce keystroke-level cell edits into one upsert.
//!
//! Each address holds at most one pending value (last write wins). Every
//! enqueue re-arms a debounce deadline; once the deadline passes and no
//! structural mutation is in flight, the session drains the whole queue
//! into a single batched upsert command. The batcher never talks to the
//! network itself — it only answers "what is pending" and "is it due".

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use gridbase_model::{CellAddr, CellValue, RecordId};

/// Debounce window between the last edit and a flush. Matches the 500 ms
/// coalescing window used for cloud saves.
pub const DEFAULT_FLUSH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct WriteBatcher {
    pending: FxHashMap<CellAddr, CellValue>,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl WriteBatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: FxHashMap::default(),
            deadline: None,
            debounce,
        }
    }

    /// Upsert a pending write. A second write to the same address replaces
    /// the first; the debounce deadline restarts from `now` either way.
    pub fn enqueue(&mut self, addr: CellAddr, value: CellValue, now: Instant) {
        self.pending.insert(addr, value);
        self.deadline = Some(now + self.debounce);
    }

    /// True once the debounce window has elapsed with writes still queued.
    pub fn is_due(&self, now: Instant) -> bool {
        !self.pending.is_empty() && self.deadline.is_some_and(|d| now >= d)
    }

    /// Drain everything queued, disarming the deadline. The caller sends
    /// the result as one batched upsert.
    pub fn take_batch(&mut self) -> Vec<(CellAddr, CellValue)> {
        self.deadline = None;
        self.pending.drain().collect()
    }

    /// Drop queued writes matching the predicate — used when the row or
    /// column they reference is being deleted or rolled back.
    pub fn cancel_where<F>(&mut self, mut pred: F)
    where
        F: FnMut(&CellAddr) -> bool,
    {
        self.pending.retain(|addr, _| !pred(addr));
        if self.pending.is_empty() {
            self.deadline = None;
        }
    }

    /// Re-address every queued write whose row id equals `from` so an
    /// in-flight debounced write is neither dropped nor sent with a
    /// dangling provisional id.
    pub fn retarget_row(&mut self, from: &RecordId, to: &RecordId) {
        let affected: Vec<CellAddr> = self
            .pending
            .keys()
            .filter(|addr| &addr.row == from)
            .cloned()
            .collect();

        for addr in affected {
            if let Some(value) = self.pending.remove(&addr) {
                self.pending
                    .insert(CellAddr::new(to.clone(), addr.column), value);
            }
        }
    }

    /// Column-side counterpart of [`retarget_row`](Self::retarget_row).
    pub fn retarget_column(&mut self, from: &RecordId, to: &RecordId) {
        let affected: Vec<CellAddr> = self
            .pending
            .keys()
            .filter(|addr| &addr.column == from)
            .cloned()
            .collect();

        for addr in affected {
            if let Some(value) = self.pending.remove(&addr) {
                self.pending
                    .insert(CellAddr::new(addr.row, to.clone()), value);
            }
        }
    }

    pub fn value_for(&self, addr: &CellAddr) -> Option<&CellValue> {
        self.pending.get(addr)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for WriteBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_DEBOUNCE)
    }
}
