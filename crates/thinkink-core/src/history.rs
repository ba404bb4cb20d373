//! Snapshot-based undo/redo.
//!
//! Callers push the collection as it was *before* a mutation. Undo swaps the
//! live collection for the most recent snapshot; redo swaps it back.

use crate::store::{ElementStore, Snapshot};
use std::collections::VecDeque;

/// Maximum number of undo steps kept by default.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Two bounded stacks of element-collection snapshots.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a pre-mutation snapshot. Clears the redo stack.
    pub fn push_state(&mut self, snapshot: Snapshot) {
        self.past.push_back(snapshot);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Record the store's current collection. Call right before mutating it.
    pub fn record(&mut self, store: &ElementStore) {
        self.push_state(store.snapshot());
    }

    /// Restore the most recent snapshot. Returns false when there is none.
    pub fn undo(&mut self, store: &mut ElementStore) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        self.future.push(store.snapshot());
        store.set_elements(previous);
        log::debug!("undo: {} steps left", self.past.len());
        true
    }

    /// Re-apply the most recently undone state. Returns false when there is none.
    pub fn redo(&mut self, store: &mut ElementStore) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push_back(store.snapshot());
        store.set_elements(next);
        log::debug!("redo: {} steps left", self.future.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop both stacks, e.g. after replacing the document.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
