//! Undo/redo history of whole graph snapshots
//!
//! The editor records the snapshot taken *before* each mutation. Undo swaps
//! the current snapshot for the last recorded one; redo swaps it back.
//! A new recording clears the redo stack.

use std::collections::VecDeque;

use tracing::trace;

use crate::graph::GraphSnapshot;

/// Bounded undo/redo stacks
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<GraphSnapshot>,
    redo: Vec<GraphSnapshot>,
    limit: usize,
}

impl History {
    /// Create a history keeping at most `limit` undo steps (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the snapshot preceding a mutation
    pub fn record(&mut self, before: GraphSnapshot) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back: returns the snapshot to restore, keeping `current` for redo
    pub fn undo(&mut self, current: &GraphSnapshot) -> Option<GraphSnapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        trace!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        Some(previous)
    }

    /// Step forward: returns the snapshot to restore, keeping `current` for undo
    pub fn redo(&mut self, current: &GraphSnapshot) -> Option<GraphSnapshot> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        trace!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn push_undo(&mut self, snapshot: GraphSnapshot) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
