//! Bounded, pointer-addressed undo/redo history.
//!
//! The history is a linear list of snapshots with a pointer at the current
//! state. Pushing after an undo discards the redo branch; once the list
//! exceeds its limit the oldest entry is evicted. Undo and redo only move the
//! pointer and never touch the stored snapshots.

use std::collections::VecDeque;
use tc_core::Snapshot;

#[derive(Debug, Clone)]
pub struct HistoryStack<S = Snapshot> {
    entries: VecDeque<S>,
    /// Index of the current state. Meaningless while `entries` is empty.
    pointer: usize,
    /// Maximum number of entries.
    limit: usize,
}

impl<S> HistoryStack<S> {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            pointer: 0,
            limit,
        }
    }

    /// Record a new current state.
    pub fn push(&mut self, snapshot: S) {
        if !self.entries.is_empty() {
            // Discard the redo branch.
            self.entries.truncate(self.pointer + 1);
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.pointer = self.entries.len() - 1;
        log::debug!("history push -> {}/{}", self.pointer + 1, self.entries.len());
    }

    /// The state `undo` would move to, without moving.
    pub fn peek_undo(&self) -> Option<&S> {
        if self.can_undo() {
            self.entries.get(self.pointer - 1)
        } else {
            None
        }
    }

    /// The state `redo` would move to, without moving.
    pub fn peek_redo(&self) -> Option<&S> {
        if self.can_redo() {
            self.entries.get(self.pointer + 1)
        } else {
            None
        }
    }

    /// Step back. `None` when already at the oldest state.
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.pointer -= 1;
        log::debug!("history undo -> {}/{}", self.pointer + 1, self.entries.len());
        self.entries.get(self.pointer)
    }

    /// Step forward. `None` when already at the newest state.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.pointer += 1;
        log::debug!("history redo -> {}/{}", self.pointer + 1, self.entries.len());
        self.entries.get(self.pointer)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.pointer)
    }

    /// Position of the current state, or `None` while empty.
    pub fn pointer(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.pointer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> + '_ {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = 0;
    }
}
