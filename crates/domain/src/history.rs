//! Snapshot history with undo/redo.
//!
//! A sequence of deep copies plus a pointer to the current one. Taking a
//! snapshot after a revert discards everything past the pointer, so an
//! abandoned branch is never reachable again.

/// Default cap on stored snapshots.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Where the pointer sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// No snapshots
    Empty,
    /// Pointer at the newest snapshot
    AtHead,
    /// Pointer somewhere before the newest snapshot
    Mid,
}

/// Result of `revert` / `forward`.
#[derive(Debug, PartialEq, Eq)]
pub enum HistoryStep<'a, T> {
    /// Pointer moved; restore this snapshot
    Restored(&'a T),
    /// Nothing to undo / redo; pointer unchanged
    AtBoundary,
}

impl<T> HistoryStep<'_, T> {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored(_))
    }
}

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    pointer: Option<usize>,
    max_entries: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl<T: Clone> History<T> {
    /// Empty history keeping at most `max_entries` snapshots (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            pointer: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn state(&self) -> HistoryState {
        match self.pointer {
            None => HistoryState::Empty,
            Some(p) if p + 1 == self.entries.len() => HistoryState::AtHead,
            Some(_) => HistoryState::Mid,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    /// Snapshot at the pointer.
    pub fn current(&self) -> Option<&T> {
        self.pointer.and_then(|p| self.entries.get(p))
    }

    pub fn can_revert(&self) -> bool {
        self.pointer.is_some_and(|p| p > 0)
    }

    pub fn can_forward(&self) -> bool {
        self.pointer.is_some_and(|p| p + 1 < self.entries.len())
    }

    /// Store a copy of `state` after the pointer, dropping any redo branch.
    ///
    /// When the cap is exceeded the oldest snapshot is dropped.
    pub fn snapshot(&mut self, state: &T) {
        let keep = self.pointer.map_or(0, |p| p + 1);
        self.entries.truncate(keep);
        self.entries.push(state.clone());
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
        self.pointer = Some(self.entries.len() - 1);
    }

    /// Step back one snapshot.
    pub fn revert(&mut self) -> HistoryStep<'_, T> {
        match self.pointer {
            Some(p) if p > 0 => {
                self.pointer = Some(p - 1);
                HistoryStep::Restored(&self.entries[p - 1])
            }
            _ => HistoryStep::AtBoundary,
        }
    }

    /// Step forward one snapshot.
    pub fn forward(&mut self) -> HistoryStep<'_, T> {
        match self.pointer {
            Some(p) if p + 1 < self.entries.len() => {
                self.pointer = Some(p + 1);
                HistoryStep::Restored(&self.entries[p + 1])
            }
            _ => HistoryStep::AtBoundary,
        }
    }

    /// Drop all snapshots and start again from `state`.
    pub fn reset_with(&mut self, state: &T) {
        self.clear();
        self.snapshot(state);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = None;
    }
}
