//! Snapshot undo/redo stack.
//!
//! Every change to the local stroke set records a full snapshot. The stack
//! starts with one empty baseline so the first stroke is undoable, holds at
//! most [`HISTORY_LIMIT`] snapshots, and drops any redo branch when a new
//! snapshot is recorded after an undo.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use protocol::DrawingStroke;

use crate::consts::HISTORY_LIMIT;

/// Result of stepping backward.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoStep {
    /// Snapshot to restore.
    pub strokes: Vec<DrawingStroke>,
    /// Strokes present before the step and absent after it, by position.
    pub removed: Vec<DrawingStroke>,
    /// Index of the restored snapshot.
    pub index: usize,
}

/// Result of stepping forward.
#[derive(Debug, Clone, PartialEq)]
pub struct RedoStep {
    pub strokes: Vec<DrawingStroke>,
    /// Strokes appended by the step, by position.
    pub restored: Vec<DrawingStroke>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    snapshots: Vec<Vec<DrawingStroke>>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self { snapshots: vec![Vec::new()], index: 0 }
    }

    /// Discard all snapshots and start over from `baseline`.
    pub fn reset(&mut self, baseline: &[DrawingStroke]) {
        self.snapshots = vec![baseline.to_vec()];
        self.index = 0;
    }

    /// Record the current stroke list as the newest snapshot.
    pub fn record(&mut self, strokes: &[DrawingStroke]) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(strokes.to_vec());
        if self.snapshots.len() > HISTORY_LIMIT {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<UndoStep> {
        if !self.can_undo() {
            return None;
        }
        let previous_len = self.snapshots[self.index].len();
        self.index -= 1;
        let strokes = self.snapshots[self.index].clone();
        let removed = self.snapshots[self.index + 1]
            .get(strokes.len()..previous_len)
            .map(<[DrawingStroke]>::to_vec)
            .unwrap_or_default();
        Some(UndoStep { strokes, removed, index: self.index })
    }

    pub fn redo(&mut self) -> Option<RedoStep> {
        if !self.can_redo() {
            return None;
        }
        let previous_len = self.snapshots[self.index].len();
        self.index += 1;
        let strokes = self.snapshots[self.index].clone();
        let restored = strokes.get(previous_len..).map(<[DrawingStroke]>::to_vec).unwrap_or_default();
        Some(RedoStep { strokes, restored, index: self.index })
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Number of retained snapshots, baseline included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}
