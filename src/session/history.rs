//! Per-page undo/redo of committed strokes
//!
//! Only drawing paths are covered. Each entry is a full snapshot of the
//! page's path list; snapshots share storage through `Arc`, so pushing one
//! is a reference-count bump rather than a copy.

use std::sync::Arc;

use crate::domain::DrawingPath;

pub type PathList = Arc<Vec<DrawingPath>>;

#[derive(Clone, Debug, Default)]
pub struct PathHistory {
    undo: Vec<PathList>,
    redo: Vec<PathList>,
}

impl PathHistory {
    /// Append `path` to `current`, recording the pre-commit list as the
    /// state to return to and invalidating any redo entries
    pub fn commit(&mut self, current: &mut PathList, path: DrawingPath) {
        self.undo.push(Arc::clone(current));
        // The snapshot above holds a second reference, so this copies
        // instead of mutating the list the snapshot points at.
        Arc::make_mut(current).push(path);
        self.redo.clear();
    }

    /// Restore the most recent snapshot. Returns false if there is none.
    pub fn undo(&mut self, current: &mut PathList) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    /// Re-apply the most recently undone state. Returns false if there is none.
    pub fn redo(&mut self, current: &mut PathList) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push(std::mem::replace(current, next));
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
