use super::memory::SelectionState;
use crate::document::Document;
use tracing::trace;

/// Maximum number of undo steps kept
const MAX_UNDO_STACK: usize = 100;

/// Kind of change recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Text insertion; consecutive insertions undo together
    Typing,

    /// Deletions, breaks and other text edits
    Edit,

    /// Mark and block formatting
    Format,
}

/// Document and selection as they were before a change
#[derive(Debug, Clone)]
pub(super) struct Snapshot {
    pub document: Document,
    pub selection: Option<SelectionState>,
}

/// Undo/redo stacks of whole-document snapshots.
///
/// All changes made during one tick form a single undo step, so a block
/// toggle that unwraps, retypes and wraps undoes in one go. The host ends a
/// tick after each input event or frame.
#[derive(Debug, Default)]
pub struct History {
    undos: Vec<Snapshot>,
    redos: Vec<Snapshot>,
    tick_recorded: bool,
    last_kind: Option<EditKind>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undos.len()
    }

    /// Record the state preceding a change
    pub(super) fn record(&mut self, before: Snapshot, kind: EditKind) {
        let merges_typing = kind == EditKind::Typing && self.last_kind == Some(EditKind::Typing);
        if !self.tick_recorded && !merges_typing {
            self.undos.push(before);
            if self.undos.len() > MAX_UNDO_STACK {
                self.undos.remove(0);
            }
            trace!("History step recorded ({:?}), depth {}", kind, self.undos.len());
        }

        self.redos.clear();
        self.tick_recorded = true;
        self.last_kind = Some(kind);
    }

    /// Close the current tick; the next change starts a new undo step
    pub fn end_tick(&mut self) {
        self.tick_recorded = false;
    }

    /// Stop merging consecutive typing, e.g. after the caret moved
    pub fn break_typing(&mut self) {
        self.last_kind = None;
    }

    pub(super) fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undos.pop()?;
        self.redos.push(current);
        self.tick_recorded = false;
        self.last_kind = None;
        Some(snapshot)
    }

    pub(super) fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redos.pop()?;
        self.undos.push(current);
        self.tick_recorded = false;
        self.last_kind = None;
        Some(snapshot)
    }
}
