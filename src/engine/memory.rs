use super::history::{EditKind, History, Snapshot};
use super::normalize::normalize;
use super::transforms;
use super::{EditorEngine, NodeEntry, NodeMatch, NodeProperties, Point, Range};
use crate::document::{Document, Element, Mark, Marks, Node, Text};
use tracing::{debug, trace};

/// Position as (text leaf ordinal, character offset).
///
/// Ordinals do not change when blocks are wrapped, unwrapped or retyped, so
/// the selection survives structural transforms without path bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct Caret {
    pub leaf: usize,
    pub offset: usize,
}

impl Caret {
    pub fn new(leaf: usize, offset: usize) -> Self {
        Self { leaf, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SelectionState {
    pub anchor: Caret,
    pub focus: Caret,
}

impl SelectionState {
    pub fn new(anchor: Caret, focus: Caret) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(caret: Caret) -> Self {
        Self::new(caret, caret)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// (start, end) in document order
    pub fn ordered(&self) -> (Caret, Caret) {
        if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    pub fn carets_mut(&mut self) -> [&mut Caret; 2] {
        [&mut self.anchor, &mut self.focus]
    }

    /// `count` leaves were inserted at `ordinal`
    pub fn shift_from(&mut self, ordinal: usize, count: usize) {
        for caret in self.carets_mut() {
            if caret.leaf >= ordinal {
                caret.leaf += count;
            }
        }
    }

    /// Leaf `ordinal` was split at `offset`; its tail is now the next leaf
    pub fn split_at(&mut self, ordinal: usize, offset: usize) {
        for caret in self.carets_mut() {
            if caret.leaf > ordinal {
                caret.leaf += 1;
            } else if caret.leaf == ordinal && caret.offset > offset {
                caret.leaf += 1;
                caret.offset -= offset;
            }
        }
    }
}

/// Byte index of a character offset, clamped to the end of the string
pub(crate) fn byte_offset(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(index, _)| index)
}

/// In-process editor engine: document, selection, pending marks and history.
pub struct MemoryEngine {
    /// The document being edited
    document: Document,

    /// Current selection, if the editor has one
    selection: Option<SelectionState>,

    /// Marks for the next insertion at a collapsed selection
    pending_marks: Option<Marks>,

    /// Undo/redo stacks
    history: History,

    /// Bumped on every document change
    version: u64,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl MemoryEngine {
    /// Create an engine over `document` with no selection
    pub fn new(mut document: Document) -> Self {
        normalize(&mut document, &mut []);
        Self {
            document,
            selection: None,
            pending_marks: None,
            history: History::new(),
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Change counter, for hosts that persist on change
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Close the current history tick
    pub fn end_tick(&mut self) {
        self.history.end_tick();
    }

    pub fn selection(&self) -> Option<Range> {
        let selection = self.selection?;
        Some(Range::new(
            self.caret_to_point(selection.anchor)?,
            self.caret_to_point(selection.focus)?,
        ))
    }

    /// Select `range`. Returns false if it does not point at text leaves.
    pub fn select(&mut self, range: &Range) -> bool {
        let (Some(anchor), Some(focus)) = (
            self.point_to_caret(&range.anchor),
            self.point_to_caret(&range.focus),
        ) else {
            debug!("Ignoring selection outside the document: {:?}", range);
            return false;
        };
        self.set_selection(SelectionState::new(anchor, focus));
        true
    }

    pub fn select_all(&mut self) {
        let last = self.document.leaf_paths().len().saturating_sub(1);
        let end = Caret::new(last, self.leaf_len(last));
        self.set_selection(SelectionState::new(Caret::default(), end));
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Text leaf at a document-order ordinal
    pub fn text_of_leaf(&self, ordinal: usize) -> Option<&Text> {
        let paths = self.document.leaf_paths();
        self.document.node(paths.get(ordinal)?).and_then(Node::as_text)
    }

    pub(super) fn leaf_len(&self, ordinal: usize) -> usize {
        self.text_of_leaf(ordinal).map_or(0, Text::len)
    }

    pub(super) fn caret_to_point(&self, caret: Caret) -> Option<Point> {
        let path = self.document.leaf_paths().get(caret.leaf)?.clone();
        Some(Point::new(path, caret.offset))
    }

    pub(super) fn point_to_caret(&self, point: &Point) -> Option<Caret> {
        let leaf = self
            .document
            .leaf_paths()
            .iter()
            .position(|path| *path == point.path)?;
        Some(Caret::new(leaf, point.offset.min(self.leaf_len(leaf))))
    }

    pub(super) fn selection_state(&self) -> Option<SelectionState> {
        self.selection
    }

    pub(super) fn set_selection(&mut self, selection: SelectionState) {
        if self.selection != Some(selection) {
            self.pending_marks = None;
            self.history.break_typing();
        }
        self.selection = Some(selection);
    }

    pub(super) fn set_pending_marks(&mut self, marks: Option<Marks>) {
        self.pending_marks = marks;
    }

    pub(super) fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    /// Run a document change against the current selection.
    ///
    /// Normalizes afterwards, and records a history step and bumps the
    /// version only if the document actually changed.
    pub(super) fn change<F>(&mut self, kind: EditKind, apply: F) -> bool
    where
        F: FnOnce(&mut Document, &mut SelectionState),
    {
        let Some(mut selection) = self.selection else {
            trace!("No selection, skipping {:?}", kind);
            return false;
        };
        let before = self.snapshot();

        apply(&mut self.document, &mut selection);
        let mut carets = [selection.anchor, selection.focus];
        normalize(&mut self.document, &mut carets);
        selection = SelectionState::new(carets[0], carets[1]);
        self.selection = Some(selection);

        if self.document == before.document {
            return false;
        }
        self.history.record(before, kind);
        self.version += 1;
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.selection = snapshot.selection;
        self.pending_marks = None;
        self.version += 1;
    }

    // Marks of the text a collapsed caret continues, or the first selected text
    fn marks_at_selection(&self, selection: SelectionState) -> Option<Marks> {
        let (start, end) = selection.ordered();
        let paths = self.document.leaf_paths();
        let mut ordinal = start.leaf;

        if selection.is_collapsed() {
            if start.offset == 0 && start.leaf > 0 {
                let same_block = transforms::parent_of(paths.get(start.leaf)?)
                    == transforms::parent_of(paths.get(start.leaf - 1)?);
                if same_block {
                    ordinal = start.leaf - 1;
                }
            }
        } else if start.leaf < end.leaf && start.offset >= self.leaf_len(start.leaf) {
            ordinal = start.leaf + 1;
        }

        self.text_of_leaf(ordinal).map(|text| text.marks)
    }
}

impl EditorEngine for MemoryEngine {
    fn current_marks(&self) -> Option<Marks> {
        let selection = self.selection?;
        if selection.is_collapsed() {
            if let Some(marks) = self.pending_marks {
                return Some(marks);
            }
        }
        self.marks_at_selection(selection)
    }

    fn query_nodes(&self, predicate: NodeMatch<'_>) -> Vec<NodeEntry> {
        match &self.selection {
            Some(selection) => transforms::query(&self.document, selection, predicate),
            None => Vec::new(),
        }
    }

    fn set_node_properties(&mut self, properties: &NodeProperties, predicate: NodeMatch<'_>) {
        self.change(EditKind::Format, |doc, selection| {
            transforms::set_properties(doc, selection, properties, predicate)
        });
    }

    fn wrap_nodes(&mut self, element: Element) {
        self.change(EditKind::Format, |doc, selection| {
            transforms::wrap(doc, selection, element)
        });
    }

    fn unwrap_nodes(&mut self, predicate: NodeMatch<'_>, split: bool) {
        self.change(EditKind::Format, |doc, selection| {
            transforms::unwrap(doc, selection, predicate, split)
        });
    }

    fn add_mark(&mut self, mark: Mark) {
        self.apply_mark(mark, true);
    }

    fn remove_mark(&mut self, mark: Mark) {
        self.apply_mark(mark, false);
    }
}

impl MemoryEngine {
    fn apply_mark(&mut self, mark: Mark, value: bool) {
        let Some(selection) = self.selection else {
            return;
        };

        if selection.is_collapsed() {
            let mut marks = self.current_marks().unwrap_or_default();
            marks.set(mark, value);
            trace!("Pending marks now {:?}", marks);
            self.pending_marks = Some(marks);
            return;
        }

        self.change(EditKind::Format, |doc, selection| {
            transforms::set_mark(doc, selection, mark, value)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use serde_json::json;

    fn engine(value: serde_json::Value) -> MemoryEngine {
        MemoryEngine::new(serde_json::from_value(value).unwrap())
    }

    fn range(anchor: (&[usize], usize), focus: (&[usize], usize)) -> Range {
        Range::new(
            Point::new(anchor.0.to_vec(), anchor.1),
            Point::new(focus.0.to_vec(), focus.1),
        )
    }

    #[test]
    fn test_no_selection_means_no_marks_and_no_nodes() {
        let e = MemoryEngine::default();
        assert_eq!(e.current_marks(), None);
        assert!(e.query_nodes(&|_: &Node| true).is_empty());
    }

    #[test]
    fn test_select_rejects_paths_outside_document() {
        let mut e = MemoryEngine::default();
        assert!(!e.select(&range((&[3, 0], 0), (&[3, 0], 0))));
        assert!(e.select(&range((&[0, 0], 0), (&[0, 0], 99))));
        assert_eq!(e.selection().unwrap().focus.offset, 30);
    }

    #[test]
    fn test_add_and_remove_mark_on_expanded_selection() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "abc" }] }]));
        e.select(&range((&[0, 0], 0), (&[0, 0], 3)));

        e.add_mark(Mark::Bold);
        assert_eq!(
            serde_json::to_value(e.document()).unwrap(),
            json!([{ "type": "paragraph", "children": [{ "text": "abc", "bold": true }] }])
        );
        assert!(e.current_marks().unwrap().bold);

        e.remove_mark(Mark::Bold);
        assert_eq!(
            serde_json::to_value(e.document()).unwrap(),
            json!([{ "type": "paragraph", "children": [{ "text": "abc" }] }])
        );
    }

    #[test]
    fn test_collapsed_mark_is_pending_until_caret_moves() {
        let mut e = MemoryEngine::default();
        e.select(&range((&[0, 0], 2), (&[0, 0], 2)));
        let version = e.version();

        e.add_mark(Mark::Italic);
        assert!(e.current_marks().unwrap().italic);
        assert_eq!(e.version(), version);

        e.select(&range((&[0, 0], 3), (&[0, 0], 3)));
        assert!(!e.current_marks().unwrap().italic);
    }

    #[test]
    fn test_structural_change_keeps_selection_on_same_text() {
        let mut e = engine(json!([
            { "type": "paragraph", "children": [{ "text": "one" }] },
            { "type": "paragraph", "children": [{ "text": "two" }] }
        ]));
        e.select(&range((&[1, 0], 1), (&[1, 0], 2)));

        e.wrap_nodes(Element::new(BlockKind::BlockQuote, Vec::new()));

        assert_eq!(e.selection(), Some(range((&[1, 0, 0], 1), (&[1, 0, 0], 2))));
    }

    #[test]
    fn test_undo_restores_previous_document_per_tick() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "abc" }] }]));
        e.select(&range((&[0, 0], 0), (&[0, 0], 3)));
        let original = e.document().clone();

        e.add_mark(Mark::Bold);
        e.add_mark(Mark::Code);
        e.end_tick();
        e.add_mark(Mark::Italic);
        e.end_tick();
        assert_eq!(e.history().undo_depth(), 2);

        assert!(e.undo());
        assert!(!e.current_marks().unwrap().italic);
        assert!(e.undo());
        assert_eq!(e.document(), &original);
        assert!(!e.undo());

        assert!(e.redo());
        assert!(e.current_marks().unwrap().code);
    }

    #[test]
    fn test_no_op_change_records_nothing() {
        let mut e = MemoryEngine::default();
        e.select(&range((&[0, 0], 0), (&[0, 0], 4)));
        e.remove_mark(Mark::Underline);
        assert!(!e.history().can_undo());
        assert_eq!(e.version(), 0);
    }
}
