use super::history::EditKind;
use super::memory::{byte_offset, Caret, MemoryEngine, SelectionState};
use super::transforms::parent_of;
use super::Direction;
use crate::document::{Document, Marks, Node, Text};
use tracing::trace;

// Text editing and caret movement. Everything here goes through
// `MemoryEngine::change`, so it is normalized and recorded like the
// formatting transforms.

impl MemoryEngine {
    /// Insert text at the selection, replacing selected content.
    /// Line breaks split the block.
    pub fn insert_text(&mut self, text: &str) {
        let marks = self.pending_marks();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.insert_break();
            }
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            self.change(EditKind::Typing, |doc, selection| {
                insert_text(doc, selection, line, marks)
            });
        }
        self.set_pending_marks(None);
    }

    /// Split the current block at the caret
    pub fn insert_break(&mut self) {
        self.change(EditKind::Edit, insert_break);
    }

    pub fn delete_selection(&mut self) {
        self.change(EditKind::Edit, |doc, selection| {
            let (start, end) = selection.ordered();
            delete_range(doc, selection, start, end)
        });
    }

    /// Delete the character before the caret, joining blocks at a block start
    pub fn delete_backward(&mut self) {
        self.delete_towards(Direction::Left);
    }

    /// Delete the character after the caret, joining blocks at a block end
    pub fn delete_forward(&mut self) {
        self.delete_towards(Direction::Right);
    }

    fn delete_towards(&mut self, direction: Direction) {
        let Some(selection) = self.selection_state() else {
            return;
        };
        if !selection.is_collapsed() {
            self.delete_selection();
            return;
        }

        let caret = selection.focus;
        let target = BlockLayout::new(self.document()).step(caret, direction);
        if target == caret {
            return;
        }
        let (start, end) = if target < caret {
            (target, caret)
        } else {
            (caret, target)
        };
        self.change(EditKind::Edit, |doc, selection| {
            delete_range(doc, selection, start, end)
        });
    }

    /// Plain text of the selection, blocks separated by newlines
    pub fn selected_text(&self) -> String {
        let Some(selection) = self.selection_state() else {
            return String::new();
        };
        let (start, end) = selection.ordered();
        let doc = self.document();
        let paths = doc.leaf_paths();
        let mut out = String::new();

        for ordinal in start.leaf..=end.leaf {
            let Some(path) = paths.get(ordinal) else {
                break;
            };
            if ordinal > start.leaf && parent_of(path) != parent_of(&paths[ordinal - 1]) {
                out.push('\n');
            }
            let Some(text) = doc.node(path).and_then(Node::as_text) else {
                continue;
            };
            let from = if ordinal == start.leaf { start.offset } else { 0 };
            let to = if ordinal == end.leaf { end.offset } else { text.len() };
            out.extend(text.text.chars().skip(from).take(to.saturating_sub(from)));
        }
        out
    }

    /// Move the focus. Without `extend` the selection collapses onto it.
    pub fn move_cursor(&mut self, direction: Direction, extend: bool) {
        let Some(selection) = self.selection_state() else {
            return;
        };

        // Left/right on a range collapses it to the matching edge first
        if !extend && !selection.is_collapsed() {
            let (start, end) = selection.ordered();
            match direction {
                Direction::Left => return self.set_selection(SelectionState::collapsed(start)),
                Direction::Right => return self.set_selection(SelectionState::collapsed(end)),
                _ => {}
            }
        }

        let focus = BlockLayout::new(self.document()).step(selection.focus, direction);
        let anchor = if extend { selection.anchor } else { focus };
        self.set_selection(SelectionState::new(anchor, focus));
    }
}

/// Leaf ordinals and lengths grouped by the text block that holds them
struct BlockLayout {
    blocks: Vec<Vec<(usize, usize)>>,
}

impl BlockLayout {
    fn new(doc: &Document) -> Self {
        let mut blocks: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut current_parent: Option<Vec<usize>> = None;

        for (ordinal, path) in doc.leaf_paths().iter().enumerate() {
            let len = doc.node(path).and_then(Node::as_text).map_or(0, Text::len);
            let parent = parent_of(path).to_vec();
            if current_parent.as_ref() == Some(&parent) {
                if let Some(block) = blocks.last_mut() {
                    block.push((ordinal, len));
                }
            } else {
                blocks.push(vec![(ordinal, len)]);
                current_parent = Some(parent);
            }
        }

        Self { blocks }
    }

    fn block_len(&self, block: usize) -> usize {
        self.blocks[block].iter().map(|(_, len)| len).sum()
    }

    // (block index, character offset inside the block)
    fn locate(&self, caret: Caret) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(index, leaves)| {
            let mut before = 0;
            for (ordinal, len) in leaves {
                if *ordinal == caret.leaf {
                    return Some((index, before + caret.offset.min(*len)));
                }
                before += len;
            }
            None
        })
    }

    fn caret_at(&self, block: usize, mut offset: usize) -> Caret {
        let leaves = &self.blocks[block];
        for (ordinal, len) in leaves {
            if offset <= *len {
                return Caret::new(*ordinal, offset);
            }
            offset -= len;
        }
        leaves
            .last()
            .map_or(Caret::default(), |(ordinal, len)| Caret::new(*ordinal, *len))
    }

    fn step(&self, caret: Caret, direction: Direction) -> Caret {
        let Some((block, offset)) = self.locate(caret) else {
            return caret;
        };
        let last_block = self.blocks.len() - 1;

        match direction {
            Direction::Left if offset > 0 => self.caret_at(block, offset - 1),
            Direction::Left if block > 0 => self.caret_at(block - 1, self.block_len(block - 1)),
            Direction::Left => caret,
            Direction::Right if offset < self.block_len(block) => self.caret_at(block, offset + 1),
            Direction::Right if block < last_block => self.caret_at(block + 1, 0),
            Direction::Right => caret,
            Direction::Up if block > 0 => {
                self.caret_at(block - 1, offset.min(self.block_len(block - 1)))
            }
            Direction::Up => self.caret_at(0, 0),
            Direction::Down if block < last_block => {
                self.caret_at(block + 1, offset.min(self.block_len(block + 1)))
            }
            Direction::Down => self.caret_at(last_block, self.block_len(last_block)),
            Direction::BlockStart => self.caret_at(block, 0),
            Direction::BlockEnd => self.caret_at(block, self.block_len(block)),
            Direction::DocumentStart => self.caret_at(0, 0),
            Direction::DocumentEnd => self.caret_at(last_block, self.block_len(last_block)),
        }
    }
}

fn insert_text(doc: &mut Document, selection: &mut SelectionState, text: &str, marks: Option<Marks>) {
    let (start, end) = selection.ordered();
    if start != end {
        delete_range(doc, selection, start, end);
    }

    let caret = selection.focus;
    let Some(path) = doc.leaf_paths().get(caret.leaf).cloned() else {
        return;
    };
    let Some(leaf) = doc.text_mut(&path) else {
        return;
    };
    let inserted = text.chars().count();
    let at = byte_offset(&leaf.text, caret.offset);

    match marks {
        Some(marks) if marks != leaf.marks => {
            // head | new text with the pending marks | tail
            let tail = leaf.split_off(caret.offset);
            let Some((index, parent)) = path.split_last() else {
                return;
            };
            if let Some(children) = doc.children_mut(parent) {
                children.insert(index + 1, Node::Text(Text::with_marks(text, marks)));
                children.insert(index + 2, Node::Text(tail));
            }
            *selection = SelectionState::collapsed(Caret::new(caret.leaf + 1, inserted));
        }
        _ => {
            leaf.text.insert_str(at, text);
            *selection = SelectionState::collapsed(Caret::new(caret.leaf, caret.offset + inserted));
        }
    }
}

fn insert_break(doc: &mut Document, selection: &mut SelectionState) {
    let (start, end) = selection.ordered();
    if start != end {
        delete_range(doc, selection, start, end);
    }

    let caret = selection.focus;
    let Some(path) = doc.leaf_paths().get(caret.leaf).cloned() else {
        return;
    };
    let Some((child_index, block_path)) = path.split_last() else {
        return;
    };
    let Some((block_index, parent)) = block_path.split_last() else {
        return;
    };
    let Some(Node::Element(block)) = doc.node_mut(block_path) else {
        return;
    };

    let mut moved = block.children.split_off(child_index + 1);
    if let Some(Node::Text(leaf)) = block.children.get_mut(*child_index) {
        moved.insert(0, Node::Text(leaf.split_off(caret.offset)));
    }
    let new_block = block.sibling(moved);
    trace!("Splitting {} at {:?}", new_block.kind, path);

    if let Some(children) = doc.children_mut(parent) {
        children.insert(block_index + 1, Node::Element(new_block));
    }
    *selection = SelectionState::collapsed(Caret::new(caret.leaf + 1, 0));
}

/// Remove everything between two carets, joining their blocks if they differ
fn delete_range(doc: &mut Document, selection: &mut SelectionState, start: Caret, end: Caret) {
    if start >= end {
        return;
    }
    let paths = doc.leaf_paths();
    let (Some(start_path), Some(end_path)) = (paths.get(start.leaf), paths.get(end.leaf)) else {
        return;
    };

    if start.leaf == end.leaf {
        if let Some(text) = doc.text_mut(start_path) {
            let from = byte_offset(&text.text, start.offset);
            let to = byte_offset(&text.text, end.offset);
            text.text.replace_range(from..to, "");
        }
        *selection = SelectionState::collapsed(start);
        return;
    }

    if let Some(text) = doc.text_mut(start_path) {
        let at = byte_offset(&text.text, start.offset);
        text.text.truncate(at);
    }
    if let Some(text) = doc.text_mut(end_path) {
        let at = byte_offset(&text.text, end.offset);
        text.text.replace_range(..at, "");
    }
    for path in paths[start.leaf + 1..end.leaf].iter().rev() {
        remove_node(doc, path);
    }

    // The end leaf now directly follows the start leaf
    let paths = doc.leaf_paths();
    if let (Some(start_path), Some(end_path)) = (paths.get(start.leaf), paths.get(start.leaf + 1)) {
        let start_block = parent_of(start_path);
        let end_block = parent_of(end_path);
        if start_block != end_block {
            merge_blocks(doc, start_block, end_block);
        }
    }
    *selection = SelectionState::collapsed(start);
}

/// Remove a node and every ancestor it leaves empty
fn remove_node(doc: &mut Document, path: &[usize]) {
    let mut path = path.to_vec();
    while let Some((index, parent)) = path.split_last() {
        let (index, parent) = (*index, parent.to_vec());
        let Some(children) = doc.children_mut(&parent) else {
            return;
        };
        if index < children.len() {
            children.remove(index);
        }
        if !children.is_empty() || parent.is_empty() {
            return;
        }
        path = parent;
    }
}

/// Move the children of `source` to the end of `target`, then drop `source`
fn merge_blocks(doc: &mut Document, target: &[usize], source: &[usize]) {
    let Some(Node::Element(source_block)) = doc.node(source).cloned() else {
        return;
    };
    trace!("Joining {} at {:?} into {:?}", source_block.kind, source, target);
    remove_node(doc, source);
    if let Some(Node::Element(target_block)) = doc.node_mut(target) {
        target_block.children.extend(source_block.children);
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{BlockKind, Mark, Node};
    use crate::engine::{Direction, EditorEngine, MemoryEngine, Point, Range};
    use serde_json::json;

    fn engine(value: serde_json::Value) -> MemoryEngine {
        MemoryEngine::new(serde_json::from_value(value).unwrap())
    }

    fn caret(engine: &mut MemoryEngine, path: &[usize], offset: usize) {
        engine.select(&Range::collapsed(Point::new(path.to_vec(), offset)));
    }

    fn json_of(engine: &MemoryEngine) -> serde_json::Value {
        serde_json::to_value(engine.document()).unwrap()
    }

    #[test]
    fn test_typing_inserts_at_caret() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "ac" }] }]));
        caret(&mut e, &[0, 0], 1);

        e.insert_text("b");

        assert_eq!(e.document().plain_text(), "abc");
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_typing_with_pending_mark_creates_marked_text() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "ab" }] }]));
        caret(&mut e, &[0, 0], 1);

        e.add_mark(Mark::Bold);
        e.insert_text("X");

        assert_eq!(
            json_of(&e),
            json!([{ "type": "paragraph", "children": [
                { "text": "a" }, { "text": "X", "bold": true }, { "text": "b" }
            ]}])
        );
        // typing continues the bold run
        assert!(e.current_marks().unwrap().bold);
    }

    #[test]
    fn test_enter_splits_block_and_keeps_kind() {
        let mut e = engine(json!([{ "type": "heading-one", "children": [{ "text": "title" }] }]));
        caret(&mut e, &[0, 0], 2);

        e.insert_break();

        assert_eq!(
            json_of(&e),
            json!([
                { "type": "heading-one", "children": [{ "text": "ti" }] },
                { "type": "heading-one", "children": [{ "text": "tle" }] }
            ])
        );
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![1, 0], 0));
    }

    #[test]
    fn test_backspace_at_block_start_joins_blocks() {
        let mut e = engine(json!([
            { "type": "paragraph", "children": [{ "text": "ab" }] },
            { "type": "bulleted-list", "children": [
                { "type": "list-item", "children": [{ "text": "cd" }] }
            ]}
        ]));
        caret(&mut e, &[1, 0, 0], 0);

        e.delete_backward();

        assert_eq!(
            json_of(&e),
            json!([{ "type": "paragraph", "children": [{ "text": "abcd" }] }])
        );
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_delete_across_blocks() {
        let mut e = engine(json!([
            { "type": "paragraph", "children": [{ "text": "one" }] },
            { "type": "paragraph", "children": [{ "text": "two" }] },
            { "type": "paragraph", "children": [{ "text": "three" }] }
        ]));
        e.select(&Range::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![2, 0], 2),
        ));

        e.delete_selection();

        assert_eq!(
            json_of(&e),
            json!([{ "type": "paragraph", "children": [{ "text": "oree" }] }])
        );
    }

    #[test]
    fn test_selected_text_joins_blocks_with_newlines() {
        let mut e = engine(json!([
            { "type": "paragraph", "children": [{ "text": "ab" }, { "text": "cd", "bold": true }] },
            { "type": "paragraph", "children": [{ "text": "ef" }] }
        ]));
        e.select(&Range::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![1, 0], 1),
        ));
        assert_eq!(e.selected_text(), "bcd\ne");
    }

    #[test]
    fn test_delete_forward_removes_next_char() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "abc" }] }]));
        caret(&mut e, &[0, 0], 0);
        e.delete_forward();
        assert_eq!(e.document().plain_text(), "bc");
    }

    #[test]
    fn test_cursor_moves_across_blocks_and_extends() {
        let mut e = engine(json!([
            { "type": "paragraph", "children": [{ "text": "ab" }] },
            { "type": "code", "children": [{ "text": "cd" }] }
        ]));
        caret(&mut e, &[0, 0], 2);

        e.move_cursor(Direction::Right, false);
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![1, 0], 0));

        e.move_cursor(Direction::BlockEnd, true);
        let selection = e.selection().unwrap();
        assert_eq!(selection.anchor, Point::new(vec![1, 0], 0));
        assert_eq!(selection.focus, Point::new(vec![1, 0], 2));

        e.move_cursor(Direction::Left, false);
        assert!(e.selection().unwrap().is_collapsed());
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![1, 0], 0));

        e.move_cursor(Direction::Up, false);
        assert_eq!(e.selection().unwrap().focus, Point::new(vec![0, 0], 0));
    }

    #[test]
    fn test_consecutive_typing_undoes_together() {
        let mut e = engine(json!([{ "type": "paragraph", "children": [{ "text": "" }] }]));
        caret(&mut e, &[0, 0], 0);

        for ch in ["h", "e", "y"] {
            e.insert_text(ch);
            e.end_tick();
        }
        e.insert_break();
        e.end_tick();

        assert!(e.undo());
        assert_eq!(e.document().plain_text(), "hey");
        assert!(e.undo());
        assert_eq!(e.document().plain_text(), "");
        assert_eq!(e.document().children[0].kind(), Some(BlockKind::Paragraph));
        assert!(e.document().node(&[0, 0]).and_then(Node::as_text).is_some());
    }
}
