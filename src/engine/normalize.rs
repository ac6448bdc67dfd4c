use super::memory::Caret;
use crate::document::{BlockKind, Document, Element, Node, Text};

/// Bring the tree back into canonical shape after a transform.
///
/// Carets are text-leaf ordinals, so every leaf that is added or merged
/// away shifts the carets that point past it.
pub(super) fn normalize(doc: &mut Document, carets: &mut [Caret]) {
    if doc.children.is_empty() {
        doc.children
            .push(Node::Element(Element::with_text(BlockKind::Paragraph, "")));
        carets.iter_mut().for_each(|caret| *caret = Caret::default());
    }

    // The root holds blocks only
    if doc.children.iter().any(|node| matches!(node, Node::Text(_))) {
        wrap_texts(&mut doc.children);
    }

    let mut next_leaf = 0;
    normalize_children(&mut doc.children, &mut next_leaf, carets);
}

// Runs of texts are grouped into paragraphs. Leaf order is unchanged, so
// carets need no fixup.
fn wrap_texts(children: &mut Vec<Node>) {
    let mut grouped: Vec<Node> = Vec::with_capacity(children.len());
    let mut in_group = false;
    for node in children.drain(..) {
        match node {
            Node::Element(_) => {
                grouped.push(node);
                in_group = false;
            }
            Node::Text(text) => match grouped.last_mut() {
                Some(Node::Element(paragraph)) if in_group => paragraph.children.push(Node::Text(text)),
                _ => {
                    grouped.push(Node::Element(Element::new(BlockKind::Paragraph, vec![Node::Text(text)])));
                    in_group = true;
                }
            },
        }
    }
    *children = grouped;
}

fn normalize_children(children: &mut Vec<Node>, next_leaf: &mut usize, carets: &mut [Caret]) {
    let mut i = 0;
    while i < children.len() {
        if let Node::Element(element) = &mut children[i] {
            if element.children.is_empty() {
                element.children.push(Node::Text(Text::default()));
                shift_from(carets, *next_leaf);
            }
            // An element holds either texts or blocks, never both
            if !element.is_text_block() && element.children.iter().any(|node| matches!(node, Node::Text(_))) {
                wrap_texts(&mut element.children);
            }
            normalize_children(&mut element.children, next_leaf, carets);
            i += 1;
            continue;
        }

        while i + 1 < children.len() && mergeable(&children[i], &children[i + 1]) {
            let removed = children.remove(i + 1);
            if let (Node::Text(current), Node::Text(next)) = (&mut children[i], removed) {
                let current_len = current.len();
                if current.is_empty() && !next.is_empty() {
                    current.marks = next.marks;
                    current.extra = next.extra;
                }
                current.text.push_str(&next.text);
                merge_into(carets, *next_leaf, current_len);
            }
        }

        *next_leaf += 1;
        i += 1;
    }
}

fn mergeable(current: &Node, next: &Node) -> bool {
    match (current, next) {
        (Node::Text(a), Node::Text(b)) => {
            (a.marks == b.marks && a.extra == b.extra) || a.is_empty() || b.is_empty()
        }
        _ => false,
    }
}

// A leaf was inserted at `ordinal`
fn shift_from(carets: &mut [Caret], ordinal: usize) {
    for caret in carets.iter_mut().filter(|caret| caret.leaf >= ordinal) {
        caret.leaf += 1;
    }
}

// The leaf after `ordinal` was appended onto it
fn merge_into(carets: &mut [Caret], ordinal: usize, prefix_len: usize) {
    for caret in carets.iter_mut() {
        if caret.leaf == ordinal + 1 {
            caret.leaf = ordinal;
            caret.offset += prefix_len;
        } else if caret.leaf > ordinal + 1 {
            caret.leaf -= 1;
        }
    }
}
