use super::memory::SelectionState;
use super::{NodeEntry, NodeMatch, NodeProperties};
use crate::document::{Document, Element, Mark, Node, Path, Text};
use tracing::trace;

/// Nodes whose leaves intersect the selection, ancestors before descendants
pub(super) fn query(doc: &Document, selection: &SelectionState, predicate: NodeMatch<'_>) -> Vec<NodeEntry> {
    let (start, end) = selection.ordered();
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_in_range(&doc.children, &mut path, 0, start.leaf, end.leaf, predicate, &mut out);
    out
}

fn collect_in_range(
    nodes: &[Node],
    path: &mut Path,
    first_leaf: usize,
    start: usize,
    end: usize,
    predicate: NodeMatch<'_>,
    out: &mut Vec<NodeEntry>,
) {
    let mut span_start = first_leaf;
    for (index, node) in nodes.iter().enumerate() {
        if span_start > end {
            break;
        }
        let count = node.leaf_count();
        if count > 0 && span_start + count > start {
            path.push(index);
            if predicate(node) {
                out.push(NodeEntry {
                    path: path.clone(),
                    node: node.clone(),
                });
            }
            if let Node::Element(element) = node {
                collect_in_range(&element.children, path, span_start, start, end, predicate, out);
            }
            path.pop();
        }
        span_start += count;
    }
}

/// Keep only entries that have no matching descendant among `entries`
pub(super) fn lowest(entries: Vec<NodeEntry>) -> Vec<NodeEntry> {
    let paths: Vec<Path> = entries.iter().map(|entry| entry.path.clone()).collect();
    entries
        .into_iter()
        .filter(|entry| {
            !paths
                .iter()
                .any(|other| other.len() > entry.path.len() && other.starts_with(&entry.path))
        })
        .collect()
}

fn matching_elements(doc: &Document, selection: &SelectionState, predicate: NodeMatch<'_>) -> Vec<NodeEntry> {
    lowest(query(doc, selection, &|node: &Node| {
        node.as_element().is_some() && predicate(node)
    }))
}

pub(super) fn set_properties(
    doc: &mut Document,
    selection: &SelectionState,
    properties: &NodeProperties,
    predicate: NodeMatch<'_>,
) {
    for entry in matching_elements(doc, selection, predicate) {
        if let Some(Node::Element(element)) = doc.node_mut(&entry.path) {
            trace!("Setting {:?} to {} at {:?}", element.kind, properties.kind, entry.path);
            element.kind = properties.kind;
        }
    }
}

/// Wrap the blocks covered by the selection in `wrapper`
pub(super) fn wrap(doc: &mut Document, selection: &mut SelectionState, mut wrapper: Element) {
    let (start, end) = selection.ordered();
    let paths = doc.leaf_paths();
    let (Some(start_leaf), Some(end_leaf)) = (paths.get(start.leaf), paths.get(end.leaf)) else {
        return;
    };

    let start_block = parent_of(start_leaf);
    let end_block = parent_of(end_leaf);
    if start_block.is_empty() || end_block.is_empty() {
        return;
    }

    let common = common_prefix(start_block, end_block);
    let (parent, first, last) = if common.len() < start_block.len() && common.len() < end_block.len() {
        (common.clone(), start_block[common.len()], end_block[common.len()])
    } else if let Some((index, parent)) = common.split_last() {
        (parent.to_vec(), *index, *index)
    } else {
        return;
    };

    // Leaves the wrapper brings along push the wrapped leaves back
    let own_leaves: usize = wrapper.children.iter().map(Node::leaf_count).sum();
    if own_leaves > 0 {
        let mut prefix = parent.clone();
        prefix.push(first);
        if let Some(first_ordinal) = paths.iter().position(|path| path.starts_with(&prefix)) {
            selection.shift_from(first_ordinal, own_leaves);
        }
    }

    let Some(children) = doc.children_mut(&parent) else {
        return;
    };
    trace!("Wrapping {}..={} under {:?} in {}", first, last, parent, wrapper.kind);
    wrapper.children.extend(children.drain(first..=last));
    children.insert(first, Node::Element(wrapper));
}

/// Lift the children of matching elements out of them
pub(super) fn unwrap(doc: &mut Document, selection: &SelectionState, predicate: NodeMatch<'_>, split: bool) {
    let (start, end) = selection.ordered();

    // Later entries first, so the paths of earlier ones stay valid
    for entry in matching_elements(doc, selection, predicate).into_iter().rev() {
        let Some((index, parent)) = entry.path.split_last() else {
            continue;
        };
        let Some(Node::Element(mut wrapper)) = doc.node(&entry.path).cloned() else {
            continue;
        };

        let first_leaf = doc
            .leaf_paths()
            .iter()
            .position(|path| path.starts_with(&entry.path))
            .unwrap_or(0);

        let (covered_first, covered_last) = if split {
            match covered_children(&wrapper.children, first_leaf, start.leaf, end.leaf) {
                Some(range) => range,
                None => continue,
            }
        } else if wrapper.children.is_empty() {
            continue;
        } else {
            (0, wrapper.children.len() - 1)
        };

        let kind = wrapper.kind;
        let mut head = std::mem::take(&mut wrapper.children);
        let tail = head.split_off(covered_last + 1);
        let middle = head.split_off(covered_first);

        let mut replacement = Vec::with_capacity(middle.len() + 2);
        if !head.is_empty() {
            replacement.push(Node::Element(wrapper.sibling(head)));
        }
        replacement.extend(middle);
        if !tail.is_empty() {
            replacement.push(Node::Element(wrapper.sibling(tail)));
        }

        trace!("Unwrapping {} at {:?}", kind, entry.path);
        if let Some(children) = doc.children_mut(parent) {
            children.splice(*index..=*index, replacement);
        }
    }
}

// First and last child index whose leaves intersect start..=end
fn covered_children(children: &[Node], first_leaf: usize, start: usize, end: usize) -> Option<(usize, usize)> {
    let mut covered = None;
    let mut span_start = first_leaf;
    for (index, child) in children.iter().enumerate() {
        let count = child.leaf_count();
        if count > 0 && span_start <= end && span_start + count > start {
            covered = match covered {
                None => Some((index, index)),
                Some((first, _)) => Some((first, index)),
            };
        }
        span_start += count;
    }
    covered
}

/// Set or clear `mark` on the selected characters, splitting texts at the edges
pub(super) fn set_mark(doc: &mut Document, selection: &mut SelectionState, mark: Mark, value: bool) {
    let (_, end) = selection.ordered();
    split_leaf(doc, selection, end.leaf, end.offset);
    let (start, _) = selection.ordered();
    split_leaf(doc, selection, start.leaf, start.offset);

    let (start, end) = selection.ordered();
    let paths = doc.leaf_paths();
    let leaf_len = |ordinal: usize| {
        paths
            .get(ordinal)
            .and_then(|path| doc.node(path))
            .and_then(Node::as_text)
            .map_or(0, Text::len)
    };

    let first = if start.leaf < end.leaf && start.offset >= leaf_len(start.leaf) {
        start.leaf + 1
    } else {
        start.leaf
    };
    let last = if end.leaf > first && end.offset == 0 {
        end.leaf - 1
    } else {
        end.leaf
    };

    for path in paths.iter().take(last + 1).skip(first) {
        if let Some(text) = doc.text_mut(path) {
            text.marks.set(mark, value);
        }
    }
}

/// Split the leaf `ordinal` at a character offset into two texts with equal marks
pub(super) fn split_leaf(doc: &mut Document, selection: &mut SelectionState, ordinal: usize, offset: usize) {
    let Some(path) = doc.leaf_paths().get(ordinal).cloned() else {
        return;
    };
    let Some(text) = doc.text_mut(&path) else {
        return;
    };
    if offset == 0 || offset >= text.len() {
        return;
    }

    let tail = text.split_off(offset);
    let Some((index, parent)) = path.split_last() else {
        return;
    };
    if let Some(children) = doc.children_mut(parent) {
        children.insert(index + 1, Node::Text(tail));
    }
    selection.split_at(ordinal, offset);
}

pub(super) fn parent_of(path: &[usize]) -> &[usize] {
    match path.split_last() {
        Some((_, parent)) => parent,
        None => &[],
    }
}

fn common_prefix(a: &[usize], b: &[usize]) -> Path {
    a.iter().zip(b).take_while(|(x, y)| x == y).map(|(x, _)| *x).collect()
}
