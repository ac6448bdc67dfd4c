// Formatting toggles: decide from the engine's current state whether a mark
// or block format is applied or removed, then issue the matching commands.

use crate::document::{BlockKind, Element, Mark, Node};
use crate::engine::{EditorEngine, NodeProperties};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A formatting request from the toolbar or a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Mark(Mark),
    Block(BlockKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown format '{0}'")]
pub struct ParseFormatError(pub String);

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Mark(mark) => mark.name(),
            Format::Block(kind) => kind.tag(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ParseFormatError;

    // "code" names both a mark and a block; the mark wins, as on the toolbar
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(mark) = s.parse::<Mark>() {
            return Ok(Format::Mark(mark));
        }
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .map(Format::Block)
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// Whether text typed now would carry `mark`
pub fn is_mark_active(engine: &impl EditorEngine, mark: Mark) -> bool {
    engine.current_marks().is_some_and(|marks| marks.has(mark))
}

/// Remove `mark` if it is active at the selection, add it otherwise
pub fn toggle_mark(engine: &mut impl EditorEngine, mark: Mark) {
    if is_mark_active(&*engine, mark) {
        debug!("Removing mark {}", mark);
        engine.remove_mark(mark);
    } else {
        debug!("Adding mark {}", mark);
        engine.add_mark(mark);
    }
}

/// Whether any node on the selection already has block type `kind`
pub fn is_block_active(engine: &impl EditorEngine, kind: BlockKind) -> bool {
    !engine
        .query_nodes(&|node: &Node| node.kind() == Some(kind))
        .is_empty()
}

/// Commands a block toggle issues, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockToggle {
    /// List containers around the selection are always split off first
    pub unwrap_lists: bool,

    /// New type of the selected blocks
    pub set_kind: BlockKind,

    /// Container to wrap the retyped blocks in
    pub wrap_in: Option<BlockKind>,
}

/// Plan a block toggle.
///
/// Toggling off always yields a paragraph, not the block's previous type.
pub fn plan_block_toggle(is_active: bool, kind: BlockKind) -> BlockToggle {
    let is_list = kind.is_list();
    let set_kind = if is_active {
        BlockKind::Paragraph
    } else if is_list {
        BlockKind::ListItem
    } else {
        kind
    };

    BlockToggle {
        unwrap_lists: true,
        set_kind,
        wrap_in: (!is_active && is_list).then_some(kind),
    }
}

/// Toggle the selected blocks to or from `kind`
pub fn toggle_block(engine: &mut impl EditorEngine, kind: BlockKind) {
    let plan = plan_block_toggle(is_block_active(&*engine, kind), kind);
    debug!("Toggling block {}: {:?}", kind, plan);
    apply_block_toggle(engine, &plan);
}

pub fn apply_block_toggle(engine: &mut impl EditorEngine, plan: &BlockToggle) {
    if plan.unwrap_lists {
        engine.unwrap_nodes(&|node: &Node| node.kind().is_some_and(|k| k.is_list()), true);
    }

    engine.set_node_properties(
        &NodeProperties {
            kind: plan.set_kind,
        },
        &|node: &Node| node.as_element().is_some(),
    );

    if let Some(container) = plan.wrap_in {
        engine.wrap_nodes(Element::new(container, Vec::new()));
    }
}

pub fn is_format_active(engine: &impl EditorEngine, format: Format) -> bool {
    match format {
        Format::Mark(mark) => is_mark_active(engine, mark),
        Format::Block(kind) => is_block_active(engine, kind),
    }
}

pub fn toggle_format(engine: &mut impl EditorEngine, format: Format) {
    match format {
        Format::Mark(mark) => toggle_mark(engine, mark),
        Format::Block(kind) => toggle_block(engine, kind),
    }
}
