// Editor engine: owns the document tree, the selection and the history.
// The formatting logic only ever talks to the `EditorEngine` trait.

mod editing;
mod history;
mod memory;
mod normalize;
mod transforms;

pub use history::*;
pub use memory::*;

use crate::document::{BlockKind, Element, Mark, Marks, Node, Path};

/// A position inside a text leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    /// Path of the text leaf
    pub path: Path,

    /// Character offset inside the leaf
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// A selection. `anchor` is where it started, `focus` where it ends up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A node found by `query_nodes`, with the path it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub path: Path,
    pub node: Node,
}

/// Properties written onto matching elements by `set_node_properties`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeProperties {
    pub kind: BlockKind,
}

/// Caret movements supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    BlockStart,
    BlockEnd,
    DocumentStart,
    DocumentEnd,
}

/// Node predicate used to select what a transform applies to
pub type NodeMatch<'a> = &'a dyn Fn(&Node) -> bool;

/// Operations the formatting logic needs from an editor engine.
///
/// Every call applies to the current selection and completes synchronously.
pub trait EditorEngine {
    /// Marks that typed text would receive, `None` without a selection
    fn current_marks(&self) -> Option<Marks>;

    /// Nodes intersecting the selection, ancestors first, in document order
    fn query_nodes(&self, predicate: NodeMatch<'_>) -> Vec<NodeEntry>;

    /// Write `properties` onto the lowest matching elements in the selection
    fn set_node_properties(&mut self, properties: &NodeProperties, predicate: NodeMatch<'_>);

    /// Wrap the selected blocks in `element`
    fn wrap_nodes(&mut self, element: Element);

    /// Lift the children of matching elements in the selection into their parent.
    /// With `split`, only the selected children are lifted.
    fn unwrap_nodes(&mut self, predicate: NodeMatch<'_>, split: bool);

    fn add_mark(&mut self, mark: Mark);

    fn remove_mark(&mut self, mark: Mark);
}
