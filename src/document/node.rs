use super::kind::{BlockKind, Marks};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Child indices from the document root down to a node
pub type Path = Vec<usize>;

/// Properties the editor does not interpret, written back as they were read
pub type Extra = Map<String, Value>;

/// A run of characters sharing one set of marks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Text {
    pub fn new(text: &str) -> Self {
        Self::with_marks(text, Marks::none())
    }

    pub fn with_marks(text: &str, marks: Marks) -> Self {
        Self {
            text: text.to_string(),
            marks,
            extra: Extra::new(),
        }
    }

    /// Length in characters, which is the unit of every offset in the engine
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split at a character offset. The tail keeps the marks and extra properties.
    pub fn split_off(&mut self, offset: usize) -> Text {
        let at = self
            .text
            .char_indices()
            .nth(offset)
            .map_or(self.text.len(), |(index, _)| index);
        Text {
            text: self.text.split_off(at),
            marks: self.marks,
            extra: self.extra.clone(),
        }
    }
}

/// A block node with a type tag and ordered children
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawElement", into = "RawElement")]
pub struct Element {
    pub kind: BlockKind,
    pub children: Vec<Node>,

    /// The tag as read, kept for elements of an unknown type
    unknown_tag: Option<String>,
    extra: Extra,
}

/// Element as it appears in JSON
#[derive(Serialize, Deserialize)]
struct RawElement {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    children: Vec<Node>,
    #[serde(flatten)]
    extra: Extra,
}

impl From<RawElement> for Element {
    fn from(raw: RawElement) -> Self {
        let kind = raw.tag.as_deref().map_or(BlockKind::Default, BlockKind::from_tag);
        Element {
            kind,
            children: raw.children,
            unknown_tag: raw.tag.filter(|_| kind == BlockKind::Default),
            extra: raw.extra,
        }
    }
}

impl From<Element> for RawElement {
    fn from(element: Element) -> Self {
        let tag = match element.kind {
            BlockKind::Default => element.unknown_tag,
            kind => Some(kind.tag().to_string()),
        };
        RawElement {
            tag,
            children: element.children,
            extra: element.extra,
        }
    }
}

impl Element {
    pub fn new(kind: BlockKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            children,
            unknown_tag: None,
            extra: Extra::new(),
        }
    }

    /// An element holding a single unmarked text
    pub fn with_text(kind: BlockKind, text: &str) -> Self {
        Self::new(kind, vec![Node::Text(Text::new(text))])
    }

    /// An element of the same type and properties holding `children`
    pub fn sibling(&self, children: Vec<Node>) -> Self {
        Self {
            kind: self.kind,
            children,
            unknown_tag: self.unknown_tag.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Whether the element holds text directly rather than other blocks
    pub fn is_text_block(&self) -> bool {
        self.children.iter().all(|child| matches!(child, Node::Text(_)))
    }

    /// Concatenated text of all descendant leaves
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => collect_text(&element.children, out),
            Node::Text(text) => out.push_str(&text.text),
        }
    }
}

/// A document node. Elements are told apart from leaves by their `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.as_element().map(|element| element.kind)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    /// Number of text leaves at or below this node
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Text(_) => 1,
            Node::Element(element) => element.children.iter().map(Node::leaf_count).sum(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// The whole document: an ordered list of root nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            children: vec![Node::Element(Element::with_text(
                BlockKind::Paragraph,
                "A line of text in a paragraph.",
            ))],
        }
    }
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for index in rest {
            node = node.children().get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for index in rest {
            node = match node {
                Node::Element(element) => element.children.get_mut(*index)?,
                Node::Text(_) => return None,
            };
        }
        Some(node)
    }

    /// Child list of the node at `path`, or the root list for an empty path
    pub fn children_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.children);
        }
        match self.node_mut(path)? {
            Node::Element(element) => Some(&mut element.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_at(&self, path: &[usize]) -> Option<&[Node]> {
        if path.is_empty() {
            return Some(&self.children);
        }
        Some(self.node(path)?.children())
    }

    pub fn text_mut(&mut self, path: &[usize]) -> Option<&mut Text> {
        match self.node_mut(path)? {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Paths of all text leaves in document order
    pub fn leaf_paths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        walk_leaves(&self.children, &mut prefix, &mut paths);
        paths
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn walk_leaves(nodes: &[Node], prefix: &mut Path, out: &mut Vec<Path>) {
    for (index, node) in nodes.iter().enumerate() {
        prefix.push(index);
        match node {
            Node::Text(_) => out.push(prefix.clone()),
            Node::Element(element) => walk_leaves(&element.children, prefix, out),
        }
        prefix.pop();
    }
}
