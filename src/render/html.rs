use crate::document::{BlockKind, Document, Node, Text};
use std::fmt::Write;

/// HTML tags produced by the presentation mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    Blockquote,
    Ul,
    Ol,
    Li,
    Pre,
    Code,
    Span,
    Strong,
    Em,
    U,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::Blockquote => "blockquote",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Pre => "pre",
            Tag::Code => "code",
            Tag::Span => "span",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::U => "u",
        }
    }
}

/// A rendered element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Html {
    Element {
        tag: Tag,
        attributes: Vec<(&'static str, String)>,
        children: Vec<Html>,
    },
    Text(String),
}

impl Html {
    pub fn element(tag: Tag, children: Vec<Html>) -> Self {
        Html::Element {
            tag,
            attributes: Vec::new(),
            children,
        }
    }

    pub fn with_attribute(mut self, name: &'static str, value: &str) -> Self {
        if let Html::Element { attributes, .. } = &mut self {
            attributes.push((name, value.to_string()));
        }
        self
    }

    /// Serialize to markup, escaping text and attribute values
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Html::Text(text) => escape_into(text, out),
            Html::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag.name());
                for (name, value) in attributes {
                    let _ = write!(out, " {}=\"", name);
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_to(out);
                }
                let _ = write!(out, "</{}>", tag.name());
            }
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Visual for a block element around its rendered children
pub fn render_element(kind: BlockKind, children: Vec<Html>) -> Html {
    let tag = match kind {
        BlockKind::Paragraph | BlockKind::Default => Tag::P,
        BlockKind::HeadingOne => Tag::H1,
        BlockKind::HeadingTwo => Tag::H2,
        BlockKind::BlockQuote => Tag::Blockquote,
        BlockKind::BulletedList => Tag::Ul,
        BlockKind::NumberedList => Tag::Ol,
        BlockKind::ListItem => Tag::Li,
        BlockKind::Code => {
            return Html::element(Tag::Pre, vec![Html::element(Tag::Code, children)]);
        }
    };
    Html::element(tag, children)
}

/// Visual for a text leaf.
///
/// Marks nest from the text outwards: strong, code, em, u.
pub fn render_leaf(leaf: &Text) -> Html {
    let mut content = Html::Text(leaf.text.clone());

    if leaf.marks.bold {
        content = Html::element(Tag::Strong, vec![content]);
    }
    if leaf.marks.code {
        content = Html::element(Tag::Code, vec![content]);
    }
    if leaf.marks.italic {
        content = Html::element(Tag::Em, vec![content]);
    }
    if leaf.marks.underline {
        content = Html::element(Tag::U, vec![content]);
    }

    Html::element(Tag::Span, vec![content])
}

pub fn render_node(node: &Node) -> Html {
    match node {
        Node::Text(text) => render_leaf(text),
        Node::Element(element) => render_element(
            element.kind,
            element.children.iter().map(render_node).collect(),
        ),
    }
}

/// The whole document inside the editor container
pub fn render_document(doc: &Document) -> Html {
    Html::element(Tag::Div, doc.children.iter().map(render_node).collect())
        .with_attribute("class", "richpad-editor")
}
