use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag of a block element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Code,
    /// Fallback for elements with a missing or unrecognized tag
    #[default]
    Default,
}

/// Containers that hold `ListItem` children
pub const LIST_KINDS: [BlockKind; 2] = [BlockKind::NumberedList, BlockKind::BulletedList];

impl BlockKind {
    /// Every kind a user can ask for by name
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Paragraph,
        BlockKind::HeadingOne,
        BlockKind::HeadingTwo,
        BlockKind::BlockQuote,
        BlockKind::BulletedList,
        BlockKind::NumberedList,
        BlockKind::ListItem,
        BlockKind::Code,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::HeadingOne => "heading-one",
            BlockKind::HeadingTwo => "heading-two",
            BlockKind::BlockQuote => "block-quote",
            BlockKind::BulletedList => "bulleted-list",
            BlockKind::NumberedList => "numbered-list",
            BlockKind::ListItem => "list-item",
            BlockKind::Code => "code",
            BlockKind::Default => "default",
        }
    }

    /// Parse a tag leniently. Unknown tags become `Default`; the element keeps
    /// the tag it was read with.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "paragraph" => BlockKind::Paragraph,
            // older documents used the short tag
            "heading-one" | "h1" => BlockKind::HeadingOne,
            "heading-two" => BlockKind::HeadingTwo,
            "block-quote" => BlockKind::BlockQuote,
            "bulleted-list" => BlockKind::BulletedList,
            "numbered-list" => BlockKind::NumberedList,
            "list-item" => BlockKind::ListItem,
            "code" => BlockKind::Code,
            _ => BlockKind::Default,
        }
    }

    pub fn is_list(&self) -> bool {
        LIST_KINDS.contains(self)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Inline formatting flag carried by text leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Bold, Mark::Italic, Mark::Underline, Mark::Code];

    pub fn name(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Code => "code",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mark::ALL
            .into_iter()
            .find(|mark| mark.name() == s)
            .ok_or_else(|| format!("Unknown mark '{}'", s))
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// The set of marks on a text leaf.
///
/// Serialized flattened into the leaf, with unset flags omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

impl Marks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        let flag = match mark {
            Mark::Bold => &mut self.bold,
            Mark::Italic => &mut self.italic,
            Mark::Underline => &mut self.underline,
            Mark::Code => &mut self.code,
        };
        *flag = value;
    }

    /// Removes `mark` if it is set, sets it otherwise
    pub fn toggled(mut self, mark: Mark) -> Self {
        let active = self.has(mark);
        self.set(mark, !active);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_falls_back_to_default() {
        assert_eq!(BlockKind::from_tag("table"), BlockKind::Default);
        assert_eq!(BlockKind::from_tag(""), BlockKind::Default);
        assert_eq!(BlockKind::from_tag("h1"), BlockKind::HeadingOne);
    }

    #[test]
    fn test_tags_parse_back() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_tag(kind.tag()), kind);
        }
    }

    #[test]
    fn test_only_numbered_and_bulleted_are_lists() {
        let lists: Vec<_> = BlockKind::ALL.into_iter().filter(|k| k.is_list()).collect();
        assert_eq!(lists, vec![BlockKind::BulletedList, BlockKind::NumberedList]);
    }

    #[test]
    fn test_toggling_twice_restores_marks() {
        let start = Marks::none().with(Mark::Italic);
        for mark in Mark::ALL {
            assert_eq!(start.toggled(mark).toggled(mark), start);
            assert_ne!(start.toggled(mark), start);
        }
    }

    #[test]
    fn test_marks_serialize_without_unset_flags() {
        let marks = Marks::none().with(Mark::Bold);
        let json = serde_json::to_value(marks).unwrap();
        assert_eq!(json, serde_json::json!({ "bold": true }));
    }

    #[test]
    fn test_mark_from_name() {
        assert_eq!("underline".parse::<Mark>(), Ok(Mark::Underline));
        assert!("strike".parse::<Mark>().is_err());
    }
}
