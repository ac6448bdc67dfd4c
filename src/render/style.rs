use crate::document::{BlockKind, Marks};
use egui::text::TextFormat;
use egui::{Color32, FontId, Stroke, Visuals};

const BODY_SIZE: f32 = 15.0;

/// How a text block is drawn in the desktop view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_size: f32,
    pub monospace: bool,

    /// Drawn on a code background
    pub framed: bool,
}

pub fn block_style(kind: BlockKind) -> BlockStyle {
    match kind {
        BlockKind::HeadingOne => BlockStyle {
            font_size: 28.0,
            monospace: false,
            framed: false,
        },
        BlockKind::HeadingTwo => BlockStyle {
            font_size: 21.0,
            monospace: false,
            framed: false,
        },
        BlockKind::Code => BlockStyle {
            font_size: BODY_SIZE - 1.0,
            monospace: true,
            framed: true,
        },
        BlockKind::Paragraph
        | BlockKind::BlockQuote
        | BlockKind::BulletedList
        | BlockKind::NumberedList
        | BlockKind::ListItem
        | BlockKind::Default => BlockStyle {
            font_size: BODY_SIZE,
            monospace: false,
            framed: false,
        },
    }
}

/// egui text format for a leaf. Mirrors the HTML nesting: strong, code, em, u.
pub fn text_format(marks: Marks, block: &BlockStyle, visuals: &Visuals) -> TextFormat {
    let monospace = block.monospace || marks.code;
    let font_id = if monospace {
        FontId::monospace(block.font_size)
    } else {
        FontId::proportional(block.font_size)
    };

    let color = if marks.bold {
        visuals.strong_text_color()
    } else {
        visuals.text_color()
    };

    let background = if marks.code && !block.framed {
        visuals.code_bg_color
    } else {
        Color32::TRANSPARENT
    };

    let underline = if marks.underline {
        Stroke::new(1.0, color)
    } else {
        Stroke::NONE
    };

    TextFormat {
        font_id,
        color,
        background,
        italics: marks.italic,
        underline,
        ..Default::default()
    }
}

/// Marker drawn before the `index`-th item of a list
pub fn list_marker(list: BlockKind, index: usize) -> String {
    match list {
        BlockKind::NumberedList => format!("{}.", index + 1),
        _ => "•".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Mark;

    #[test]
    fn test_headings_are_larger_than_body() {
        let body = block_style(BlockKind::Paragraph).font_size;
        assert!(block_style(BlockKind::HeadingOne).font_size > block_style(BlockKind::HeadingTwo).font_size);
        assert!(block_style(BlockKind::HeadingTwo).font_size > body);
        assert_eq!(block_style(BlockKind::Default), block_style(BlockKind::Paragraph));
    }

    #[test]
    fn test_marks_map_to_text_format() {
        let visuals = Visuals::dark();
        let body = block_style(BlockKind::Paragraph);

        let plain = text_format(Marks::none(), &body, &visuals);
        assert!(!plain.italics);
        assert_eq!(plain.underline, Stroke::NONE);

        let marks = Marks::none().with(Mark::Italic).with(Mark::Underline).with(Mark::Code);
        let styled = text_format(marks, &body, &visuals);
        assert!(styled.italics);
        assert_ne!(styled.underline, Stroke::NONE);
        assert_eq!(styled.font_id, FontId::monospace(body.font_size));
        assert_eq!(styled.background, visuals.code_bg_color);

        let bold = text_format(Marks::none().with(Mark::Bold), &body, &visuals);
        assert_eq!(bold.color, visuals.strong_text_color());
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(list_marker(BlockKind::NumberedList, 2), "3.");
        assert_eq!(list_marker(BlockKind::BulletedList, 2), "•");
    }
}
