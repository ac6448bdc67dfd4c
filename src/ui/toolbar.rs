use crate::document::{BlockKind, Mark};
use crate::engine::EditorEngine;
use crate::format::{is_format_active, toggle_format, Format};
use egui::{Button, RichText, Ui};
use tracing::debug;

/// Buttons shown on the toolbar, left to right
pub const TOOLBAR_FORMATS: [Format; 9] = [
    Format::Mark(Mark::Bold),
    Format::Mark(Mark::Italic),
    Format::Mark(Mark::Underline),
    Format::Mark(Mark::Code),
    Format::Block(BlockKind::HeadingOne),
    Format::Block(BlockKind::HeadingTwo),
    Format::Block(BlockKind::BlockQuote),
    Format::Block(BlockKind::NumberedList),
    Format::Block(BlockKind::BulletedList),
];

fn label(format: Format) -> RichText {
    match format {
        Format::Mark(Mark::Bold) => RichText::new("B").strong(),
        Format::Mark(Mark::Italic) => RichText::new("I").italics(),
        Format::Mark(Mark::Underline) => RichText::new("U").underline(),
        Format::Mark(Mark::Code) => RichText::new("<>").code(),
        Format::Block(BlockKind::HeadingOne) => RichText::new("H1"),
        Format::Block(BlockKind::HeadingTwo) => RichText::new("H2"),
        Format::Block(BlockKind::BlockQuote) => RichText::new("❝"),
        Format::Block(BlockKind::NumberedList) => RichText::new("1."),
        Format::Block(BlockKind::BulletedList) => RichText::new("•"),
        Format::Block(kind) => RichText::new(kind.tag()),
    }
}

/// Row of format buttons over an engine. Holds no state of its own.
pub struct Toolbar;

impl Toolbar {
    /// Draw the buttons. A click toggles its format and returns it.
    pub fn show(ui: &mut Ui, engine: &mut impl EditorEngine) -> Option<Format> {
        let mut clicked = None;
        ui.horizontal(|ui| {
            for format in TOOLBAR_FORMATS {
                let active = is_format_active(&*engine, format);
                let response = ui
                    .add(Button::new(label(format)).selected(active))
                    .on_hover_text(format.name());
                if response.clicked() {
                    // Keys belong to the document, not the button
                    response.surrender_focus();
                    debug!("Toolbar toggled {}", format);
                    toggle_format(engine, format);
                    clicked = Some(format);
                }
            }
        });
        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, Point, Range};
    use crate::format::is_mark_active;
    use egui::{pos2, vec2, CentralPanel, Context, Event, Modifiers, PointerButton, Pos2, RawInput, Rect};
    use serde_json::json;

    fn abc() -> MemoryEngine {
        let mut engine = MemoryEngine::new(
            serde_json::from_value(json!([{ "type": "paragraph", "children": [{ "text": "abc" }] }])).unwrap(),
        );
        assert!(engine.select(&Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 3))));
        engine
    }

    // One frame with the toolbar at the top of the screen. Returns what the
    // toolbar reported and where it was drawn.
    fn frame(ctx: &Context, engine: &mut MemoryEngine, events: Vec<Event>) -> (Option<Format>, Rect) {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let mut clicked = None;
        let mut rect = Rect::NOTHING;
        let _ = ctx.run(input, |ctx| {
            CentralPanel::default().show(ctx, |ui| {
                let shown = ui.scope(|ui| Toolbar::show(ui, engine));
                clicked = shown.inner;
                rect = shown.response.rect;
            });
        });
        (clicked, rect)
    }

    fn click(ctx: &Context, engine: &mut MemoryEngine, pos: Pos2) -> Option<Format> {
        let button = |pressed| Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        };
        frame(ctx, engine, vec![Event::PointerMoved(pos), button(true)]);
        frame(ctx, engine, vec![button(false)]).0
    }

    #[test]
    fn test_idle_frame_changes_nothing() {
        let ctx = Context::default();
        let mut engine = abc();
        let version = engine.version();

        let (clicked, rect) = frame(&ctx, &mut engine, Vec::new());

        assert_eq!(clicked, None);
        assert!(rect.width() > 0.0);
        assert_eq!(engine.version(), version);
    }

    #[test]
    fn test_clicking_bold_toggles_the_selection() {
        let ctx = Context::default();
        let mut engine = abc();
        let (_, rect) = frame(&ctx, &mut engine, Vec::new());
        // The first button is bold
        let bold = pos2(rect.left() + 6.0, rect.center().y);

        assert_eq!(click(&ctx, &mut engine, bold), Some(Format::Mark(Mark::Bold)));
        assert!(is_mark_active(&engine, Mark::Bold));
        assert_eq!(
            serde_json::to_value(engine.document()).unwrap(),
            json!([{ "type": "paragraph", "children": [{ "text": "abc", "bold": true }] }])
        );

        assert_eq!(click(&ctx, &mut engine, bold), Some(Format::Mark(Mark::Bold)));
        assert!(!is_mark_active(&engine, Mark::Bold));
    }

    // Whether any button was painted with the selection fill
    fn paints_selected(engine: &mut MemoryEngine) -> bool {
        let ctx = Context::default();
        let fill = ctx.style().visuals.selection.bg_fill;
        let mut output = None;
        for _ in 0..2 {
            output = Some(ctx.run(RawInput::default(), |ctx| {
                CentralPanel::default().show(ctx, |ui| {
                    Toolbar::show(ui, engine);
                });
            }));
        }
        output.is_some_and(|output| {
            output.shapes.iter().any(|clipped| match &clipped.shape {
                egui::Shape::Rect(rect) => rect.fill == fill,
                _ => false,
            })
        })
    }

    #[test]
    fn test_active_format_shows_selected() {
        let mut engine = abc();
        assert!(!paints_selected(&mut engine));

        toggle_format(&mut engine, Format::Mark(Mark::Bold));
        assert!(paints_selected(&mut engine));
    }

    #[test]
    fn test_toolbar_order() {
        let names: Vec<&str> = TOOLBAR_FORMATS.iter().map(Format::name).collect();
        assert_eq!(
            names,
            [
                "bold",
                "italic",
                "underline",
                "code",
                "heading-one",
                "heading-two",
                "block-quote",
                "numbered-list",
                "bulleted-list"
            ]
        );
    }

    #[test]
    fn test_names_parse_back() {
        for format in TOOLBAR_FORMATS {
            assert_eq!(format.name().parse::<Format>(), Ok(format));
        }
    }
}
