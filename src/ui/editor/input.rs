use crate::engine::{Direction, MemoryEngine};
use crate::format::toggle_mark;
use crate::keymap::{action_for, KeyAction, KeyChord};
use egui::{Event, Key, Modifiers};
use tracing::trace;

/// Feed this frame's keyboard and clipboard events into the engine.
///
/// Returns true if any event was consumed.
pub fn handle_input(ctx: &egui::Context, engine: &mut MemoryEngine) -> bool {
    // Another widget is taking text
    if ctx.wants_keyboard_input() {
        return false;
    }

    let events = ctx.input(|i| i.events.clone());
    let mut handled = false;
    for event in events {
        handled |= handle_event(ctx, engine, event);
        engine.end_tick();
    }
    handled
}

fn handle_event(ctx: &egui::Context, engine: &mut MemoryEngine, event: Event) -> bool {
    match event {
        Event::Text(text) | Event::Paste(text) => {
            engine.insert_text(&text);
            true
        }
        Event::Copy => {
            copy_selection(ctx, engine);
            true
        }
        Event::Cut => {
            copy_selection(ctx, engine);
            engine.delete_selection();
            true
        }
        Event::Key {
            key,
            pressed: true,
            modifiers,
            ..
        } => handle_key(engine, key, modifiers),
        _ => false,
    }
}

fn copy_selection(ctx: &egui::Context, engine: &MemoryEngine) {
    let text = engine.selected_text();
    if !text.is_empty() {
        ctx.copy_text(text);
    }
}

fn handle_key(engine: &mut MemoryEngine, key: Key, modifiers: Modifiers) -> bool {
    if let Some(action) = KeyChord::from_egui(key, modifiers).and_then(|chord| action_for(&chord)) {
        trace!("Shortcut {:?}", action);
        match action {
            KeyAction::ToggleMark(mark) => toggle_mark(engine, mark),
            KeyAction::Undo => {
                engine.undo();
            }
            KeyAction::Redo => {
                engine.redo();
            }
            KeyAction::SelectAll => engine.select_all(),
        }
        return true;
    }

    let direction = match key {
        Key::Enter => {
            engine.insert_break();
            return true;
        }
        Key::Backspace => {
            engine.delete_backward();
            return true;
        }
        Key::Delete => {
            engine.delete_forward();
            return true;
        }
        Key::ArrowLeft => Direction::Left,
        Key::ArrowRight => Direction::Right,
        Key::ArrowUp => Direction::Up,
        Key::ArrowDown => Direction::Down,
        Key::Home if modifiers.command => Direction::DocumentStart,
        Key::Home => Direction::BlockStart,
        Key::End if modifiers.command => Direction::DocumentEnd,
        Key::End => Direction::BlockEnd,
        _ => return false,
    };

    engine.move_cursor(direction, modifiers.shift);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, Document};
    use crate::engine::{EditorEngine, Point, Range};

    fn engine_at_end() -> MemoryEngine {
        let mut engine = MemoryEngine::new(Document::default());
        engine.select_all();
        engine.move_cursor(Direction::DocumentEnd, false);
        engine
    }

    fn command() -> Modifiers {
        Modifiers {
            command: true,
            ctrl: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_mod_b_toggles_pending_bold() {
        let mut engine = engine_at_end();
        assert!(handle_key(&mut engine, Key::B, command()));
        assert!(engine.current_marks().unwrap().bold);
    }

    #[test]
    fn test_plain_letter_key_is_not_a_shortcut() {
        let mut engine = engine_at_end();
        assert!(!handle_key(&mut engine, Key::B, Modifiers::default()));
    }

    #[test]
    fn test_text_enter_and_undo() {
        let ctx = egui::Context::default();
        let mut engine = engine_at_end();

        handle_event(&ctx, &mut engine, Event::Text("!".to_string()));
        engine.end_tick();
        assert!(engine.document().plain_text().ends_with("paragraph.!"));

        handle_key(&mut engine, Key::Enter, Modifiers::default());
        engine.end_tick();
        assert_eq!(engine.document().children.len(), 2);
        assert_eq!(engine.document().children[1].kind(), Some(BlockKind::Paragraph));

        handle_key(&mut engine, Key::Z, command());
        assert_eq!(engine.document().children.len(), 1);
    }

    #[test]
    fn test_shift_arrow_extends_selection() {
        let mut engine = engine_at_end();
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };
        handle_key(&mut engine, Key::ArrowLeft, shift);
        handle_key(&mut engine, Key::ArrowLeft, shift);

        let selection = engine.selection().unwrap();
        assert_eq!(
            selection,
            Range::new(Point::new(vec![0, 0], 30), Point::new(vec![0, 0], 28))
        );
        assert_eq!(engine.selected_text(), "h.");
    }
}
