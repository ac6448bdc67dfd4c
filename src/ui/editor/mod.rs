mod input;
mod view;

pub use input::handle_input;
pub use view::show_document;

use crate::engine::MemoryEngine;
use egui::{ScrollArea, Ui};

/// The editable document area: applies this frame's input, then draws
pub fn show(ui: &mut Ui, engine: &mut MemoryEngine) {
    handle_input(ui.ctx(), engine);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| show_document(ui, engine));

    engine.end_tick();
}
