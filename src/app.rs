use bevy::prelude::*;
use bevy_egui::egui;
use bevy_egui::egui::{Frame, ScrollArea};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::engine::{Direction, MemoryEngine};
use crate::render::render_document;
use crate::storage::{save_document, Storage};
use crate::ui::{editor, Toolbar};
use tracing::{debug, error, info};

/// Everything the editor window works on
#[derive(Resource)]
pub struct EditorState {
    engine: MemoryEngine,
    storage: Box<dyn Storage>,
    config: EditorConfig,

    /// Engine version last written to storage
    saved_version: u64,

    // UI state
    dark_mode: bool,
    show_html: bool,
}

impl EditorState {
    pub fn new(config: EditorConfig, storage: Box<dyn Storage>, document: Document) -> Self {
        let mut engine = MemoryEngine::new(document);
        // Start with the caret at the end of the document
        engine.select_all();
        engine.move_cursor(Direction::DocumentEnd, false);

        Self {
            saved_version: engine.version(),
            engine,
            storage,
            dark_mode: config.dark_mode,
            config,
            show_html: false,
        }
    }

    fn is_dirty(&self) -> bool {
        self.engine.version() != self.saved_version
    }

    fn save(&mut self) {
        let version = self.engine.version();
        match save_document(self.storage.as_mut(), &self.config.storage_key, self.engine.document()) {
            Ok(()) => debug!("Saved version {}", version),
            Err(e) => error!("Failed to save document: {}", e),
        }
        // Failed saves are retried on the next change, not every frame
        self.saved_version = version;
    }
}

pub fn run(state: EditorState) {
    info!("Opening editor window");
    let title = state.config.window_title.clone();
    let resolution = (state.config.window_width, state.config.window_height);

    App::new()
        // One tracing subscriber is installed in main, so no LogPlugin
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<bevy::log::LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title,
                        resolution: resolution.into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(bevy_egui::EguiPlugin)
        .insert_resource(state)
        .add_systems(Startup, setup_system)
        .add_systems(Update, (ui_system, autosave_system).chain())
        .run();
}

fn setup_system(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn ui_system(mut contexts: bevy_egui::EguiContexts, mut state: ResMut<EditorState>) {
    let ctx = contexts.ctx_mut();
    let state = &mut *state;

    if state.dark_mode {
        ctx.set_visuals(egui::Visuals::dark());
    } else {
        ctx.set_visuals(egui::Visuals::light());
    }

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            Toolbar::show(ui, &mut state.engine);
            ui.separator();

            ui.add_enabled_ui(state.engine.history().can_undo(), |ui| {
                if ui.button("↶").on_hover_text("undo").clicked() {
                    state.engine.undo();
                }
            });
            ui.add_enabled_ui(state.engine.history().can_redo(), |ui| {
                if ui.button("↷").on_hover_text("redo").clicked() {
                    state.engine.redo();
                }
            });
            ui.separator();

            ui.toggle_value(&mut state.show_html, "HTML");
            ui.checkbox(&mut state.dark_mode, "Dark Mode");
            if !state.config.autosave && ui.add_enabled(state.is_dirty(), egui::Button::new("Save")).clicked() {
                state.save();
            }
        });
    });

    if state.show_html {
        let html = render_document(state.engine.document()).to_html();
        egui::Window::new("HTML")
            .open(&mut state.show_html)
            .default_size([480.0, 320.0])
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    ui.monospace(html);
                });
            });
    }

    egui::CentralPanel::default()
        .frame(Frame::central_panel(&ctx.style()).inner_margin(egui::Margin::same(16)))
        .show(ctx, |ui| editor::show(ui, &mut state.engine));
}

fn autosave_system(mut state: ResMut<EditorState>) {
    if state.config.autosave && state.is_dirty() {
        state.save();
    }
}
