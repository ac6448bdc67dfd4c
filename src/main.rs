mod app;
mod config;
mod document;
mod engine;
mod format;
mod keymap;
mod render;
mod storage;
mod ui;

use anyhow::{Context, Result};
use config::EditorConfig;
use document::Document;
use render::render_document;
use std::env;
use std::fs;
use std::path::Path;
use storage::{load_document, load_document_or_default, FileStorage, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Check command-line arguments
    let args: Vec<String> = env::args().collect();

    // RUST_LOG wins over --debug when set
    let debug_mode = args.contains(&String::from("--debug"));
    let default_filter = if debug_mode {
        "debug,richpad=trace,wgpu=warn,naga=warn"
    } else {
        "info,richpad=info,wgpu=error,naga=error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(true)
        .init();

    let mut config = EditorConfig::load_default().context("failed to load config")?;
    config.apply_args(&args);

    if let Some(path) = flag_value(&args, "--render") {
        return print_html(&read_document(Path::new(path))?);
    }

    let storage: Box<dyn Storage> = match &config.data_dir {
        Some(dir) => Box::new(FileStorage::new(dir.clone())),
        None => Box::new(FileStorage::in_data_dir()?),
    };

    if args.iter().any(|arg| arg == "--render-stored") {
        let doc = load_document(storage.as_ref(), &config.storage_key)
            .with_context(|| format!("failed to load stored document '{}'", config.storage_key))?;
        return print_html(&doc);
    }

    let document = load_document_or_default(storage.as_ref(), &config.storage_key);
    info!("Starting editor on '{}'", config.storage_key);
    app::run(app::EditorState::new(config, storage, document));
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn read_document(path: &Path) -> Result<Document> {
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Document::from_json(&json).with_context(|| format!("{} is not a valid document", path.display()))
}

fn print_html(doc: &Document) -> Result<()> {
    println!("{}", render_document(doc).to_html());
    Ok(())
}
