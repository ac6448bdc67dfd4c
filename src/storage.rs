// Document persistence through an injected key-value storage

use crate::document::Document;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Key the document is stored under by default
pub const DEFAULT_STORAGE_KEY: &str = "content";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("no data directory available on this platform")]
    NoDataDir,

    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("stored document is not valid: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("could not serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// String key-value storage handed to the editor
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory storage, mostly for tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory holding the files
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage in the platform data directory for the app
    pub fn in_data_dir() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("", "", "richpad").ok_or(StorageError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir()))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }
}

/// Read the document stored under `key`, or the default document if none is
pub fn load_document(storage: &dyn Storage, key: &str) -> Result<Document, PersistError> {
    match storage.get(key)? {
        Some(stored) => {
            debug!("Loading stored document '{}' ({} bytes)", key, stored.len());
            Document::from_json(&stored).map_err(PersistError::Parse)
        }
        None => {
            info!("No stored document under '{}', starting from the default", key);
            Ok(Document::default())
        }
    }
}

/// Load, falling back to the default document if the stored value is unusable
pub fn load_document_or_default(storage: &dyn Storage, key: &str) -> Document {
    load_document(storage, key).unwrap_or_else(|e| {
        warn!("Could not load stored document: {}", e);
        Document::default()
    })
}

/// Serialize the whole document under `key`
pub fn save_document(storage: &mut dyn Storage, key: &str, doc: &Document) -> Result<(), PersistError> {
    let json = doc.to_json().map_err(PersistError::Serialize)?;
    storage.set(key, &json)?;
    debug!("Saved document under '{}' ({} bytes)", key, json.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, Element, Mark, Node};
    use crate::engine::{MemoryEngine, Point, Range};
    use crate::format::toggle_mark;
    use serde_json::json;

    fn heading_doc() -> Document {
        Document::new(vec![Node::Element(Element::with_text(BlockKind::HeadingOne, "Saved"))])
    }

    #[test]
    fn test_missing_value_loads_default() {
        let storage = MemoryStorage::new();
        let doc = load_document(&storage, DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_loads_what_was_saved() {
        let mut storage = MemoryStorage::new();
        save_document(&mut storage, DEFAULT_STORAGE_KEY, &heading_doc()).unwrap();

        let loaded = load_document(&storage, DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(loaded, heading_doc());
    }

    #[test]
    fn test_malformed_value_is_a_parse_error() {
        let mut storage = MemoryStorage::new();
        storage.set(DEFAULT_STORAGE_KEY, "value").unwrap();

        let result = load_document(&storage, DEFAULT_STORAGE_KEY);
        assert!(matches!(result, Err(PersistError::Parse(_))));
        assert_eq!(load_document_or_default(&storage, DEFAULT_STORAGE_KEY), Document::default());
    }

    #[test]
    fn test_unknown_content_survives_edit_and_save() {
        let mut storage = MemoryStorage::new();
        let stored = json!([
            { "type": "table", "children": [{ "text": "x", "strike": true }] },
            { "type": "paragraph", "children": [{ "text": "y" }] }
        ]);
        storage.set(DEFAULT_STORAGE_KEY, &stored.to_string()).unwrap();

        let mut engine = MemoryEngine::new(load_document(&storage, DEFAULT_STORAGE_KEY).unwrap());
        assert!(engine.select(&Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 1))));
        toggle_mark(&mut engine, Mark::Bold);
        assert!(engine.select(&Range::collapsed(Point::new(vec![1, 0], 1))));
        engine.insert_text("z");
        save_document(&mut storage, DEFAULT_STORAGE_KEY, engine.document()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            saved,
            json!([
                { "type": "table", "children": [{ "text": "x", "strike": true, "bold": true }] },
                { "type": "paragraph", "children": [{ "text": "yz" }] }
            ])
        );
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get("content").unwrap(), None);
        save_document(&mut storage, "content", &heading_doc()).unwrap();

        assert!(dir.path().join("nested").join("content.json").exists());
        assert_eq!(load_document(&storage, "content").unwrap(), heading_doc());
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(storage.get("../escape"), Err(StorageError::InvalidKey(_))));
    }
}
