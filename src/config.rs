use crate::storage::DEFAULT_STORAGE_KEY;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration settings for the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Title of the editor window
    pub window_title: String,

    /// Initial window size in logical pixels
    pub window_width: f32,
    pub window_height: f32,

    /// Whether to use the dark theme
    pub dark_mode: bool,

    /// Storage key the document is saved under
    pub storage_key: String,

    /// Whether to save the document after every change
    pub autosave: bool,

    /// Directory for stored documents, defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_title: "richpad".to_string(),
            window_width: 960.0,
            window_height: 720.0,
            dark_mode: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave: true,
            data_dir: None,
        }
    }
}

impl EditorConfig {
    /// Location of `config.json` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "richpad").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load the config at `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the platform config directory when it exists
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides: `--data-dir <dir>`, `--no-autosave`,
    /// `--key <name>`
    pub fn apply_args(&mut self, args: &[String]) {
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--data-dir" => {
                    if let Some(dir) = iter.next() {
                        self.data_dir = Some(PathBuf::from(dir));
                    }
                }
                "--key" => {
                    if let Some(key) = iter.next() {
                        self.storage_key = key.clone();
                    }
                }
                "--no-autosave" => self.autosave = false,
                _ => {}
            }
        }
    }
}
