//! On-disk editor configuration
//!
//! The config is stored as a versioned JSON envelope so older builds can refuse
//! files written by newer ones instead of silently dropping fields.

use directories::ProjectDirs;
use editor_core::{ConfigError, EditorConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SCHEMA_VERSION: u32 = 1;
const CONFIG_FILE_NAME: &str = "editor-config.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config schema version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: EditorConfig,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "StampKit", "StampKit")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.config_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Stored config, or defaults when nothing has been saved yet
    pub fn load_config(&self) -> Result<EditorConfig, StorageError> {
        let path = self.config_path();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(EditorConfig::default());
        }

        let bytes = fs::read(&path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > CONFIG_SCHEMA_VERSION {
            return Err(StorageError::VersionTooNew {
                found: envelope.version,
                supported: CONFIG_SCHEMA_VERSION,
            });
        }

        envelope.config.validate()?;
        Ok(envelope.config)
    }

    pub fn save_config(&self, config: &EditorConfig) -> Result<PathBuf, StorageError> {
        config.validate()?;
        fs::create_dir_all(&self.root)?;

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: config.clone() };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let path = self.config_path();
        fs::write(&path, bytes)?;
        log::debug!("saved config to {}", path.display());
        Ok(path)
    }
}
