//! Persisted annotator settings.
//!
//! The config lives in `config.json` under the platform data dir, or under a
//! directory given on the command line. The file wraps the settings in a
//! schema version so older builds refuse files written by newer ones.

use directories::ProjectDirs;
use doc_model::AnnotatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SCHEMA_VERSION: u32 = 1;
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Serialize)]
struct StoredConfig<'a> {
    version: u32,
    config: &'a AnnotatorConfig,
}

#[derive(Debug, Deserialize)]
struct LoadedConfig {
    version: u32,
    #[serde(default)]
    config: AnnotatorConfig,
}

/// Where the annotator config is read from and written to.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLocation {
    /// Platform data dir could not be resolved; nothing is persisted.
    Unavailable,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    location: ConfigLocation,
}

impl ConfigStore {
    /// `override_dir` wins over the platform data dir.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        match override_dir {
            Some(dir) => Self::in_dir(dir),
            None => Self::from_default_project().unwrap_or_else(|err| {
                log::warn!("{err}; config will not be persisted");
                Self { location: ConfigLocation::Unavailable }
            }),
        }
    }

    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Inkstamp", "Inkstamp")
            .ok_or(StorageError::NoDataDirectory)?;
        Ok(Self::in_dir(dirs.data_local_dir()))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self { location: ConfigLocation::File(dir.as_ref().join(CONFIG_FILE_NAME)) }
    }

    pub fn location(&self) -> &ConfigLocation {
        &self.location
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            ConfigLocation::File(path) => Some(path),
            ConfigLocation::Unavailable => None,
        }
    }

    /// Stored config with out-of-range values reset, or the defaults when
    /// nothing was saved yet.
    pub fn load(&self) -> Result<AnnotatorConfig, StorageError> {
        let Some(path) = self.path().filter(|path| path.exists()) else {
            log::debug!("no stored config, using defaults");
            return Ok(AnnotatorConfig::default());
        };

        let loaded: LoadedConfig = serde_json::from_slice(&fs::read(path)?)?;
        if loaded.version > CONFIG_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: loaded.version,
                supported: CONFIG_SCHEMA_VERSION,
            });
        }

        Ok(loaded.config.sanitized())
    }

    pub fn save(&self, config: &AnnotatorConfig) -> Result<(), StorageError> {
        let path = self.path().ok_or(StorageError::NoDataDirectory)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = StoredConfig { version: CONFIG_SCHEMA_VERSION, config };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
