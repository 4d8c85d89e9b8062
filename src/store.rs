use crate::asset::AssetRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ASSETS_FILE: &str = "assets_config.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a valid asset list: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize asset list: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of reading the persisted asset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No list has been saved yet.
    Absent,
    Loaded(Vec<AssetRecord>),
}

impl LoadOutcome {
    /// The saved records, empty when nothing was saved.
    pub fn into_records(self) -> Vec<AssetRecord> {
        match self {
            LoadOutcome::Absent => Vec::new(),
            LoadOutcome::Loaded(records) => records,
        }
    }
}

/// JSON file holding the asset list. Every save replaces the whole file.
#[derive(Debug, Clone)]
pub struct AssetStore {
    path: PathBuf,
}

impl AssetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<LoadOutcome, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no saved asset list");
                return Ok(LoadOutcome::Absent);
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(LoadOutcome::Absent);
        }
        let records: Vec<AssetRecord> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "asset list loaded");
        Ok(LoadOutcome::Loaded(records))
    }

    pub fn save(&self, records: &[AssetRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "asset list saved");
        Ok(())
    }
}
