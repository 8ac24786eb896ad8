//! Backing stores for the registry snapshot.

use std::fs;
use std::io;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::record::RegistrySnapshot;

pub const DEFAULT_DATA_FILE: &str = "ninjas.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access registry file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("registry file '{path}' is not valid: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode registry snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What to do when persisted state exists but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStatePolicy {
    /// Read as an empty registry; the next write replaces the corrupt file.
    #[default]
    TreatAsEmpty,
    Fail,
}

impl CorruptStatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "treat_as_empty" | "empty" => Some(Self::TreatAsEmpty),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Whole-snapshot persistence.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<RegistrySnapshot, StoreError>;
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError>;
}

/// Pretty-printed JSON file. A missing file reads as an empty registry.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    policy: CorruptStatePolicy,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, policy: CorruptStatePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next snapshot is staged in before it replaces `path`.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_DATA_FILE));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<RegistrySnapshot, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "registry file missing, starting empty");
                return Ok(RegistrySnapshot::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.display_path(),
                    source,
                })
            }
        };

        match RegistrySnapshot::from_json(&raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(source) => match self.policy {
                CorruptStatePolicy::TreatAsEmpty => {
                    warn!(
                        path = %self.path.display(),
                        error = %source,
                        "registry file is corrupt, treating it as empty"
                    );
                    Ok(RegistrySnapshot::default())
                }
                CorruptStatePolicy::Fail => Err(StoreError::Corrupt {
                    path: self.display_path(),
                    source,
                }),
            },
        }
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let payload = snapshot.to_json_pretty()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.display_path(),
                source,
            })?;
        }
        // Stage then rename, so the file at `path` is always a complete snapshot.
        let temp_path = self.temp_path();
        fs::write(&temp_path, payload).map_err(|source| StoreError::Io {
            path: temp_path.display().to_string(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.display_path(),
            source,
        })?;
        debug!(path = %self.path.display(), records = snapshot.len(), "registry saved");
        Ok(())
    }
}

/// In-memory store holding the serialized snapshot, so tests exercise the
/// same encode/decode path as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    policy: CorruptStatePolicy,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw contents, e.g. a corrupt payload.
    pub fn with_raw(raw: impl Into<String>, policy: CorruptStatePolicy) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            policy,
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<RegistrySnapshot, StoreError> {
        let Some(raw) = self.raw() else {
            return Ok(RegistrySnapshot::default());
        };
        match RegistrySnapshot::from_json(&raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(_) if self.policy == CorruptStatePolicy::TreatAsEmpty => {
                Ok(RegistrySnapshot::default())
            }
            Err(source) => Err(StoreError::Corrupt {
                path: "<memory>".to_string(),
                source,
            }),
        }
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let payload = snapshot.to_json_pretty()?;
        // The guarded value is a whole payload, so a poisoned lock holds nothing partial.
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload);
        Ok(())
    }
}
