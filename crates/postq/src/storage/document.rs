//! Versioned whole-document JSON persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Envelope wrapping every persisted document. The version tag travels with
/// the blob so schema fields can be added over time.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Synchronous write-through persistence for full JSON documents.
///
/// Every save serializes the whole document and atomically replaces the
/// previous file. There is no partial or incremental persistence.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Opens a document store rooted at `dir`, creating the directory when
    /// missing.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PersistError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// Default data directory for the current platform.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("postq")
    }

    /// Full path of a named document.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Loads a document. Returns `Ok(None)` when the file does not exist or
    /// when its version is newer than `version` (a newer schema is refused
    /// rather than half-read).
    pub fn load<T: DeserializeOwned>(
        &self,
        name: &str,
        version: u32,
    ) -> Result<Option<T>, PersistError> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::ReadDocument { path, source: e }),
        };

        let envelope: Envelope<T> =
            serde_json::from_str(&raw).map_err(|e| PersistError::ParseDocument {
                path: path.clone(),
                source: e,
            })?;

        if envelope.version > version {
            log::warn!(
                "Document '{}' has version {} but only {} is supported, ignoring",
                name,
                envelope.version,
                version
            );
            return Ok(None);
        }

        Ok(Some(envelope.state))
    }

    /// Serializes the whole document and atomically replaces the previous
    /// one (write to a temp file, then rename).
    pub fn save<T: Serialize>(
        &self,
        name: &str,
        version: u32,
        state: &T,
    ) -> Result<(), PersistError> {
        let envelope = Envelope { version, state };
        let json = serde_json::to_string_pretty(&envelope).map_err(|e| {
            PersistError::SerializeDocument {
                name: name.to_string(),
                source: e,
            }
        })?;

        let path = self.path(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, json).map_err(|e| PersistError::WriteDocument {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| PersistError::WriteDocument { path, source: e })?;

        Ok(())
    }
}
