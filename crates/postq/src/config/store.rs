//! Persisted settings store.

use std::sync::RwLock;

use crate::config::schema::{Settings, SettingsPatch};
use crate::error::PersistError;
use crate::storage::DocumentStore;

const SETTINGS_DOC: &str = "settings.json";
const SETTINGS_VERSION: u32 = 1;

/// Process-wide settings store. Mutation goes through [`update`] and
/// [`reset`] only; every mutation writes the whole document through to disk
/// when persistence is configured.
///
/// [`update`]: SettingsStore::update
/// [`reset`]: SettingsStore::reset
pub struct SettingsStore {
    inner: RwLock<Settings>,
    docs: Option<DocumentStore>,
}

impl SettingsStore {
    /// Creates an in-memory store initialized from environment defaults.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Settings::from_env()),
            docs: None,
        }
    }

    /// Creates a store backed by `docs`, restoring the persisted settings
    /// document when present.
    pub fn with_persistence(docs: DocumentStore) -> Result<Self, PersistError> {
        let settings = docs
            .load::<Settings>(SETTINGS_DOC, SETTINGS_VERSION)?
            .unwrap_or_else(Settings::from_env);
        Ok(Self {
            inner: RwLock::new(settings),
            docs: Some(docs),
        })
    }

    /// Returns a snapshot of the current settings.
    pub fn current(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                log::warn!("Settings store lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    /// Shallow-merges `patch` into the current settings. Changes apply to
    /// subsequent requests only, never retroactively to in-flight ones.
    pub fn update(&self, patch: SettingsPatch) -> Settings {
        let mut guard = self.write();
        let merged = guard.merged(patch);
        *guard = merged;
        let settings = guard.clone();
        drop(guard);
        self.persist(&settings);
        settings
    }

    /// Restores the process defaults.
    pub fn reset(&self) -> Settings {
        let settings = Settings::from_env();
        let mut guard = self.write();
        *guard = settings.clone();
        drop(guard);
        self.persist(&settings);
        settings
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Settings store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn persist(&self, settings: &Settings) {
        if let Some(docs) = &self.docs {
            if let Err(e) = docs.save(SETTINGS_DOC, SETTINGS_VERSION, settings) {
                log::error!("Failed to persist settings: {}", e);
            }
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
