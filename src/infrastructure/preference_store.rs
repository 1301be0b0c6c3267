//! Durable preference stores.
//!
//! `MemoryPreferenceStore` keeps values for the lifetime of the process and
//! is shared between clones, which is enough to carry a preference across
//! resolver instances. `FilePreferenceStore` writes a small TOML file.

use crate::application::ports::{PreferenceStore, PreferenceStoreError};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

const APP_DIR: &str = "eunpa-salon";
const PREFERENCES_FILE: &str = "preferences.toml";

/// In-memory store. Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every saved value.
    pub fn clear(&self) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a TOML file of `key = "value"` pairs.
///
/// A missing, unreadable or malformed file reads as empty. Saving rewrites
/// the whole file and creates its parent directories.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/eunpa-salon/preferences.toml`, or `None` when
    /// the platform has no config directory.
    pub fn open_default() -> Option<Self> {
        Self::default_path().map(Self::new)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(APP_DIR);
            path.push(PREFERENCES_FILE);
            path
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };

        toml::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!(path = %self.path.display(), error = %e, "ignoring malformed preferences file");
            BTreeMap::new()
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceStoreError> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&values)
            .map_err(|e| PreferenceStoreError::Encode(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
