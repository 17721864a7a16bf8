//! JSON file storage for client state.
//!
//! Holds the remembered room id and nickname as a flat JSON object. Every
//! write rewrites the whole file.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use veilroom_core::{StorageError, location::Storage};

/// File name inside the per-user config directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// [`Storage`] persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Default location: `<config dir>/veilroom/state.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("veilroom").join(STATE_FILE_NAME))
    }

    /// Load the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| storage_error(&path, e))?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(storage_error(&path, err)),
        };
        Ok(Self { path, values })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let text =
            serde_json::to_string_pretty(&self.values).map_err(|e| storage_error(&self.path, e))?;
        fs::write(&self.path, text).map_err(|e| storage_error(&self.path, e))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.values.get(key).is_some_and(|v| v == value) {
            return Ok(());
        }
        self.values.insert(key.to_owned(), value.to_owned());
        self.persist()
    }
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> StorageError {
    StorageError { reason: format!("{}: {err}", path.display()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("state.json")).unwrap();
        assert_eq!(storage.get("room"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set("room", "0123456789abcdef").unwrap();
        storage.set("nickname", "alice").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("room").as_deref(), Some("0123456789abcdef"));
        assert_eq!(reopened.get("nickname").as_deref(), Some("alice"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(err.reason.contains("state.json"));
    }
}
