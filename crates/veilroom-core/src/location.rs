//! Where the room key and room id are read from and written back to.
//!
//! The key lives in the URL fragment and the room id in the URL path and in
//! persistent client storage. Both are abstracted so the engine runs the same
//! against a browser-style URL, a CLI argument, or an in-memory fixture.

use std::collections::HashMap;

use crate::StorageError;

/// A mutable URL-like location.
///
/// Setting the fragment or path MUST NOT trigger navigation or a reload.
pub trait Location {
    /// Fragment without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;

    /// Replace the fragment.
    fn set_fragment(&mut self, fragment: &str);

    /// Path component, with its leading `/`.
    fn path(&self) -> String;

    /// Replace the path.
    fn set_path(&mut self, path: &str);
}

/// Persistent key-value client storage.
pub trait Storage {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory [`Location`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocation {
    /// Current path
    pub path: String,
    /// Current fragment
    pub fragment: Option<String>,
}

impl MemoryLocation {
    /// Location with the given path and fragment.
    pub fn new(path: impl Into<String>, fragment: Option<&str>) -> Self {
        Self { path: path.into(), fragment: fragment.map(str::to_owned) }
    }
}

impl Location for MemoryLocation {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_owned());
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn set_path(&mut self, path: &str) {
        self.path = path.to_owned();
    }
}

/// In-memory [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
