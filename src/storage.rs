//! Storage
//!
//! Client-side key-value persistence behind a trait seam. The storefront shell
//! supplies the real store; [`MemoryStore`] backs tests and [`FileStore`]
//! persists each key as a JSON document on disk. Reads and writes are atomic
//! per operation.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Key under which the serialized cart envelope is persisted.
pub const CART_KEY: &str = "cart";

/// Key under which the "use cagnotte" flag is persisted.
pub const USE_CAGNOTTE_KEY: &str = "use_cagnotte";

/// Errors raised by key-value stores.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An underlying I/O failure.
    #[error("storage i/o error")]
    Io(#[from] io::Error),

    /// A stored value could not be parsed.
    #[error("stored value could not be parsed")]
    Corrupt(#[from] serde_json::Error),
}

/// A string key-value store with atomic per-operation semantics.
pub trait KeyValueStore {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// An in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);

        Ok(())
    }
}

/// A store that persists each key as `<dir>/<key>.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(fs::write(self.path_for(key), value)?)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
