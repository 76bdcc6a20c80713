//! Key/value storage standing in for browser `localStorage`.
//!
//! DESIGN
//! ======
//! `KeyValueStore` mirrors the browser API: string keys, string values,
//! methods on `&self`. Like `localStorage`, a store is a shared handle, so
//! background tasks (the token expiry watcher) can write through the same
//! instance the foreground uses.
//!
//! - `MemoryStore`: in-process map, used by tests and embedders.
//! - `DirStore`: one file per key under a directory, used by the CLI.

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

// =============================================================================
// KEYS
// =============================================================================

pub const LANGUAGE_KEY: &str = "language";
pub const I18N_LANGUAGE_KEY: &str = "i18nLanguage";
pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";
pub const REMEMBER_ME_KEY: &str = "rememberMe";
pub const SCREENS_KEY: &str = "screens";
pub const PANELS_KEY: &str = "panels";
pub const SCREEN_PANEL_MAP_KEY: &str = "screenUuidPanelMap";
pub const SCREEN_LAYOUTS_MAP_KEY: &str = "screenUuidLayoutsMap";
pub const SCREEN_LIST_KEY: &str = "virtualScreenUuidList";
pub const KAKAO_STATE_KEY: &str = "kakao.state";
pub const KAKAO_NONCE_KEY: &str = "kakao.nonce";
pub const OAUTH_CODE_KEY: &str = "code";
pub const SHOW_NEW_BOARD_KEY: &str = "showNewBoard";

/// Key holding one sticky header/footer pin flag.
#[must_use]
pub fn pin_key(name: &str) -> String {
    format!("pin.{name}")
}

// =============================================================================
// TRAIT
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key/value store with `localStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    /// Value for `key`, or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an unset key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

// =============================================================================
// DIRECTORY STORE
// =============================================================================

/// One file per key. Writes go through a temp file and rename.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for DirStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
