//! Persistent key-value storage seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store persists tokens and profile data through
//! [`KeyValueStore`]. In the browser that is `window.localStorage`
//! ([`LocalStorage`], csr only); [`MemoryStore`] backs native tests and is the
//! fallback when the browser refuses storage access (private mode, disabled
//! cookies), in which case sessions simply do not survive a reload.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::StorageError;

/// Synchronous string-keyed storage.
pub trait KeyValueStore {
    /// Read `key`, `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the backend rejects the read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the backend rejects the write
    /// (quota exceeded, storage disabled).
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory [`KeyValueStore`] scoped to the page lifetime.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, handy for simulating a reload.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
        Self { entries: RefCell::new(map) }
    }

    /// Copy of every stored entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// [`KeyValueStore`] over `window.localStorage`.
#[cfg(feature = "csr")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(feature = "csr")]
impl LocalStorage {
    /// Open the origin's local storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] outside a window context or when
    /// the browser denies access.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_owned()))?;
        Ok(Self { storage })
    }
}

#[cfg(feature = "csr")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}
