//! Synchronous key/value storage contracts for persisted JSON blobs.
//!
//! The contract mirrors browser `localStorage`: every value is a JSON string stored under a
//! fixed key, reads and writes complete on the calling turn, and a write replaces the previous
//! value wholesale.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised by [`KeyValueStore`] implementations and typed helpers.
pub enum StorageError {
    /// The backing store is not reachable in this environment.
    #[error("storage unavailable")]
    Unavailable,
    /// The backing store rejected the operation (quota, permissions, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A value could not be converted to or from JSON.
    #[error("storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Host service persisting raw JSON strings by key.
pub trait KeyValueStore {
    /// Loads the raw JSON string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the raw JSON string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the write.
    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError>;

    /// Deletes the value stored under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the delete.
    fn delete_raw(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for unsupported targets: reads are empty and writes succeed.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn load_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn save_raw(&self, _key: &str, _raw_json: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn delete_raw(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by string. Clones share the same entries.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.inner.borrow().keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
        Ok(())
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load_raw(key)
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        (**self).save_raw(key, raw_json)
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete_raw(key)
    }
}

/// Loads and deserializes a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when the store read fails or the stored JSON does not match `T`.
pub fn load_typed_with<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.load_raw(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn save_typed_with<S: KeyValueStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.save_raw(key, &raw)
}
