//! Storage
//!
//! A small string key/value interface modelled on browser local storage, plus
//! two quota-limited implementations.

use std::io;

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Default quota for local stores: 5 MiB.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would take the store past its quota. Nothing was written.
    #[error("storage quota exceeded: {required} bytes required, {quota} available")]
    QuotaExceeded {
        /// Total bytes the store would hold after the write.
        required: u64,

        /// Configured capacity in bytes.
        quota: u64,
    },

    /// The key cannot be stored by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Returns true for quota exhaustion, the only failure that triggers eviction.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// String key/value store.
///
/// Writes are all-or-nothing: a failed `set_item` leaves the previous value
/// (if any) in place.
#[cfg_attr(test, mockall::automock)]
pub trait CartStorage {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] if the store is full, or another
    /// [`StorageError`] if the backend fails.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be listed.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S: CartStorage + ?Sized> CartStorage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

impl<S: CartStorage + ?Sized> CartStorage for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// Bytes an entry counts against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    u64::try_from(key.len().saturating_add(value.len())).unwrap_or(u64::MAX)
}
