//! In-memory storage

use std::collections::BTreeMap;

use super::{CartStorage, StorageError, entry_size};

/// In-memory key/value store with an optional byte quota.
///
/// Usage is measured as the sum of key and value lengths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: Option<u64>,
}

impl MemoryStorage {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses writes beyond `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    /// Bytes currently used.
    pub fn used_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(key, value)| entry_size(key, value))
            .fold(0, u64::saturating_add)
    }

    /// Configured quota, if any.
    pub fn quota(&self) -> Option<u64> {
        self.quota
    }

    /// Changes the quota. Existing entries are kept even if they exceed it.
    pub fn set_quota(&mut self, quota: Option<u64>) {
        self.quota = quota;
    }

    /// Returns true if `key` is stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CartStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let existing = self
                .entries
                .get(key)
                .map_or(0, |previous| entry_size(key, previous));

            let required = self
                .used_bytes()
                .saturating_sub(existing)
                .saturating_add(entry_size(key, value));

            if required > quota {
                return Err(StorageError::QuotaExceeded { required, quota });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
