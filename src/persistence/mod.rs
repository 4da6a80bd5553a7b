//! Persistence
//!
//! Reads and writes cart snapshots through a [`CartStorage`].
//!
//! Loading fails open: a missing, unreadable or corrupt snapshot is an empty
//! cart. Saving recovers from quota exhaustion by evicting every cart that
//! belongs to another account scope and retrying once. If the retry also
//! fails, the active scope's snapshot is removed rather than left stale.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    accounts::StorageKey,
    items::LineItem,
    storage::{CartStorage, StorageError},
};

mod records;

use records::LineItemRecord;

/// Errors that stop a snapshot from being written.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The snapshot could not be encoded.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of a write-through.
#[derive(Debug)]
pub enum PersistOutcome {
    /// Written on the first attempt.
    Saved,

    /// Written after evicting other scopes' carts.
    SavedAfterEviction {
        /// Storage keys that were evicted.
        evicted: Vec<String>,
    },

    /// Still over quota after eviction; the active snapshot was removed.
    Dropped {
        /// Storage keys that were evicted before giving up.
        evicted: Vec<String>,

        /// The error from the retry.
        error: StorageError,
    },

    /// The write failed for a reason other than quota.
    Failed(PersistError),
}

impl PersistOutcome {
    /// Returns true if the snapshot now matches what was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved | Self::SavedAfterEviction { .. })
    }
}

/// Snapshot reader/writer over a storage backend.
#[derive(Debug, Clone, Default)]
pub struct CartPersistence<S> {
    storage: S,
}

impl<S: CartStorage> CartPersistence<S> {
    /// Wraps a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The wrapped storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Unwraps the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Loads the snapshot stored under `key`.
    ///
    /// Returns an empty list when there is no snapshot or it cannot be read or
    /// decoded. Individual records that cannot form a line item are skipped.
    pub fn load(&self, key: &StorageKey) -> Vec<LineItem> {
        let raw = match self.storage.get_item(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "no cart snapshot found");
                return Vec::new();
            }
            Err(error) => {
                warn!(%key, %error, "failed to read cart snapshot, starting empty");
                return Vec::new();
            }
        };

        let records: Vec<LineItemRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(error) => {
                warn!(%key, %error, "discarding unreadable cart snapshot");
                return Vec::new();
            }
        };

        let total = records.len();

        let items: Vec<LineItem> = records
            .into_iter()
            .filter_map(LineItemRecord::into_line_item)
            .collect();

        if items.len() < total {
            warn!(
                %key,
                skipped = total - items.len(),
                "skipped invalid line items in cart snapshot"
            );
        }

        debug!(%key, items = items.len(), "loaded cart snapshot");

        items
    }

    /// Writes `items` under `key`, evicting other scopes' carts if the store is full.
    pub fn save(&mut self, key: &StorageKey, items: &[LineItem]) -> PersistOutcome {
        let snapshot = match encode(items) {
            Ok(snapshot) => snapshot,
            Err(error) => return PersistOutcome::Failed(error.into()),
        };

        match self.storage.set_item(key.as_str(), &snapshot) {
            Ok(()) => {
                debug!(%key, items = items.len(), "persisted cart snapshot");
                return PersistOutcome::Saved;
            }
            Err(error) if error.is_quota_exceeded() => {
                warn!(%key, %error, "storage quota exceeded, evicting other carts");
            }
            Err(error) => return PersistOutcome::Failed(error.into()),
        }

        let evicted = self.evict_foreign_carts(key);

        match self.storage.set_item(key.as_str(), &snapshot) {
            Ok(()) => {
                debug!(%key, evicted = evicted.len(), "persisted cart snapshot after eviction");
                PersistOutcome::SavedAfterEviction { evicted }
            }
            Err(error) => {
                warn!(%key, %error, "cart snapshot still does not fit, dropping it");

                if let Err(remove_error) = self.discard(key) {
                    warn!(%key, error = %remove_error, "failed to drop cart snapshot");
                }

                PersistOutcome::Dropped { evicted, error }
            }
        }
    }

    /// Removes every persisted cart except the one under `active`.
    ///
    /// Keys that are not carts are left alone. Returns the evicted keys.
    pub fn evict_foreign_carts(&mut self, active: &StorageKey) -> Vec<String> {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(error) => {
                warn!(%error, "failed to list storage keys for eviction");
                return Vec::new();
            }
        };

        let mut evicted = Vec::new();

        for key in keys {
            if key == active.as_str() || !StorageKey::is_cart_key(&key) {
                continue;
            }

            match self.storage.remove_item(&key) {
                Ok(()) => {
                    warn!(%key, "evicted cart snapshot to free storage");
                    evicted.push(key);
                }
                Err(error) => warn!(%key, %error, "failed to evict cart snapshot"),
            }
        }

        evicted
    }

    /// Removes the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails.
    pub fn discard(&mut self, key: &StorageKey) -> Result<(), StorageError> {
        self.storage.remove_item(key.as_str())
    }
}

/// Encodes line items into the persisted snapshot format.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if encoding fails.
pub fn encode(items: &[LineItem]) -> Result<String, serde_json::Error> {
    let records: Vec<LineItemRecord> = items.iter().map(LineItemRecord::from).collect();

    serde_json::to_string(&records)
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate::eq};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        accounts::AccountScope,
        products::{DisplayFields, ProductRef},
        storage::{MemoryStorage, MockCartStorage},
    };

    use super::*;

    fn key(account: &str) -> StorageKey {
        AccountScope::from_raw(Some(account)).storage_key()
    }

    fn items() -> Result<Vec<LineItem>, Box<dyn std::error::Error>> {
        Ok(vec![
            LineItem::from_product(&ProductRef::new("P1", Decimal::new(1000, 2)), 2)?,
            LineItem::from_product(&ProductRef::new("P2", Decimal::new(750, 2)), 1)?,
        ])
    }

    fn quota_error() -> StorageError {
        StorageError::QuotaExceeded {
            required: 100,
            quota: 10,
        }
    }

    #[test]
    fn save_then_load_round_trips() -> TestResult {
        let mut persistence = CartPersistence::new(MemoryStorage::new());
        let items = items()?;

        assert!(persistence.save(&key("A"), &items).is_saved());
        assert_eq!(persistence.load(&key("A")), items);

        Ok(())
    }

    #[test]
    fn snapshot_is_a_json_array_without_images() -> TestResult {
        let mut persistence = CartPersistence::new(MemoryStorage::new());

        let product = ProductRef::new("P1", Decimal::new(1000, 2)).with_display(DisplayFields {
            image: Some("data:image/png;base64,AAAA".to_string()),
            ..DisplayFields::default()
        });

        let item = LineItem::from_product(&product, 1)?;

        persistence.save(&key("A"), &[item]);

        let raw = persistence
            .storage()
            .get_item("cart_A")?
            .ok_or("missing snapshot")?;

        assert!(raw.starts_with('['));
        assert!(!raw.contains("base64"));

        let loaded = persistence.load(&key("A"));

        assert_eq!(loaded.first().and_then(|item| item.display().image.clone()), None);

        Ok(())
    }

    #[test]
    fn load_missing_snapshot_is_empty() {
        let persistence = CartPersistence::new(MemoryStorage::new());

        assert!(persistence.load(&key("A")).is_empty());
    }

    #[test]
    fn load_corrupt_snapshot_is_empty() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.set_item("cart_A", "{not json")?;
        storage.set_item("cart_B", r#"{"productId":"P1"}"#)?;

        let persistence = CartPersistence::new(storage);

        assert!(persistence.load(&key("A")).is_empty());
        assert!(persistence.load(&key("B")).is_empty());

        Ok(())
    }

    #[test]
    fn load_skips_invalid_records() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.set_item(
            "cart_A",
            r#"[{"productId":"P1","unitPrice":"1.00","quantity":0},{"productId":"P2","unitPrice":"2.00","quantity":2}]"#,
        )?;

        let loaded = CartPersistence::new(storage).load(&key("A"));

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().map(|item| item.product_id().as_str()), Some("P2"));

        Ok(())
    }

    #[test]
    fn load_read_failure_is_empty() {
        let mut storage = MockCartStorage::new();
        storage
            .expect_get_item()
            .returning(|_| Err(StorageError::InvalidKey("cart_A".to_string())));

        let persistence = CartPersistence::new(storage);

        assert!(persistence.load(&key("A")).is_empty());
    }

    #[test]
    fn quota_failure_evicts_other_carts_and_retries_once() -> TestResult {
        let mut seq = Sequence::new();
        let mut storage = MockCartStorage::new();

        storage
            .expect_set_item()
            .with(eq("cart_Z"), mockall::predicate::always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(quota_error()));

        storage
            .expect_keys()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(vec![
                    "cart_X".to_string(),
                    "cart_Y".to_string(),
                    "cart_Z".to_string(),
                    "user".to_string(),
                ])
            });

        storage
            .expect_remove_item()
            .with(eq("cart_X"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        storage
            .expect_remove_item()
            .with(eq("cart_Y"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        storage
            .expect_set_item()
            .with(eq("cart_Z"), mockall::predicate::always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut persistence = CartPersistence::new(storage);

        let outcome = persistence.save(&key("Z"), &items()?);

        assert!(
            matches!(
                outcome,
                PersistOutcome::SavedAfterEviction { ref evicted } if *evicted == ["cart_X", "cart_Y"]
            ),
            "expected SavedAfterEviction, got {outcome:?}"
        );

        Ok(())
    }

    #[test]
    fn failed_retry_drops_own_snapshot() -> TestResult {
        let mut storage = MockCartStorage::new();

        storage
            .expect_set_item()
            .times(2)
            .returning(|_, _| Err(quota_error()));

        storage.expect_keys().times(1).returning(|| Ok(vec![]));

        storage
            .expect_remove_item()
            .with(eq("cart_Z"))
            .times(1)
            .returning(|_| Ok(()));

        let mut persistence = CartPersistence::new(storage);

        let outcome = persistence.save(&key("Z"), &items()?);

        assert!(
            matches!(outcome, PersistOutcome::Dropped { ref evicted, .. } if evicted.is_empty()),
            "expected Dropped, got {outcome:?}"
        );

        Ok(())
    }

    #[test]
    fn other_failures_do_not_evict() -> TestResult {
        let mut storage = MockCartStorage::new();

        storage
            .expect_set_item()
            .times(1)
            .returning(|_, _| Err(StorageError::InvalidKey("cart_Z".to_string())));

        storage.expect_keys().never();
        storage.expect_remove_item().never();

        let mut persistence = CartPersistence::new(storage);

        let outcome = persistence.save(&key("Z"), &items()?);

        assert!(matches!(
            outcome,
            PersistOutcome::Failed(PersistError::Storage(StorageError::InvalidKey(_)))
        ));

        Ok(())
    }

    #[test]
    fn eviction_keeps_active_cart_and_non_cart_keys() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.set_item("cart_A", "[]")?;
        storage.set_item("cart_B", "[]")?;
        storage.set_item("cart_anonymous", "[]")?;
        storage.set_item("session", "token")?;

        let mut persistence = CartPersistence::new(storage);

        let evicted = persistence.evict_foreign_carts(&key("A"));

        assert_eq!(
            evicted,
            vec!["cart_B".to_string(), "cart_anonymous".to_string()]
        );
        assert_eq!(
            persistence.storage().keys()?,
            vec!["cart_A".to_string(), "session".to_string()]
        );

        Ok(())
    }
}
