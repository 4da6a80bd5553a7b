//! Cart Observer

use std::fmt;

use crate::{accounts::AccountScope, items::LineItem};

/// Read model handed to observers after every recompute.
#[derive(Debug, Clone, Copy)]
pub struct CartView<'a> {
    /// Scope the cart belongs to.
    pub scope: &'a AccountScope,

    /// Line items in insertion order.
    pub items: &'a [LineItem],

    /// Formatted grand total, e.g. `R$ 20,00`.
    pub grand_total: &'a str,
}

impl CartView<'_> {
    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }
}

/// Non-blocking notice about persistence, meant to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageNotice {
    /// Other accounts' carts were removed to make room.
    EvictedForeignCarts {
        /// Storage keys that were removed.
        keys: Vec<String>,
    },

    /// Storage is full even after eviction. The saved cart was removed and
    /// changes are no longer persisted this session.
    SnapshotDropped {
        /// Scope whose snapshot was dropped.
        scope: AccountScope,
    },

    /// A write failed for a reason other than quota. The cart in memory is
    /// unaffected.
    WriteFailed {
        /// Scope that failed to save.
        scope: AccountScope,

        /// Backend error message.
        reason: String,
    },
}

impl fmt::Display for StorageNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvictedForeignCarts { keys } => write!(
                f,
                "Storage was full: removed {} saved cart(s) from other accounts",
                keys.len()
            ),
            Self::SnapshotDropped { scope } => write!(
                f,
                "Storage is full: the cart for {scope} is kept in memory only and will not be saved"
            ),
            Self::WriteFailed { scope, reason } => {
                write!(f, "Could not save the cart for {scope}: {reason}")
            }
        }
    }
}

/// Callbacks fired by [`CartStore`](crate::store::CartStore).
///
/// Every method has an empty default, so implementors only override what
/// they consume.
pub trait CartObserver {
    /// Called after every mutation, load or account switch, once the total
    /// has been recomputed.
    fn on_cart_changed(&mut self, _view: &CartView<'_>) {}

    /// Called when the store swaps to another account's cart.
    fn on_account_switched(&mut self, _from: &AccountScope, _to: &AccountScope) {}

    /// Called when persistence degrades or recovers from a failure.
    fn on_storage_notice(&mut self, _notice: &StorageNotice) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CartObserver for NoopObserver {}

impl<O: CartObserver + ?Sized> CartObserver for &mut O {
    fn on_cart_changed(&mut self, view: &CartView<'_>) {
        (**self).on_cart_changed(view);
    }

    fn on_account_switched(&mut self, from: &AccountScope, to: &AccountScope) {
        (**self).on_account_switched(from, to);
    }

    fn on_storage_notice(&mut self, notice: &StorageNotice) {
        (**self).on_storage_notice(notice);
    }
}
