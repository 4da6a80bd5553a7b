//! Cart Store
//!
//! The public engine: owns the active account's cart, keeps its total in
//! step with its items, and writes every change through to storage.

use std::mem;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, info, warn};

use crate::{
    accounts::{AccountScope, StorageKey},
    cart::{Cart, CartChange},
    items::{LineItem, normalize_quantity},
    observer::{CartObserver, CartView, NoopObserver, StorageNotice},
    orders::OrderRequest,
    persistence::{CartPersistence, PersistOutcome},
    pricing::{CURRENCY, PricingError, format_money, zero_formatted},
    products::ProductRef,
    storage::CartStorage,
};

/// Whether changes are still being written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    /// Every mutation is written through.
    #[default]
    Persistent,

    /// Storage ran out of room; the cart lives in memory for the rest of the
    /// session.
    MemoryOnly,
}

/// Cart engine for one session.
///
/// The account is injected at construction and changed with
/// [`switch_account`](Self::switch_account). Mutations never fail: malformed
/// input is normalized or ignored, and storage failures are logged and
/// reported as [`StorageNotice`]s.
#[derive(Debug)]
pub struct CartStore<S, O = NoopObserver> {
    persistence: CartPersistence<S>,
    cart: Cart,
    storage_key: StorageKey,
    total: Money<'static, Currency>,
    grand_total: String,
    mode: PersistenceMode,
    memory_carts: FxHashMap<StorageKey, Cart>,
    notices: Vec<StorageNotice>,
    observer: O,
}

impl<S: CartStorage> CartStore<S> {
    /// Creates a store for `account`, loading its saved cart.
    pub fn new(storage: S, account: impl Into<AccountScope>) -> Self {
        Self::with_observer(storage, account, NoopObserver)
    }
}

impl<S: CartStorage, O: CartObserver> CartStore<S, O> {
    /// Creates a store for `account` that reports to `observer`.
    pub fn with_observer(storage: S, account: impl Into<AccountScope>, observer: O) -> Self {
        let scope = account.into();
        let mut store = Self {
            persistence: CartPersistence::new(storage),
            cart: Cart::new(scope.clone()),
            storage_key: scope.storage_key(),
            total: Money::from_minor(0, CURRENCY),
            grand_total: zero_formatted(),
            mode: PersistenceMode::Persistent,
            memory_carts: FxHashMap::default(),
            notices: Vec::new(),
            observer,
        };

        store.load(scope);

        store
    }

    /// Swaps to another account's cart.
    ///
    /// The current cart is already persisted, so nothing is written. Once
    /// storage is degraded the outgoing cart is kept in memory instead and
    /// restored when its account becomes active again. Switching to the active
    /// account does nothing.
    pub fn switch_account(&mut self, account: impl Into<AccountScope>) {
        let scope = account.into();

        if scope == *self.cart.scope() {
            return;
        }

        let previous = self.cart.scope().clone();

        info!(from = %previous, to = %scope, "switching cart account");

        if self.mode == PersistenceMode::MemoryOnly {
            self.memory_carts
                .insert(self.storage_key.clone(), self.cart.clone());
        }

        self.load(scope);

        self.observer.on_account_switched(&previous, self.cart.scope());
        self.notify_changed();
    }

    /// Adds one unit of `product`.
    pub fn add_item(&mut self, product: &ProductRef) -> CartChange {
        self.add_item_with_quantity(product, 1)
    }

    /// Adds `quantity` units of `product`. Quantities below one count as one.
    pub fn add_item_with_quantity(&mut self, product: &ProductRef, quantity: i64) -> CartChange {
        let quantity = normalize_quantity(quantity);

        self.apply("add_item", |cart| cart.add(product, quantity))
    }

    /// Sets a product's quantity. Zero or less removes it; unknown products are
    /// ignored.
    pub fn update_item_quantity(&mut self, product_id: &str, quantity: i64) -> CartChange {
        self.apply("update_item_quantity", |cart| {
            cart.set_quantity(product_id, quantity)
        })
    }

    /// Takes one unit of a product off the cart, removing the line at zero.
    pub fn remove_item_cart(&mut self, product_id: &str) -> CartChange {
        self.apply("remove_item_cart", |cart| cart.decrement(product_id))
    }

    /// Empties the cart and persists the empty snapshot.
    pub fn clear_cart(&mut self) -> CartChange {
        self.apply("clear_cart", |cart| Ok(cart.clear()))
    }

    /// Builds the order-creation payload for the current cart.
    pub fn order_request(&self) -> OrderRequest {
        OrderRequest::from_cart(&self.cart)
    }

    /// Clears the cart after an order was accepted.
    pub fn complete_order(&mut self) -> CartChange {
        info!(
            scope = %self.cart.scope(),
            items = self.cart.len(),
            "order completed, clearing cart"
        );

        self.clear_cart()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    /// The active cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Formatted grand total, e.g. `R$ 1.234,50`.
    pub fn grand_total(&self) -> &str {
        &self.grand_total
    }

    /// Grand total as money.
    pub fn total(&self) -> &Money<'static, Currency> {
        &self.total
    }

    /// Total number of units.
    pub fn unit_count(&self) -> u64 {
        self.cart.unit_count()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.cart.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Active account scope.
    pub fn scope(&self) -> &AccountScope {
        self.cart.scope()
    }

    /// Storage key of the active cart.
    pub fn storage_key(&self) -> &StorageKey {
        &self.storage_key
    }

    /// Current persistence mode.
    pub fn persistence_mode(&self) -> PersistenceMode {
        self.mode
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<StorageNotice> {
        mem::take(&mut self.notices)
    }

    /// Read model for the current state.
    pub fn view(&self) -> CartView<'_> {
        CartView {
            scope: self.cart.scope(),
            items: self.cart.items(),
            grand_total: &self.grand_total,
        }
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        self.persistence.storage()
    }

    /// Consumes the store, returning the storage backend.
    pub fn into_storage(self) -> S {
        self.persistence.into_storage()
    }

    fn load(&mut self, scope: AccountScope) {
        let storage_key = scope.storage_key();
        let cart = match self.memory_carts.remove(&storage_key) {
            Some(cart) => cart,
            None => Cart::with_items(scope.clone(), self.persistence.load(&storage_key)),
        };

        let (cart, total) = match cart.subtotal() {
            Ok(total) => (cart, total),
            Err(error) => {
                warn!(%storage_key, %error, "saved cart cannot be totalled, starting empty");

                (Cart::new(scope), Money::from_minor(0, CURRENCY))
            }
        };

        debug!(%storage_key, items = cart.len(), "cart loaded");

        self.storage_key = storage_key;
        self.cart = cart;
        self.recompute_total(total);
    }

    /// Runs `operation` against a copy of the cart and commits it only if the
    /// result can be totalled.
    fn apply(
        &mut self,
        name: &'static str,
        operation: impl FnOnce(&mut Cart) -> Result<CartChange, PricingError>,
    ) -> CartChange {
        let mut candidate = self.cart.clone();

        let total = match operation(&mut candidate) {
            Ok(change) if !change.is_change() => return change,
            Ok(change) => candidate.subtotal().map(|total| (change, total)),
            Err(error) => Err(error),
        };

        let (change, total) = match total {
            Ok(result) => result,
            Err(error) => {
                warn!(operation = name, %error, "ignoring cart operation");

                return CartChange::Unchanged;
            }
        };

        self.cart = candidate;
        self.recompute_total(total);
        self.persist();
        self.notify_changed();

        change
    }

    fn recompute_total(&mut self, total: Money<'static, Currency>) {
        self.grand_total = format_money(&total);
        self.total = total;
    }

    fn persist(&mut self) {
        if self.mode == PersistenceMode::MemoryOnly {
            debug!(storage_key = %self.storage_key, "storage degraded, keeping cart in memory");

            return;
        }

        match self.persistence.save(&self.storage_key, self.cart.items()) {
            PersistOutcome::Saved => {}
            PersistOutcome::SavedAfterEviction { evicted } => {
                self.notice_evicted(evicted);
            }
            PersistOutcome::Dropped { evicted, error } => {
                self.notice_evicted(evicted);

                warn!(
                    storage_key = %self.storage_key,
                    %error,
                    "cart no longer persisted for this session"
                );

                self.mode = PersistenceMode::MemoryOnly;
                self.push_notice(StorageNotice::SnapshotDropped {
                    scope: self.cart.scope().clone(),
                });
            }
            PersistOutcome::Failed(error) => {
                warn!(storage_key = %self.storage_key, %error, "failed to persist cart");

                self.push_notice(StorageNotice::WriteFailed {
                    scope: self.cart.scope().clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    fn notice_evicted(&mut self, keys: Vec<String>) {
        if !keys.is_empty() {
            self.push_notice(StorageNotice::EvictedForeignCarts { keys });
        }
    }

    fn push_notice(&mut self, notice: StorageNotice) {
        self.observer.on_storage_notice(&notice);
        self.notices.push(notice);
    }

    fn notify_changed(&mut self) {
        let view = CartView {
            scope: self.cart.scope(),
            items: self.cart.items(),
            grand_total: &self.grand_total,
        };

        self.observer.on_cart_changed(&view);
    }
}
