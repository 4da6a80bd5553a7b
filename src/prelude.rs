//! Basketry prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    accounts::{AccountKey, AccountScope, StorageKey},
    cart::{Cart, CartChange},
    fixtures::{Catalog, FixtureError},
    items::LineItem,
    observer::{CartObserver, CartView, NoopObserver, StorageNotice},
    orders::{OrderLine, OrderRequest},
    persistence::{CartPersistence, PersistError, PersistOutcome},
    pricing::{PricingError, format_money},
    products::{DisplayFields, ProductId, ProductRef},
    storage::{CartStorage, FileStorage, MemoryStorage, StorageError},
    store::{CartStore, PersistenceMode},
    summary::SummaryError,
};
