//! Basketry
//!
//! Basketry is a shopping-cart aggregation and persistence engine. It merges
//! repeated additions into unique-by-product line items, keeps a pt-BR
//! formatted grand total in step with them, and writes every change through to
//! a quota-limited local store scoped per account.

pub mod accounts;
pub mod cart;
pub mod fixtures;
pub mod items;
pub mod observer;
pub mod orders;
pub mod persistence;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod storage;
pub mod store;
pub mod summary;
