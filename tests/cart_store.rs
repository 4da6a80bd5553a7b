//! Integration tests for cart aggregation, totals and account scoping.

use rust_decimal::Decimal;
use testresult::TestResult;

use basketry::{
    accounts::{AccountKey, AccountScope},
    cart::CartChange,
    products::ProductRef,
    storage::{CartStorage, MemoryStorage},
    store::CartStore,
};

fn product(id: &str, cents: i64) -> ProductRef {
    ProductRef::new(id, Decimal::new(cents, 2))
}

fn account(raw: &str) -> Option<AccountKey> {
    AccountKey::new(raw)
}

#[test]
fn repeated_additions_merge_into_one_line() -> TestResult {
    let mut store = CartStore::new(MemoryStorage::new(), account("12.345.678/0001-90"));
    let p1 = product("P1", 1000);

    store.add_item_with_quantity(&p1, 2);

    let line = store.items().first().ok_or("missing line")?;

    assert_eq!(store.len(), 1);
    assert_eq!(line.quantity(), 2);
    assert_eq!(line.line_total(), Decimal::new(2000, 2));
    assert_eq!(store.grand_total(), "R$ 20,00");

    store.add_item(&ProductRef::new("P1", Decimal::new(1000, 2)));

    let line = store.items().first().ok_or("missing line")?;

    assert_eq!(store.len(), 1);
    assert_eq!(line.quantity(), 3);
    assert_eq!(line.line_total(), Decimal::new(3000, 2));
    assert_eq!(store.grand_total(), "R$ 30,00");

    Ok(())
}

#[test]
fn quantity_always_equals_sum_of_additions() -> TestResult {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));
    let p1 = product("P1", 333);

    let mut expected = 0_u32;

    for requested in [1_i64, 4, 0, -2, 7] {
        store.add_item_with_quantity(&p1, requested);

        expected += u32::try_from(requested.max(1))?;

        let line = store.items().first().ok_or("missing line")?;

        assert_eq!(line.quantity(), expected);
        assert_eq!(line.line_total(), line.unit_price() * Decimal::from(expected));
    }

    assert_eq!(store.grand_total(), "R$ 46,62");

    Ok(())
}

#[test]
fn updating_to_zero_removes_and_retotals() -> TestResult {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item(&product("P1", 500));
    store.add_item(&product("P2", 750));

    assert_eq!(store.grand_total(), "R$ 12,50");

    store.update_item_quantity("P1", 0);

    let ids: Vec<&str> = store
        .items()
        .iter()
        .map(|item| item.product_id().as_str())
        .collect();

    assert_eq!(ids, vec!["P2"]);
    assert_eq!(store.grand_total(), "R$ 7,50");

    Ok(())
}

#[test]
fn negative_update_removes_and_positive_update_is_absolute() {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item_with_quantity(&product("P1", 100), 5);
    store.add_item(&product("P2", 100));

    assert_eq!(store.update_item_quantity("P1", 3), CartChange::Updated);
    assert_eq!(store.unit_count(), 4);

    assert_eq!(store.update_item_quantity("P2", -5), CartChange::Removed);
    assert_eq!(store.len(), 1);
    assert_eq!(store.grand_total(), "R$ 3,00");
}

#[test]
fn decrementing_quantity_times_removes_the_line() {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item_with_quantity(&product("P1", 250), 3);

    store.remove_item_cart("P1");
    store.remove_item_cart("P1");

    assert_eq!(store.unit_count(), 1);
    assert_eq!(store.grand_total(), "R$ 2,50");

    assert_eq!(store.remove_item_cart("P1"), CartChange::Removed);
    assert!(store.is_empty());
    assert_eq!(store.grand_total(), "R$ 0,00");
}

#[test]
fn account_round_trip_restores_persisted_cart() {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item_with_quantity(&product("P1", 1000), 2);
    store.add_item(&product("P2", 750));

    let a_items = store.items().to_vec();

    store.switch_account(account("B"));
    store.add_item(&product("P3", 100));

    assert_eq!(store.len(), 1);

    store.switch_account(account("A"));

    assert_eq!(store.items(), a_items.as_slice());
    assert_eq!(store.grand_total(), "R$ 27,50");

    store.switch_account(AccountScope::Anonymous);

    assert!(store.is_empty());
}

#[test]
fn clear_cart_persists_empty_snapshot() -> TestResult {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item(&product("P1", 1000));
    store.clear_cart();

    assert!(store.items().is_empty());
    assert_eq!(store.grand_total(), "R$ 0,00");
    assert_eq!(store.storage().get_item("cart_A")?.as_deref(), Some("[]"));

    let reopened = CartStore::new(store.into_storage(), account("A"));

    assert!(reopened.is_empty());

    Ok(())
}

#[test]
fn corrupt_snapshot_loads_as_empty_cart() -> TestResult {
    let mut storage = MemoryStorage::new();
    storage.set_item("cart_A", "not json at all")?;

    let mut store = CartStore::new(storage, account("A"));

    assert!(store.is_empty());
    assert_eq!(store.grand_total(), "R$ 0,00");

    store.add_item(&product("P1", 100));

    assert_eq!(store.grand_total(), "R$ 1,00");

    Ok(())
}

#[test]
fn thousands_are_grouped_in_the_total() {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item(&product("P1", 124_990));

    assert_eq!(store.grand_total(), "R$ 1.249,90");
}

#[test]
fn order_payload_lists_products_and_quantities() -> TestResult {
    let mut store = CartStore::new(MemoryStorage::new(), account("A"));

    store.add_item_with_quantity(&product("P1", 1000), 2);
    store.add_item(&product("P2", 750));

    let json = serde_json::to_value(store.order_request())?;

    assert_eq!(
        json,
        serde_json::json!({
            "items": [
                { "productId": "P1", "quantity": 2 },
                { "productId": "P2", "quantity": 1 }
            ]
        })
    );

    store.complete_order();

    assert!(store.is_empty());
    assert_eq!(store.storage().get_item("cart_A")?.as_deref(), Some("[]"));

    Ok(())
}
