//! Cart
//!
//! In-memory aggregation of line items for one account scope. Items are unique
//! by product and keep their insertion order. Nothing here touches storage.

use rusty_money::{Money, iso::Currency};

use crate::{
    accounts::AccountScope,
    items::LineItem,
    pricing::{PricingError, total_price},
    products::ProductRef,
};

/// Effect of a cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line item was appended.
    Added,

    /// An existing line item's quantity (or metadata) changed.
    Updated,

    /// A line item was removed.
    Removed,

    /// The cart was emptied.
    Cleared,

    /// Nothing changed (e.g. unknown product).
    Unchanged,
}

impl CartChange {
    /// Returns true if the operation modified the cart.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Line items belonging to a single account scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    scope: AccountScope,
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart for the given scope.
    pub fn new(scope: AccountScope) -> Self {
        Self {
            scope,
            items: Vec::new(),
        }
    }

    /// Creates a cart from existing items.
    ///
    /// Items sharing a product are folded into the first occurrence.
    pub fn with_items(scope: AccountScope, items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Self::new(scope);

        for item in items {
            match cart.position(item.product_id().as_str()) {
                Some(idx) => {
                    if let Some(existing) = cart.items.get_mut(idx) {
                        // Keep the existing line untouched if the combined total overflows.
                        if existing.increase_quantity(item.quantity()).is_ok() {
                            existing.merge_display(item.display());
                        }
                    }
                }
                None => cart.items.push(item),
            }
        }

        cart
    }

    /// Adds `quantity` units of `product`.
    ///
    /// An existing line for the product has its quantity increased and its
    /// display metadata enriched; its unit price stays as first added.
    /// Otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total overflows; the cart
    /// is left as it was.
    pub fn add(&mut self, product: &ProductRef, quantity: u32) -> Result<CartChange, PricingError> {
        let quantity = quantity.max(1);

        if let Some(existing) = self.find_mut(product.id.as_str()) {
            existing.increase_quantity(quantity)?;
            existing.merge_display(&product.display);

            return Ok(CartChange::Updated);
        }

        self.items.push(LineItem::from_product(product, quantity)?);

        Ok(CartChange::Added)
    }

    /// Sets the quantity of a product to exactly `quantity`.
    ///
    /// A quantity of zero or less removes the line. Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total overflows; the cart
    /// is left as it was.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
    ) -> Result<CartChange, PricingError> {
        let Some(idx) = self.position(product_id) else {
            return Ok(CartChange::Unchanged);
        };

        if quantity <= 0 {
            self.items.remove(idx);

            return Ok(CartChange::Removed);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(item) = self.items.get_mut(idx) else {
            return Ok(CartChange::Unchanged);
        };

        if item.quantity() == quantity {
            return Ok(CartChange::Unchanged);
        }

        item.set_quantity(quantity)?;

        Ok(CartChange::Updated)
    }

    /// Decrements the quantity of a product by one, removing it at zero.
    ///
    /// Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if recomputing the line total overflows.
    pub fn decrement(&mut self, product_id: &str) -> Result<CartChange, PricingError> {
        let Some(idx) = self.position(product_id) else {
            return Ok(CartChange::Unchanged);
        };

        if let Some(item) = self.items.get_mut(idx)
            && item.quantity() > 1
        {
            item.set_quantity(item.quantity() - 1)?;

            return Ok(CartChange::Updated);
        }

        self.items.remove(idx);

        Ok(CartChange::Removed)
    }

    /// Removes every line item.
    pub fn clear(&mut self) -> CartChange {
        self.items.clear();

        CartChange::Cleared
    }

    /// Calculate the total of the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the sum overflows or does not fit in minor units.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, PricingError> {
        total_price(&self.items)
    }

    /// Get a line item by product.
    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.product_id().as_str() == product_id)
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over the line items.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Scope this cart belongs to.
    pub fn scope(&self) -> &AccountScope {
        &self.scope
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id().as_str() == product_id)
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id().as_str() == product_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::products::DisplayFields;

    use super::*;

    fn product(id: &str, cents: i64) -> ProductRef {
        ProductRef::new(id, Decimal::new(cents, 2))
    }

    fn ids(cart: &Cart) -> Vec<&str> {
        cart.iter().map(|item| item.product_id().as_str()).collect()
    }

    #[test]
    fn repeated_adds_accumulate_quantity() -> TestResult {
        let mut cart = Cart::default();
        let p1 = product("P1", 1000);

        assert_eq!(cart.add(&p1, 2)?, CartChange::Added);
        assert_eq!(cart.add(&p1, 1)?, CartChange::Updated);
        assert_eq!(cart.add(&p1, 4)?, CartChange::Updated);

        let item = cart.get("P1").ok_or("missing P1")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(item.quantity(), 7);
        assert_eq!(item.line_total(), Decimal::new(7000, 2));

        Ok(())
    }

    #[test]
    fn add_keeps_first_unit_price() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 1000), 1)?;
        cart.add(&product("P1", 9900), 1)?;

        let item = cart.get("P1").ok_or("missing P1")?;

        assert_eq!(item.unit_price(), Decimal::new(1000, 2));
        assert_eq!(item.line_total(), Decimal::new(2000, 2));

        Ok(())
    }

    #[test]
    fn add_enriches_display_metadata() -> TestResult {
        let mut cart = Cart::default();

        let with_image = product("P1", 1000).with_display(DisplayFields {
            image: Some("data:image/png;base64,AAAA".to_string()),
            ..DisplayFields::default()
        });

        cart.add(&with_image, 1)?;
        cart.add(
            &product("P1", 1000).with_display(DisplayFields::with_description("Queijo")),
            1,
        )?;

        let display = cart.get("P1").ok_or("missing P1")?.display();

        assert_eq!(display.image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(display.description.as_deref(), Some("Queijo"));

        Ok(())
    }

    #[test]
    fn insertion_order_is_preserved_across_updates() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 100), 1)?;
        cart.add(&product("P2", 200), 1)?;
        cart.add(&product("P3", 300), 1)?;
        cart.add(&product("P1", 100), 1)?;
        cart.set_quantity("P2", 9)?;

        assert_eq!(ids(&cart), vec!["P1", "P2", "P3"]);

        Ok(())
    }

    #[test]
    fn set_quantity_is_absolute() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 250), 8)?;

        assert_eq!(cart.set_quantity("P1", 3)?, CartChange::Updated);
        assert_eq!(cart.get("P1").map(LineItem::quantity), Some(3));
        assert_eq!(cart.set_quantity("P1", 3)?, CartChange::Unchanged);

        Ok(())
    }

    #[test]
    fn set_quantity_zero_or_negative_removes() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 250), 2)?;
        cart.add(&product("P2", 250), 2)?;

        assert_eq!(cart.set_quantity("P1", 0)?, CartChange::Removed);
        assert_eq!(cart.set_quantity("P2", -5)?, CartChange::Removed);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_unknown_product_is_ignored() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 250), 2)?;

        assert_eq!(cart.set_quantity("nope", 4)?, CartChange::Unchanged);
        assert_eq!(cart.set_quantity("nope", 0)?, CartChange::Unchanged);
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn decrement_removes_after_quantity_calls() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 500), 3)?;

        assert_eq!(cart.decrement("P1")?, CartChange::Updated);
        assert_eq!(cart.decrement("P1")?, CartChange::Updated);

        let item = cart.get("P1").ok_or("missing P1")?;

        assert_eq!(item.quantity(), 1);
        assert_eq!(item.line_total(), Decimal::new(500, 2));

        assert_eq!(cart.decrement("P1")?, CartChange::Removed);
        assert!(cart.get("P1").is_none());
        assert_eq!(cart.decrement("P1")?, CartChange::Unchanged);

        Ok(())
    }

    #[test]
    fn counts_units_and_distinct_products() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 100), 3)?;
        cart.add(&product("P2", 100), 2)?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.unit_count(), 5);

        Ok(())
    }

    #[test]
    fn subtotal_tracks_items() -> TestResult {
        let mut cart = Cart::default();

        assert_eq!(cart.subtotal()?.to_minor_units(), 0);

        cart.add(&product("P1", 500), 1)?;
        cart.add(&product("P2", 750), 1)?;

        assert_eq!(cart.subtotal()?.to_minor_units(), 1250);

        cart.set_quantity("P1", 0)?;

        assert_eq!(cart.subtotal()?.to_minor_units(), 750);

        Ok(())
    }

    #[test]
    fn overflowing_add_leaves_cart_untouched() -> TestResult {
        let mut cart = Cart::default();
        let huge = ProductRef::new("P1", Decimal::MAX);

        cart.add(&huge, 1)?;

        assert_eq!(cart.add(&huge, 1), Err(PricingError::Overflow));
        assert_eq!(cart.get("P1").map(LineItem::quantity), Some(1));

        Ok(())
    }

    #[test]
    fn with_items_folds_duplicates() -> TestResult {
        let items = [
            LineItem::from_product(&product("P1", 100), 1)?,
            LineItem::from_product(&product("P2", 100), 1)?,
            LineItem::from_product(&product("P1", 100), 2)?,
        ];

        let cart = Cart::with_items(AccountScope::Anonymous, items);

        assert_eq!(ids(&cart), vec!["P1", "P2"]);
        assert_eq!(cart.get("P1").map(LineItem::quantity), Some(3));

        Ok(())
    }

    #[test]
    fn clear_empties_cart() -> TestResult {
        let mut cart = Cart::default();

        cart.add(&product("P1", 100), 1)?;

        assert_eq!(cart.clear(), CartChange::Cleared);
        assert!(cart.is_empty());
        assert_eq!(cart.unit_count(), 0);

        Ok(())
    }
}
