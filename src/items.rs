//! Items

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::{
    pricing::{PricingError, line_total, to_money},
    products::{DisplayFields, ProductId, ProductRef},
};

/// Normalizes a requested quantity for an addition.
///
/// Anything below one becomes one; values beyond `u32::MAX` saturate.
pub fn normalize_quantity(requested: i64) -> u32 {
    if requested < 1 {
        1
    } else {
        u32::try_from(requested).unwrap_or(u32::MAX)
    }
}

/// Parses a quantity typed into a form field.
///
/// Non-numeric input is treated as one, as is anything below one.
pub fn parse_quantity(raw: &str) -> u32 {
    raw.trim().parse::<i64>().map_or(1, normalize_quantity)
}

/// Parses a quantity typed into an update field.
///
/// Returns `None` for non-numeric input, which callers ignore. Zero and
/// negative values are kept so the update can remove the line.
pub fn parse_update_quantity(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// One product-and-quantity entry in a cart.
///
/// The quantity is always at least one and the line total is always
/// `unit_price * quantity`; neither can be set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    product_id: ProductId,
    unit_price: Decimal,
    quantity: u32,
    line_total: Decimal,
    display: DisplayFields,
}

impl LineItem {
    /// Creates a line item, computing its total.
    ///
    /// A zero quantity is raised to one.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total overflows.
    pub fn new(
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
        display: DisplayFields,
    ) -> Result<Self, PricingError> {
        let quantity = quantity.max(1);

        Ok(Self {
            product_id,
            unit_price,
            quantity,
            line_total: line_total(unit_price, quantity)?,
            display,
        })
    }

    /// Creates a line item from a catalog product reference.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total overflows.
    pub fn from_product(product: &ProductRef, quantity: u32) -> Result<Self, PricingError> {
        Self::new(
            product.id.clone(),
            product.unit_price,
            quantity,
            product.display.clone(),
        )
    }

    /// Returns the product identifier.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the unit price fixed when the item was first added.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Decimal {
        self.line_total
    }

    /// Returns the line total as money in the store currency.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::OutOfRange`] if the total does not fit in minor units.
    pub fn line_total_money(&self) -> Result<Money<'static, Currency>, PricingError> {
        to_money(self.line_total)
    }

    /// Returns the display metadata.
    pub fn display(&self) -> &DisplayFields {
        &self.display
    }

    /// Sets the quantity and recomputes the line total.
    ///
    /// Leaves the item untouched on error.
    pub(crate) fn set_quantity(&mut self, quantity: u32) -> Result<(), PricingError> {
        let quantity = quantity.max(1);

        self.line_total = line_total(self.unit_price, quantity)?;
        self.quantity = quantity;

        Ok(())
    }

    /// Adds to the quantity, saturating at `u32::MAX`.
    pub(crate) fn increase_quantity(&mut self, by: u32) -> Result<(), PricingError> {
        self.set_quantity(self.quantity.saturating_add(by))
    }

    pub(crate) fn merge_display(&mut self, incoming: &DisplayFields) {
        self.display.merge(incoming);
    }
}
