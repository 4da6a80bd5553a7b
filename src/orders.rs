//! Orders
//!
//! Payload for the order-creation endpoint: one `{ productId, quantity }` entry
//! per line item, in cart order.

use serde::Serialize;

use crate::{cart::Cart, products::ProductId};

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product being ordered.
    pub product_id: ProductId,

    /// Units ordered.
    pub quantity: u32,
}

/// Order submission body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Ordered products.
    pub items: Vec<OrderLine>,
}

impl OrderRequest {
    /// Builds the payload for the given cart.
    pub fn from_cart(cart: &Cart) -> Self {
        Self::from(cart)
    }

    /// Returns true if there is nothing to order.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for OrderRequest {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id().clone(),
                    quantity: item.quantity(),
                })
                .collect(),
        }
    }
}
