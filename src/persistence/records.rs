//! Snapshot Records
//!
//! The persisted shape of a cart: a JSON array of line items without image
//! payloads.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    items::LineItem,
    products::{DisplayFields, ProductId},
};

/// Persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineItemRecord {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub line_total: Decimal,
    #[serde(default)]
    pub display_fields: DisplayFieldsRecord,
}

/// Persisted display metadata. Images are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DisplayFieldsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl From<&LineItem> for LineItemRecord {
    fn from(item: &LineItem) -> Self {
        let DisplayFields {
            description,
            expiry_label,
            attributes,
            ..
        } = item.display().without_image();

        Self {
            product_id: item.product_id().clone(),
            unit_price: item.unit_price(),
            quantity: i64::from(item.quantity()),
            line_total: item.line_total(),
            display_fields: DisplayFieldsRecord {
                description,
                expiry_label,
                attributes,
            },
        }
    }
}

impl LineItemRecord {
    /// Rebuilds a line item, recomputing its total.
    ///
    /// Returns `None` for records that cannot form a valid line item (zero or
    /// negative quantity, or a total that overflows).
    pub(crate) fn into_line_item(self) -> Option<LineItem> {
        if self.quantity < 1 {
            return None;
        }

        let quantity = u32::try_from(self.quantity).unwrap_or(u32::MAX);

        let display = DisplayFields {
            description: self.display_fields.description,
            expiry_label: self.display_fields.expiry_label,
            image: None,
            attributes: self.display_fields.attributes,
        };

        LineItem::new(self.product_id, self.unit_price, quantity, display).ok()
    }
}
