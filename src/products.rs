//! Products

use std::{collections::BTreeMap, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Product metadata carried through the cart for rendering only.
///
/// None of these fields take part in any computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFields {
    /// Product description.
    pub description: Option<String>,

    /// Expiry label, as printed on the catalog.
    pub expiry_label: Option<String>,

    /// Image payload (typically a data URI). Never persisted.
    pub image: Option<String>,

    /// Any further pass-through attributes (weight, brand, category...).
    pub attributes: BTreeMap<String, String>,
}

impl DisplayFields {
    /// Creates display fields with just a description.
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Merges `incoming` into these fields.
    ///
    /// Fields present in `incoming` replace the current value; fields it omits
    /// keep whatever was previously known. Attributes are merged key by key.
    pub fn merge(&mut self, incoming: &DisplayFields) {
        merge_field(&mut self.description, incoming.description.as_ref());
        merge_field(&mut self.expiry_label, incoming.expiry_label.as_ref());
        merge_field(&mut self.image, incoming.image.as_ref());

        for (name, value) in &incoming.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
    }

    /// Returns a copy with the image payload removed.
    #[must_use]
    pub fn without_image(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

fn merge_field(current: &mut Option<String>, incoming: Option<&String>) {
    if let Some(value) = incoming {
        *current = Some(value.clone());
    }
}

/// A reference to a catalog product, as handed to the cart by the catalog/UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    /// Product identifier.
    pub id: ProductId,

    /// Unit price at the moment of adding.
    pub unit_price: Decimal,

    /// Display metadata.
    pub display: DisplayFields,
}

impl ProductRef {
    /// Creates a product reference without display metadata.
    pub fn new(id: impl Into<ProductId>, unit_price: Decimal) -> Self {
        Self {
            id: id.into(),
            unit_price,
            display: DisplayFields::default(),
        }
    }

    /// Attaches display metadata.
    #[must_use]
    pub fn with_display(mut self, display: DisplayFields) -> Self {
        self.display = display;
        self
    }
}
