//! Product Fixtures

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    pricing::CURRENCY,
    products::{DisplayFields, ProductRef},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product id -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product price (e.g., "10.00 BRL")
    pub price: String,

    /// Product description
    #[serde(default)]
    pub description: Option<String>,

    /// Expiry label
    #[serde(default)]
    pub expiry: Option<String>,

    /// Image payload or URL
    #[serde(default)]
    pub image: Option<String>,

    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ProductFixture {
    /// Converts the fixture into a product reference with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed or is not in BRL.
    pub fn into_product(self, id: String) -> Result<ProductRef, FixtureError> {
        let unit_price = parse_price(&self.price)?;

        Ok(ProductRef::new(id, unit_price).with_display(DisplayFields {
            description: self.description,
            expiry_label: self.expiry,
            image: self.image,
            attributes: self.attributes,
        }))
    }
}

/// Parse price string (e.g., "10.00 BRL") into a decimal amount
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency is not BRL.
pub fn parse_price(s: &str) -> Result<Decimal, FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    if *currency_code != CURRENCY.iso_alpha_code {
        return Err(FixtureError::UnknownCurrency((*currency_code).to_string()));
    }

    Ok(amount)
}
