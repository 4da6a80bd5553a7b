//! Fixtures
//!
//! Product catalogs loaded from YAML, used by the command-line driver and in
//! tests in place of the remote catalog.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::products::ProductRef;

pub mod products;

use products::ProductsFixture;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),
}

/// Product catalog keyed by product id
#[derive(Debug, Default)]
pub struct Catalog {
    products: FxHashMap<String, ProductRef>,
}

impl Catalog {
    /// Load a catalog from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a price is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or if a price is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(yaml)?;

        let mut products = FxHashMap::default();

        for (id, product_fixture) in fixture.products {
            let product = product_fixture.into_product(id.clone())?;

            products.insert(id, product);
        }

        Ok(Self { products })
    }

    /// Look up a product
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ProductNotFound`] if there is no such product.
    pub fn get(&self, id: &str) -> Result<&ProductRef, FixtureError> {
        self.products
            .get(id)
            .ok_or_else(|| FixtureError::ProductNotFound(id.to_string()))
    }

    /// Product ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.products.keys().map(String::as_str).collect();

        ids.sort_unstable();

        ids
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
