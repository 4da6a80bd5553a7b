//! Accounts
//!
//! Every persisted cart is scoped to the identity that owns it. The storage key
//! is a pure function of that scope: `cart_<account key>` for an authenticated
//! account and `cart_anonymous` when no identity is present.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every persisted cart key.
pub const CART_KEY_PREFIX: &str = "cart_";

/// Placeholder used in place of an account key when no identity is present.
pub const ANONYMOUS_PLACEHOLDER: &str = "anonymous";

/// Stable identifier of an authenticated account (e.g. a CNPJ).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    /// Creates an account key, trimming surrounding whitespace.
    ///
    /// Returns `None` when the value is empty after trimming, since an empty
    /// key cannot address a cart.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();

        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AccountScope {
    /// No authenticated identity.
    #[default]
    Anonymous,

    /// An authenticated account.
    Account(AccountKey),
}

impl AccountScope {
    /// Builds a scope from an optional account key.
    pub fn from_key(key: Option<AccountKey>) -> Self {
        key.map_or(Self::Anonymous, Self::Account)
    }

    /// Builds a scope from an optional raw account identifier.
    ///
    /// Missing or blank identifiers map to [`AccountScope::Anonymous`].
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self::from_key(raw.and_then(AccountKey::new))
    }

    /// Returns the account key, if any.
    pub fn account_key(&self) -> Option<&AccountKey> {
        match self {
            Self::Anonymous => None,
            Self::Account(key) => Some(key),
        }
    }

    /// Returns the storage key for this scope.
    pub fn storage_key(&self) -> StorageKey {
        StorageKey::for_scope(self)
    }

    fn placeholder(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS_PLACEHOLDER,
            Self::Account(key) => key.as_str(),
        }
    }
}

impl fmt::Display for AccountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

impl From<Option<AccountKey>> for AccountScope {
    fn from(key: Option<AccountKey>) -> Self {
        Self::from_key(key)
    }
}

impl From<AccountKey> for AccountScope {
    fn from(key: AccountKey) -> Self {
        Self::Account(key)
    }
}

/// Key under which a scope's cart snapshot is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derives the storage key for the given scope.
    pub fn for_scope(scope: &AccountScope) -> Self {
        Self(format!("{CART_KEY_PREFIX}{}", scope.placeholder()))
    }

    /// Returns true if `raw` names a persisted cart (of any scope).
    pub fn is_cart_key(raw: &str) -> bool {
        raw.strip_prefix(CART_KEY_PREFIX)
            .is_some_and(|rest| !rest.is_empty())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
