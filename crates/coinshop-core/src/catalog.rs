//! The merch catalog.
//!
//! The catalog is a fixed mapping of item slug to price. It is loaded once at
//! start-up and injected into the ledger; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item identifier (e.g. `"pen"`).
    pub slug: String,
    /// Price in coins (always > 0).
    pub price: i64,
}

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An item has an empty slug.
    #[error("catalog item slug must not be empty")]
    EmptySlug,

    /// An item has a zero or negative price.
    #[error("catalog item {slug} has non-positive price {price}")]
    NonPositivePrice {
        /// Offending item.
        slug: String,
        /// Offending price.
        price: i64,
    },

    /// The catalog file could not be read.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a JSON object of slug to price.
    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable slug → price mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: BTreeMap<String, i64>,
}

impl Catalog {
    /// Build a catalog from `(slug, price)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a slug is empty or a price is not positive.
    pub fn new<I, S>(items: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (slug, price) in items {
            let slug = slug.into();
            if slug.is_empty() {
                return Err(CatalogError::EmptySlug);
            }
            if price <= 0 {
                return Err(CatalogError::NonPositivePrice { slug, price });
            }
            map.insert(slug, price);
        }
        Ok(Self { items: map })
    }

    /// Load a catalog from a JSON file shaped like `{"pen": 10, "cup": 20}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds an invalid catalog.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a JSON object of slug to price.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds an invalid catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: BTreeMap<String, i64> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// The merch set the shop ships with.
    #[must_use]
    pub fn merch() -> Self {
        let items = [
            ("t-shirt", 80),
            ("cup", 20),
            ("book", 50),
            ("pen", 10),
            ("powerbank", 200),
            ("hoody", 300),
            ("umbrella", 200),
            ("socks", 10),
            ("wallet", 50),
            ("pink-hoody", 500),
        ];
        Self {
            items: items
                .into_iter()
                .map(|(slug, price)| (slug.to_string(), price))
                .collect(),
        }
    }

    /// Price of an item, or `None` if the slug is not in the catalog.
    #[must_use]
    pub fn price(&self, slug: &str) -> Option<i64> {
        self.items.get(slug).copied()
    }

    /// Whether the catalog lists `slug`.
    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.items.contains_key(slug)
    }

    /// All items, ordered by slug.
    pub fn items(&self) -> impl Iterator<Item = CatalogItem> + '_ {
        self.items.iter().map(|(slug, price)| CatalogItem {
            slug: slug.clone(),
            price: *price,
        })
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::merch()
    }
}
