//! Local persistence mirror of cart state.
//!
//! # Architecture
//!
//! - [`LocalStorage`] is a string key/value store, the same contract as a
//!   browser's `localStorage`
//! - [`MemoryStorage`] keeps entries in a `moka` cache for the process lifetime
//! - [`FileStorage`] writes one JSON file per key so state survives restarts
//! - [`CartCache`] is the typed view the cart service uses; it owns the two
//!   entries `cartDetails` and `cartItems`
//!
//! Entries are JSON with no versioning. A malformed entry is an error rather
//! than silently discarded.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use shopfront_core::{Cart, CartItem};

/// Key holding the serialized current cart.
pub const CART_DETAILS_KEY: &str = "cartDetails";

/// Key holding the serialized current item list.
pub const CART_ITEMS_KEY: &str = "cartItems";

/// Errors that can occur when reading or writing the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry is not valid JSON for its type.
    #[error("Malformed cache entry {key}: {source}")]
    Malformed {
        /// Entry key.
        key: String,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// String key/value storage.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read an entry, `None` if it was never written.
    async fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write an entry, replacing any previous value.
    async fn set_item(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove an entry. Removing a missing entry is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), CacheError>;
}

/// Typed access to the cart entries.
#[derive(Clone)]
pub struct CartCache {
    storage: Arc<dyn LocalStorage>,
}

impl CartCache {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Cached cart record, including the placeholder if that was cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails or the entry is malformed.
    pub async fn load_cart(&self) -> Result<Option<Cart>, CacheError> {
        self.load(CART_DETAILS_KEY).await
    }

    /// Replace the cached cart record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), CacheError> {
        self.save(CART_DETAILS_KEY, cart).await
    }

    /// Cached item list, `None` if never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails or the entry is malformed.
    pub async fn load_items(&self) -> Result<Option<Vec<CartItem>>, CacheError> {
        self.load(CART_ITEMS_KEY).await
    }

    /// Replace the cached item list.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn save_items(&self, items: &[CartItem]) -> Result<(), CacheError> {
        self.save(CART_ITEMS_KEY, &items).await
    }

    /// Remove both entries.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage removal fails.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.storage.remove_item(CART_DETAILS_KEY).await?;
        self.storage.remove_item(CART_ITEMS_KEY).await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.storage.get_item(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    async fn save<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        debug!(key, bytes = raw.len(), "Writing cache entry");
        self.storage.set_item(key, raw).await
    }
}
