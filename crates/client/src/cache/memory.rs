//! In-memory storage backed by `moka`.

use async_trait::async_trait;
use moka::future::Cache;

use super::{CacheError, LocalStorage};

/// Upper bound on entries; the cart layer only uses two keys.
const MAX_ENTRIES: u64 = 64;

/// Process-lifetime storage. Entries never expire.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Cache<String, String>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await)
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
