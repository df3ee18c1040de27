//! Concurrency-safe store mapping (publisher, month) to a sales payload.
//!
//! The cache is the sole owner of entry storage; everything else goes through
//! the narrow get/put surface. Entries are inserted whole and replaced whole,
//! so a reader racing a writer sees either the previous complete entry or the
//! new complete entry, never a mix. There is no eviction, TTL or size bound:
//! state lives for the process lifetime and is rebuilt from scratch on
//! restart.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use storefront_core::SalesStore;
use storefront_domain::{CacheEntry, CacheKey, Result, SalesData, StorefrontError};
use tracing::{debug, trace};

/// In-memory cache of per-month sales payloads.
#[derive(Default)]
pub struct SalesCache {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached (publisher, month) entries
    pub entry_count: usize,
}

impl SalesCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for (publisher, month).
    ///
    /// The returned entry is a complete snapshot; later writes to the same
    /// key do not affect it.
    pub fn get(&self, publisher_id: &str, month: &str) -> Option<Arc<CacheEntry>> {
        let key = CacheKey::new(publisher_id, month);
        let entry = self.entries.get(&key).map(|found| found.value().clone());
        match &entry {
            Some(_) => trace!(publisher = publisher_id, month, "sales cache hit"),
            None => trace!(publisher = publisher_id, month, "sales cache miss"),
        }
        entry
    }

    /// Unconditionally replace the entry for (publisher, month).
    pub fn put_payload(&self, publisher_id: &str, month: &str, payload: serde_json::Value) {
        let key = CacheKey::new(publisher_id, month);
        self.entries.insert(key, Arc::new(CacheEntry::new(payload)));
        debug!(publisher = publisher_id, month, "sales cached");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats { entry_count: self.entries.len() }
    }
}

#[async_trait]
impl SalesStore for SalesCache {
    async fn put_sales(&self, publisher_id: &str, month: &str, sales: &[SalesData]) -> Result<()> {
        let payload = serde_json::to_value(sales).map_err(|err| {
            StorefrontError::Internal(format!("failed to serialize sales rows: {err}"))
        })?;
        self.put_payload(publisher_id, month, payload);
        Ok(())
    }
}
