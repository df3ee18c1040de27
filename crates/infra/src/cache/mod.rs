//! In-memory sales cache

mod sales_cache;

pub use sales_cache::{CacheStats, SalesCache};
