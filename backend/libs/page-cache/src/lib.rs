//! Yatube page cache
//!
//! Stores fully rendered responses for a short, fixed window so that hot
//! listing pages are served without touching the database:
//! - Versioned key schema (`v1:page:<path?query>`)
//! - Redis backend for multi-process deployments
//! - In-process backend for single-node runs and tests
//!
//! Entries are never invalidated on writes; they expire or are cleared
//! explicitly.

mod error;
mod keys;
mod memory;
mod redis_cache;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::{MemoryPageCache, DEFAULT_MAX_ENTRIES};
pub use redis_cache::RedisPageCache;

use std::time::Duration;

/// Default lifetime of a cached page (seconds)
pub const DEFAULT_PAGE_TTL_SECS: u64 = 20;

/// A rendered response body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CachedPage {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Core page cache operations
#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    /// Get a live page, `None` when missing or expired
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>>;

    /// Store a page for `ttl`
    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()>;

    /// Drop every cached page, returning how many entries were removed
    async fn clear(&self) -> CacheResult<usize>;

    /// Check that the backend is reachable
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
