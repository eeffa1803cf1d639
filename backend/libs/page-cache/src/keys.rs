//! Cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}

/// Cache schema version - increment when changing key formats
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Full-page cache entry for a request URL
    /// Format: v1:page:{path_and_query}
    pub fn page(path_and_query: &str) -> String {
        format!("v{}:page:{}", CACHE_VERSION, path_and_query)
    }
}
