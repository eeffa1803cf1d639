//! Page cache access for handlers.
//!
//! Cache failures never fail a request: they are logged, counted and the
//! page is served uncached.

use actix_web::HttpRequest;
use page_cache::{CacheKey, CachedPage};

use crate::metrics::record_cache_event;
use crate::state::AppState;

/// Cache key of a request, covering the path and the query string
pub fn request_key(req: &HttpRequest) -> String {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());
    CacheKey::page(path_and_query)
}

pub async fn fetch(state: &AppState, key: &str) -> Option<CachedPage> {
    match state.page_cache.get(key).await {
        Ok(Some(page)) => {
            record_cache_event("hit");
            tracing::debug!(key = %key, "page cache hit");
            Some(page)
        }
        Ok(None) => {
            record_cache_event("miss");
            None
        }
        Err(e) => {
            record_cache_event("error");
            tracing::warn!(key = %key, error = %e, "page cache read failed");
            None
        }
    }
}

pub async fn store(state: &AppState, key: &str, page: &CachedPage) {
    if let Err(e) = state.page_cache.set(key, page, state.page_ttl).await {
        record_cache_event("error");
        tracing::warn!(key = %key, error = %e, "page cache write failed");
    }
}
