//! Redis-backed page cache
//!
//! Each page is a hash (`content_type`, `body`) with an expiry. All keys
//! live under a namespace so `clear` can SCAN them without touching other
//! data in the same Redis database.

use crate::{CacheError, CacheResult, CachedPage, PageCache};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const CONTENT_TYPE_FIELD: &str = "content_type";
const BODY_FIELD: &str = "body";

#[derive(Clone)]
pub struct RedisPageCache {
    redis: ConnectionManager,
    namespace: String,
}

impl RedisPageCache {
    pub fn new(redis: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    /// Connect to `url` and wrap the connection in a cache
    pub async fn connect(url: &str, namespace: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(manager, namespace))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn clear_pattern(&self) -> String {
        format!("{}:*", self.namespace)
    }
}

fn decode_page(mut fields: HashMap<String, Vec<u8>>) -> CacheResult<Option<CachedPage>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let content_type = fields
        .remove(CONTENT_TYPE_FIELD)
        .ok_or_else(|| CacheError::InvalidData("missing content_type".to_string()))?;
    let content_type = String::from_utf8(content_type)
        .map_err(|e| CacheError::InvalidData(format!("content_type is not UTF-8: {}", e)))?;
    let body = fields
        .remove(BODY_FIELD)
        .ok_or_else(|| CacheError::InvalidData("missing body".to_string()))?;

    Ok(Some(CachedPage { content_type, body }))
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let key = self.namespaced(key);
        let mut conn = self.redis.clone();

        let fields: HashMap<String, Vec<u8>> = conn.hgetall(&key).await?;
        match decode_page(fields) {
            Ok(Some(page)) => {
                debug!(key = %key, "Page cache hit");
                Ok(Some(page))
            }
            Ok(None) => {
                debug!(key = %key, "Page cache miss");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupted page cache entry");
                // Drop the corrupted entry and treat as miss
                let _ = conn.del::<_, ()>(&key).await;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        let key = self.namespaced(key);
        let ttl_secs = ttl.as_secs().max(1);
        let mut conn = self.redis.clone();

        let mut pipe = Pipeline::new();
        pipe.atomic()
            .cmd("HSET")
            .arg(&key)
            .arg(CONTENT_TYPE_FIELD)
            .arg(page.content_type.as_bytes())
            .arg(BODY_FIELD)
            .arg(page.body.as_slice())
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ttl_secs)
            .ignore();
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(key = %key, ttl_secs, "Page cache set");
        Ok(())
    }

    async fn clear(&self) -> CacheResult<usize> {
        let pattern = self.clear_pattern();
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            // SCAN instead of KEYS to avoid blocking the server
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key).ignore();
                }
                pipe.query_async::<_, ()>(&mut conn).await?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = total_deleted, "Page cache cleared");
        Ok(total_deleted)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.redis.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::InvalidData(format!(
                "unexpected PING response: {}",
                pong
            )))
        }
    }
}
