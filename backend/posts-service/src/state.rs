use page_cache::{MemoryPageCache, PageCache, RedisPageCache};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db::{self, BlogStore};
use crate::error::Result;
use crate::media::{FsMediaStorage, MediaStorage};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub page_cache: Arc<dyn PageCache>,
    pub media: Arc<dyn MediaStorage>,
    pub jwt: Arc<JwtKeys>,
    /// Lifetime of a cached index page
    pub page_ttl: Duration,
    pub login_url: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Connect every backend named by the configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = db::connect(&config.database).await?;

        let page_cache: Arc<dyn PageCache> = match &config.cache.redis_url {
            Some(url) => {
                let cache = RedisPageCache::connect(url, &config.cache.namespace).await?;
                tracing::info!(namespace = %config.cache.namespace, "page cache backed by Redis");
                Arc::new(cache)
            }
            None => {
                tracing::info!(max_entries = config.cache.max_entries, "page cache kept in process");
                Arc::new(MemoryPageCache::with_max_entries(config.cache.max_entries))
            }
        };

        let media = Arc::new(FsMediaStorage::new(
            &config.media.root,
            config.media.url_prefix.clone(),
            config.media.max_upload_bytes,
        ));

        Ok(Self {
            store,
            page_cache,
            media,
            jwt: Arc::new(JwtKeys::from_secret(
                &config.auth.jwt_secret,
                config.auth.token_ttl_secs,
            )),
            page_ttl: config.cache.page_ttl(),
            login_url: config.auth.login_url.clone(),
            max_upload_bytes: config.media.max_upload_bytes,
        })
    }
}
