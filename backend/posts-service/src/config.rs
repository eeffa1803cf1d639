/// Configuration management for Posts Service
///
/// Everything is read from environment variables. A `.env` file is loaded by
/// the binary before `Config::from_env` runs.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Development-only signing secret, rejected in production
pub const DEV_JWT_SECRET: &str = "yatube-dev-secret";

/// Database URL selecting the in-process store
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Page cache configuration
    pub cache: CacheConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// HTTP worker threads
    pub workers: usize,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL, or `memory://` for the in-process store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    /// Key namespace inside Redis
    pub namespace: String,
    /// Lifetime of a cached index page
    pub page_ttl_secs: u64,
    /// Entry limit of the in-process cache
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to
    pub root: PathBuf,
    /// Public URL prefix the files are served under
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
    /// Where anonymous users are sent for protected pages
    pub login_url: String,
    /// Lifetime of tokens minted by `issue-token`
    pub token_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("POSTS_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("POSTS_SERVICE_PORT", 8000)?,
                workers: parse_env_or_default("POSTS_SERVICE_WORKERS", 4)?,
            },
            database: {
                let url = std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| MEMORY_DATABASE_URL.to_string());
                if production && url == MEMORY_DATABASE_URL {
                    return Err("DATABASE_URL must point at Postgres in production".to_string());
                }

                DatabaseConfig {
                    url,
                    max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                    min_connections: parse_env_or_default("DATABASE_MIN_CONNECTIONS", 1)?,
                }
            },
            cache: CacheConfig {
                redis_url: std::env::var("REDIS_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                namespace: std::env::var("PAGE_CACHE_NAMESPACE")
                    .unwrap_or_else(|_| "yatube".to_string()),
                page_ttl_secs: parse_env_or_default(
                    "PAGE_CACHE_TTL_SECS",
                    page_cache::DEFAULT_PAGE_TTL_SECS,
                )?,
                max_entries: parse_env_or_default(
                    "PAGE_CACHE_MAX_ENTRIES",
                    page_cache::DEFAULT_MAX_ENTRIES,
                )?,
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("media")),
                url_prefix: std::env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
                max_upload_bytes: parse_env_or_default("MEDIA_MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(value) if !value.trim().is_empty() => value,
                    _ if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => DEV_JWT_SECRET.to_string(),
                };
                if production && jwt_secret == DEV_JWT_SECRET {
                    return Err("JWT_SECRET cannot be the development secret in production".to_string());
                }

                AuthConfig {
                    jwt_secret,
                    login_url: std::env::var("LOGIN_URL")
                        .unwrap_or_else(|_| "/auth/login/".to_string()),
                    token_ttl_secs: parse_env_or_default("JWT_TOKEN_TTL_SECS", 24 * 60 * 60)?,
                }
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl CacheConfig {
    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_secs)
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
