//! Shared fixtures for posts-service integration tests
#![allow(dead_code)]

use actix_web::http::header;
use page_cache::MemoryPageCache;
use posts_service::auth::JwtKeys;
use posts_service::db::{BlogStore, MemoryBlogStore};
use posts_service::media::FsMediaStorage;
use posts_service::models::{Group, NewGroup, NewPost, Post, User};
use posts_service::AppState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &str = "posts-service-test-secret";
pub const LOGIN_URL: &str = "/auth/login/";
pub const MULTIPART_BOUNDARY: &str = "yatube-test-boundary";

/// 2x1 GIF
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

/// Build the service under test around a `TestContext`
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .wrap(posts_service::middleware::JwtAuthMiddleware::new(
                    $ctx.state.jwt.clone(),
                ))
                .configure(posts_service::handlers::configure),
        )
        .await
    };
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryBlogStore>,
    pub page_cache: Arc<MemoryPageCache>,
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryBlogStore::new());
        let page_cache = Arc::new(MemoryPageCache::new());
        let media_dir = tempfile::tempdir().expect("create media dir");
        let media = Arc::new(FsMediaStorage::new(media_dir.path(), "/media/", 1024 * 1024));

        let state = AppState {
            store: store.clone(),
            page_cache: page_cache.clone(),
            media,
            jwt: Arc::new(JwtKeys::from_secret(TEST_SECRET, 3600)),
            page_ttl: Duration::from_secs(20),
            login_url: LOGIN_URL.to_string(),
            max_upload_bytes: 1024 * 1024,
        };

        Self {
            state,
            store,
            page_cache,
            media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store
            .upsert_user(Uuid::new_v4(), username)
            .await
            .expect("create user")
    }

    pub async fn group(&self, slug: &str, title: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: "Тестовое описание".to_string(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    /// `Authorization` header for `user`
    pub fn auth(&self, user: &User) -> (header::HeaderName, String) {
        let token = self
            .state
            .jwt
            .issue(user.id, &user.username)
            .expect("issue token");
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    pub async fn post_count(&self) -> i64 {
        self.store
            .count_posts(posts_service::db::PostFilter::All)
            .await
            .expect("count posts")
    }
}

/// Encode text fields and an optional `(field, filename, bytes)` file part
/// as `multipart/form-data`. Returns the content type and the body.
pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((name, filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/gif\r\n\r\n",
                MULTIPART_BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    (
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        body,
    )
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
