/// Persistence for users, groups, posts, comments and follows
///
/// Handlers and services only see the `BlogStore` trait. `PgBlogStore` is
/// the production backend; `MemoryBlogStore` keeps everything in process and
/// backs the `memory://` database URL and the test suite.
pub mod memory_store;
pub mod pg_store;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{DatabaseConfig, MEMORY_DATABASE_URL};
use crate::error::Result;
use crate::models::{
    Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostView, User,
};

pub use memory_store::MemoryBlogStore;
pub use pg_store::{init_pool, PgBlogStore, MIGRATOR};

/// Which posts a feed shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts by authors the given user follows
    FollowedBy(Uuid),
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Insert a user or refresh the username of a known id
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_group(&self, group: NewGroup) -> Result<Group>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>>;
    async fn find_post_view(&self, id: i64) -> Result<Option<PostView>>;
    /// Apply an edit; `None` when the post does not exist
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;
    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;
    /// Newest first
    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64)
        -> Result<Vec<PostView>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;

    /// Returns true if a new edge was created
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    /// Returns true if an edge was removed
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

/// Open the store selected by the database URL
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn BlogStore>> {
    if config.url == MEMORY_DATABASE_URL {
        tracing::warn!("using in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryBlogStore::new()));
    }

    let pool = init_pool(config).await?;
    Ok(Arc::new(PgBlogStore::new(pool)))
}
