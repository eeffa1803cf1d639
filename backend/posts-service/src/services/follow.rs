use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::db::BlogStore;
use crate::error::Result;
use crate::metrics::record_write;
use crate::models::User;

/// Follow edges between readers and authors
#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn BlogStore>,
}

impl FollowService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Idempotent follow; returns true if a new edge was created.
    /// Following yourself is a no-op.
    pub async fn follow(&self, user: &CurrentUser, author: &User) -> Result<bool> {
        if user.id == author.id {
            tracing::debug!(user = %user.username, "ignoring self-follow");
            return Ok(false);
        }

        self.store.upsert_user(user.id, &user.username).await?;
        let created = self.store.create_follow(user.id, author.id).await?;
        if created {
            record_write("follow");
            tracing::info!(user = %user.username, author = %author.username, "follow created");
        }
        Ok(created)
    }

    /// Idempotent unfollow; returns true if an edge was removed.
    pub async fn unfollow(&self, user: &CurrentUser, author: &User) -> Result<bool> {
        let removed = self.store.delete_follow(user.id, author.id).await?;
        if removed {
            record_write("unfollow");
            tracing::info!(user = %user.username, author = %author.username, "follow removed");
        }
        Ok(removed)
    }

    /// Whether `viewer` follows `author`; anonymous viewers follow nobody
    pub async fn is_following(&self, viewer: Option<&CurrentUser>, author: &User) -> Result<bool> {
        match viewer {
            Some(viewer) => self.store.is_following(viewer.id, author.id).await,
            None => Ok(false),
        }
    }
}
