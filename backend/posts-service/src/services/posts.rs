use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::db::{BlogStore, PostFilter};
use crate::error::{AppError, Result};
use crate::forms::{CleanedComment, CleanedPost};
use crate::media::MediaStorage;
use crate::metrics::record_write;
use crate::models::{Comment, ImageChange, NewComment, NewPost, Post, PostChanges, PostView};

/// Post and comment writes
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn BlogStore>,
    media: Arc<dyn MediaStorage>,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>, media: Arc<dyn MediaStorage>) -> Self {
        Self { store, media }
    }

    /// Persist a new post authored by `user`
    pub async fn create_post(&self, user: &CurrentUser, cleaned: CleanedPost) -> Result<Post> {
        self.store.upsert_user(user.id, &user.username).await?;

        let image = match &cleaned.image {
            Some(file) => Some(self.media.save(file).await?),
            None => None,
        };

        let post = self
            .store
            .create_post(NewPost {
                author_id: user.id,
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            })
            .await?;

        record_write("post");
        tracing::info!(post_id = post.id, author = %user.username, "post created");
        Ok(post)
    }

    /// Apply an edit to `post`. Callers check authorship first.
    pub async fn update_post(&self, post: &Post, cleaned: CleanedPost) -> Result<Post> {
        let image = match &cleaned.image {
            Some(file) => ImageChange::Replace(self.media.save(file).await?),
            None if cleaned.clear_image => ImageChange::Clear,
            None => ImageChange::Keep,
        };

        let updated = self
            .store
            .update_post(
                post.id,
                PostChanges {
                    text: cleaned.text,
                    group_id: cleaned.group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))?;

        record_write("post_edit");
        tracing::info!(post_id = post.id, "post updated");
        Ok(updated)
    }

    pub async fn add_comment(
        &self,
        user: &CurrentUser,
        post_id: i64,
        cleaned: CleanedComment,
    ) -> Result<Comment> {
        self.store.upsert_user(user.id, &user.username).await?;

        let comment = self
            .store
            .create_comment(NewComment {
                post_id,
                author_id: user.id,
                text: cleaned.text,
            })
            .await?;

        record_write("comment");
        tracing::info!(post_id, comment_id = comment.id, "comment added");
        Ok(comment)
    }

    /// Post by id or `NotFound`
    pub async fn get_post(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    pub async fn get_post_view(&self, post_id: i64) -> Result<PostView> {
        self.store
            .find_post_view(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    pub async fn author_posts_count(&self, author_id: uuid::Uuid) -> Result<i64> {
        self.store.count_posts(PostFilter::Author(author_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBlogStore;
    use crate::forms::UploadedFile;
    use crate::media::FsMediaStorage;
    use uuid::Uuid;

    fn service(media_root: &std::path::Path) -> (PostService, Arc<MemoryBlogStore>) {
        let store = Arc::new(MemoryBlogStore::new());
        let media = Arc::new(FsMediaStorage::new(media_root, "/media/", 1024));
        (PostService::new(store.clone(), media), store)
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "auth".into(),
        }
    }

    fn cleaned(text: &str, image: Option<UploadedFile>) -> CleanedPost {
        CleanedPost {
            text: text.into(),
            group_id: None,
            image,
            clear_image: false,
        }
    }

    #[tokio::test]
    async fn test_create_post_mirrors_author() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());
        let user = user();

        let post = service.create_post(&user, cleaned("Текст", None)).await.unwrap();

        assert_eq!(post.author_id, user.id);
        assert!(store.find_user_by_username("auth").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_image_is_stored_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        let file = UploadedFile {
            filename: "small.gif".into(),
            content_type: Some("image/gif".into()),
            data: crate::forms::SMALL_GIF.to_vec(),
        };

        let post = service
            .create_post(&user(), cleaned("Текст", Some(file.clone())))
            .await
            .unwrap();
        let first_key = post.image.clone().unwrap();
        assert!(first_key.starts_with("posts/"));

        let kept = service.update_post(&post, cleaned("Новый", None)).await.unwrap();
        assert_eq!(kept.image.as_deref(), Some(first_key.as_str()));

        let replaced = service
            .update_post(&kept, cleaned("Новый", Some(file)))
            .await
            .unwrap();
        assert_ne!(replaced.image.as_deref(), Some(first_key.as_str()));

        let mut clear = cleaned("Без картинки", None);
        clear.clear_image = true;
        let cleared = service.update_post(&replaced, clear).await.unwrap();
        assert!(cleared.image.is_none());
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());

        assert!(matches!(
            service.get_post(404).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
