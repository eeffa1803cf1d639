use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BlogStore, PostFilter};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost, Post, PostChanges,
    PostView, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
    last_follow_id: i64,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn group(&self, id: i64) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn is_following(&self, user_id: Uuid, author_id: Uuid) -> bool {
        self.follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
    }

    fn matches(&self, filter: PostFilter, post: &Post) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.is_following(user_id, post.author_id),
        }
    }

    fn post_view(&self, post: &Post) -> Option<PostView> {
        let author = self.user(post.author_id)?;
        let group = post.group_id.and_then(|id| self.group(id));

        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: author.id,
            author_username: author.username.clone(),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        })
    }

    fn require_user(&self, id: Uuid) -> Result<()> {
        match self.user(id) {
            Some(_) => Ok(()),
            None => Err(AppError::DatabaseError(format!("unknown user {}", id))),
        }
    }
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

/// In-process store for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryBlogStore {
    tables: RwLock<Tables>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.username == username && u.id != id)
        {
            return Err(AppError::Conflict(format!(
                "username '{}' is taken",
                username
            )));
        }

        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.username = username.to_string();
            return Ok(user.clone());
        }

        let user = User {
            id,
            username: username.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        group.check()?;
        let mut tables = self.tables.write().await;

        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is taken",
                group.slug
            )));
        }

        let group = Group {
            id: next_id(&mut tables.last_group_id),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.require_user(post.author_id)?;
        if let Some(group_id) = post.group_id {
            if tables.group(group_id).is_none() {
                return Err(AppError::DatabaseError(format!(
                    "unknown group {}",
                    group_id
                )));
            }
        }

        let post = Post {
            id: next_id(&mut tables.last_post_id),
            author_id: post.author_id,
            text: post.text,
            group_id: post.group_id,
            image: post.image,
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_post_view(&self, id: i64) -> Result<Option<PostView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| tables.post_view(p)))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;

        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.image = changes.resolve_image(post.image.take());
        post.text = changes.text;
        post.group_id = changes.group_id;

        Ok(Some(post.clone()))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .iter()
            .filter(|p| tables.matches(filter, p))
            .count();
        Ok(count as i64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| tables.matches(filter, p))
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|p| tables.post_view(p))
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        tables.require_user(comment.author_id)?;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::NotFound(format!("post {}", comment.post_id)));
        }

        let comment = Comment {
            id: next_id(&mut tables.last_comment_id),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let tables = self.tables.read().await;

        let mut comments: Vec<CommentView> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.user(c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    post_id: c.post_id,
                    text: c.text.clone(),
                    created_at: c.created_at,
                    author_id: author.id,
                    author_username: author.username.clone(),
                })
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(comments)
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;
        tables.require_user(author_id)?;

        if user_id == author_id || tables.is_following(user_id, author_id) {
            return Ok(false);
        }

        let follow = Follow {
            id: next_id(&mut tables.last_follow_id),
            user_id,
            author_id,
            created_at: Utc::now(),
        };
        tables.follows.push(follow);
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.is_following(user_id, author_id))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageChange;

    async fn store_with_author() -> (MemoryBlogStore, User) {
        let store = MemoryBlogStore::new();
        let author = store.upsert_user(Uuid::new_v4(), "auth").await.unwrap();
        (store, author)
    }

    fn new_post(author: &User, text: &str, group_id: Option<i64>) -> NewPost {
        NewPost {
            author_id: author.id,
            text: text.to_string(),
            group_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_user_refreshes_username() {
        let store = MemoryBlogStore::new();
        let id = Uuid::new_v4();

        store.upsert_user(id, "old").await.unwrap();
        let user = store.upsert_user(id, "new").await.unwrap();

        assert_eq!(user.username, "new");
        assert!(store.find_user_by_username("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, _) = store_with_author().await;
        let err = store.upsert_user(Uuid::new_v4(), "auth").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = MemoryBlogStore::new();
        let group = || NewGroup {
            title: "Группа".into(),
            slug: "slug".into(),
            description: String::new(),
        };

        store.create_group(group()).await.unwrap();
        assert!(matches!(
            store.create_group(group()).await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_overlong_group_title_is_rejected() {
        let store = MemoryBlogStore::new();
        let err = store
            .create_group(NewGroup {
                title: "т".repeat(crate::models::GROUP_TITLE_MAX_CHARS + 1),
                slug: "long".into(),
                description: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.list_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_posts_are_newest_first() {
        let (store, author) = store_with_author().await;
        for text in ["first", "second", "third"] {
            store.create_post(new_post(&author, text, None)).await.unwrap();
        }

        let posts = store.list_posts(PostFilter::All, 10, 0).await.unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["third", "second", "first"]);

        let second_page = store.list_posts(PostFilter::All, 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].text, "first");
    }

    #[tokio::test]
    async fn test_group_filter() {
        let (store, author) = store_with_author().await;
        let group = store
            .create_group(NewGroup {
                title: "A".into(),
                slug: "a".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        store
            .create_post(new_post(&author, "in group", Some(group.id)))
            .await
            .unwrap();
        store.create_post(new_post(&author, "no group", None)).await.unwrap();

        assert_eq!(store.count_posts(PostFilter::Group(group.id)).await.unwrap(), 1);
        let posts = store
            .list_posts(PostFilter::Group(group.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(posts[0].group_slug.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_update_post_keeps_image_unless_changed() {
        let (store, author) = store_with_author().await;
        let mut post = new_post(&author, "text", None);
        post.image = Some("posts/a.gif".into());
        let post = store.create_post(post).await.unwrap();

        let updated = store
            .update_post(
                post.id,
                PostChanges {
                    text: "edited".into(),
                    group_id: None,
                    image: ImageChange::Keep,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.image.as_deref(), Some("posts/a.gif"));

        let missing = store
            .update_post(
                999,
                PostChanges {
                    text: "x".into(),
                    group_id: None,
                    image: ImageChange::Clear,
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_follow_edges() {
        let (store, author) = store_with_author().await;
        let reader = store.upsert_user(Uuid::new_v4(), "reader").await.unwrap();

        assert!(store.create_follow(reader.id, author.id).await.unwrap());
        assert!(!store.create_follow(reader.id, author.id).await.unwrap());
        assert!(!store.create_follow(author.id, author.id).await.unwrap());
        assert!(store.is_following(reader.id, author.id).await.unwrap());

        store.create_post(new_post(&author, "followed", None)).await.unwrap();
        assert_eq!(
            store.count_posts(PostFilter::FollowedBy(reader.id)).await.unwrap(),
            1
        );

        assert!(store.delete_follow(reader.id, author.id).await.unwrap());
        assert!(!store.delete_follow(reader.id, author.id).await.unwrap());
        assert_eq!(
            store.count_posts(PostFilter::FollowedBy(reader.id)).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_comments_are_oldest_first() {
        let (store, author) = store_with_author().await;
        let post = store.create_post(new_post(&author, "text", None)).await.unwrap();

        for text in ["one", "two"] {
            store
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: author.id,
                    text: text.into(),
                })
                .await
                .unwrap();
        }

        let comments = store.list_comments(post.id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
        assert_eq!(comments[0].author_username, "auth");
    }
}
